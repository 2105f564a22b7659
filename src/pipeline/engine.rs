//! Binding to the pdfium shared library.
//!
//! Resolution order, first match wins:
//!
//! 1. the explicit path from [`crate::config::ExtractionConfig::pdfium_lib_path`]
//!    (a file, or a directory holding the platform library);
//! 2. `PDFIUM_LIB_PATH`, with the same rules;
//! 3. the platform library next to the executable's working directory;
//! 4. the system library search path.

use crate::error::StitchError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an existing pdfium library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to pdfium following the resolution order above.
pub fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, StitchError> {
    if let Some(path) = explicit {
        return bind_pdfium_from_path(path);
    }

    if let Some(env_path) = std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from) {
        if env_path.exists() {
            return bind_pdfium_from_path(&env_path);
        }
        warn!(
            "{PDFIUM_LIB_PATH_ENV} '{}' not found; falling back to the system library",
            env_path.display()
        );
    }

    let local = Pdfium::pdfium_platform_library_name_at_path("./");
    Pdfium::bind_to_library(&local)
        .or_else(|local_err| {
            debug!("No pdfium in working directory ({local_err}); trying system library");
            Pdfium::bind_to_system_library()
        })
        .map(Pdfium::new)
        .map_err(|e| StitchError::PdfiumBindingFailed(e.to_string()))
}

/// Bind to a pdfium library at an explicit file or directory path.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, StitchError> {
    let lib = resolve_library_file(path);
    debug!("Binding pdfium from {}", lib.display());
    Pdfium::bind_to_library(&lib)
        .map(Pdfium::new)
        .map_err(|e| StitchError::PdfiumBindingFailed(format!("'{}': {e}", lib.display())))
}

/// A directory resolves to the platform library name inside it.
fn resolve_library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}
