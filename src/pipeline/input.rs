//! Source resolution: map a configured filename to a readable PDF on disk.
//!
//! The download step is expected to leave one fully written PDF per
//! dashboard in the source directory. We check existence and the `%PDF`
//! magic bytes up front so a missing or truncated download surfaces as a
//! precise error instead of an opaque pdfium failure.

use crate::error::StitchError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Check that `path` exists, is readable and starts with `%PDF`.
pub fn resolve_source(path: &Path) -> Result<PathBuf, StitchError> {
    if !path.is_file() {
        return Err(StitchError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StitchError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(StitchError::CorruptPdf {
                path: path.to_path_buf(),
                detail: format!("cannot be read: {e}"),
            });
        }
    };

    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
        return Err(StitchError::CorruptPdf {
            path: path.to_path_buf(),
            detail: format!("not a PDF (first bytes: {magic:?})"),
        });
    }

    debug!("Resolved source PDF: {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_source(&dir.path().join("absent.pdf")).unwrap_err();
        assert!(matches!(err, StitchError::NotFound { .. }));
    }

    #[test]
    fn directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_source(dir.path()),
            Err(StitchError::NotFound { .. })
        ));
    }

    #[test]
    fn non_pdf_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"<html>login expired</html>").unwrap();
        assert!(matches!(
            resolve_source(&path),
            Err(StitchError::CorruptPdf { .. })
        ));
    }

    #[test]
    fn truncated_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%P").unwrap();
        assert!(resolve_source(&path).is_err());
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.7\n").unwrap();
        assert_eq!(resolve_source(&path).unwrap(), path);
    }
}
