//! Extraction entry points: every configured dashboard PDF → one PNG each.
//!
//! Dashboards are processed strictly one after another in declaration
//! order. Each document's page buffers are dropped before the next PDF is
//! opened, so peak memory is bounded by the largest single dashboard.

use crate::config::{ExtractionConfig, FailurePolicy, PageGeometry};
use crate::error::StitchError;
use crate::output::{DashboardFailure, ExtractionResult};
use crate::pipeline::render::{PageRenderer, PdfiumRenderer};
use crate::pipeline::{encode, input, stitch};
use crate::progress::{ExtractionProgressCallback, NoopProgressCallback};
use crate::report::TeamDashboardMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Stitch every dashboard in `map` using `renderer`.
///
/// The map is validated before any PDF is opened. Under
/// [`FailurePolicy::Abort`] the first failing dashboard ends the run with its
/// error; under [`FailurePolicy::Continue`] it is recorded in
/// [`ExtractionResult::failures`] and the next dashboard is attempted.
///
/// # Errors
/// - [`StitchError::Configuration`] for a dashboard without a filename
/// - any per-dashboard error under [`FailurePolicy::Abort`]
pub fn get_pdf_objects(
    map: &TeamDashboardMap,
    source_dir: &Path,
    renderer: &dyn PageRenderer,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, StitchError> {
    let total_start = Instant::now();
    map.validate()?;

    let geometry = config.geometry();
    let total = map.dashboard_count();
    let noop = NoopProgressCallback;
    let progress: &dyn ExtractionProgressCallback = match config.progress_callback.as_deref() {
        Some(cb) => cb,
        None => &noop,
    };

    info!(
        "Extracting {} dashboards from {} (scale {}, {:?})",
        total,
        source_dir.display(),
        config.scale,
        geometry
    );
    progress.on_extraction_start(total);

    let mut result = ExtractionResult::default();
    for (team, dashboard, options) in map.dashboards() {
        progress.on_dashboard_start(team, dashboard);

        let outcome = TeamDashboardMap::source_path(source_dir, team, dashboard, options)
            .and_then(|path| stitch_dashboard(&path, renderer, &geometry));

        match outcome {
            Ok(png) => {
                info!("Stitched '{}' / '{}': {} bytes", team, dashboard, png.len());
                progress.on_dashboard_complete(team, dashboard, png.len());
                result.insert(team, dashboard, png);
            }
            Err(e) => {
                progress.on_dashboard_error(team, dashboard, &e.to_string());
                match config.failure_policy {
                    FailurePolicy::Abort => {
                        error!("Dashboard '{}' of team '{}' failed: {}", dashboard, team, e);
                        return Err(e);
                    }
                    FailurePolicy::Continue => {
                        warn!("Skipping dashboard '{}' of team '{}': {}", dashboard, team, e);
                        result.record_failure(DashboardFailure {
                            team: team.to_string(),
                            dashboard: dashboard.to_string(),
                            error: e,
                        });
                    }
                }
            }
        }
    }

    progress.on_extraction_complete(total, result.len());
    info!(
        "Extraction complete: {}/{} dashboards in {}ms",
        result.len(),
        total,
        total_start.elapsed().as_millis()
    );
    Ok(result)
}

/// Render, stitch and encode one dashboard PDF.
pub fn stitch_dashboard(
    path: &Path,
    renderer: &dyn PageRenderer,
    geometry: &PageGeometry,
) -> Result<Vec<u8>, StitchError> {
    let path = input::resolve_source(path)?;
    let document = renderer.render_document(&path)?;
    debug!(
        "{}: {} pages rendered",
        document.path().display(),
        document.page_count()
    );

    let stitched = stitch::stitch(document.pages(), geometry)?;
    drop(document);

    encode::encode_png(stitched)
}

/// Bind pdfium and extract every dashboard on tokio's blocking pool.
///
/// pdfium is synchronous and not safe to share across async tasks, so the
/// whole run, including library binding, happens inside one
/// `spawn_blocking` closure.
pub async fn extract_dashboards(
    map: &TeamDashboardMap,
    source_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, StitchError> {
    let map = map.clone();
    let source_dir: PathBuf = source_dir.as_ref().to_path_buf();
    let config = config.clone();

    tokio::task::spawn_blocking(move || extract_dashboards_sync(&map, &source_dir, &config))
        .await
        .map_err(|e| StitchError::Internal(format!("extraction task failed: {e}")))?
}

/// Bind pdfium and extract every dashboard on the calling thread.
pub fn extract_dashboards_sync(
    map: &TeamDashboardMap,
    source_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionResult, StitchError> {
    // Fail on configuration before paying for the library binding.
    map.validate()?;
    let renderer = PdfiumRenderer::new(config)?;
    get_pdf_objects(map, source_dir.as_ref(), &renderer, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::buffer::PixelBuffer;
    use crate::pipeline::render::PageDocument;
    use crate::report::DashboardOptions;
    use std::sync::{Arc, Mutex};

    /// Reads `%PDF` files whose second line lists per-page content rows.
    /// `0` means a blank page.
    struct FakeRenderer {
        height: u32,
    }

    impl PageRenderer for FakeRenderer {
        fn render_document(&self, path: &Path) -> Result<PageDocument, StitchError> {
            let text = std::fs::read_to_string(path).unwrap();
            let layout = text.lines().nth(1).unwrap_or("");
            let pages = layout
                .split(',')
                .map(|n| n.trim().parse::<u32>().unwrap())
                .map(|content| {
                    let mut data = vec![0xFFu8; 4 * self.height as usize];
                    for y in 0..content as usize {
                        data[y * 4..y * 4 + 4].fill(0x20);
                    }
                    PixelBuffer::from_raw(4, self.height, 4, 1, false, data).unwrap()
                })
                .collect();
            Ok(PageDocument::new(path, pages))
        }
    }

    fn geometry_config(policy: FailurePolicy) -> ExtractionConfig {
        ExtractionConfig::builder()
            .report_header_height(4)
            .page_header_height(2)
            .footer_height(3)
            .failure_policy(policy)
            .build()
            .unwrap()
    }

    fn write_pdf(dir: &Path, name: &str, pages: &str) {
        std::fs::write(dir.join(name), format!("%PDF-fake\n{pages}\n")).unwrap();
    }

    fn decoded_height(png: &[u8]) -> u32 {
        image::load_from_memory(png).unwrap().height()
    }

    #[test]
    fn stitches_each_dashboard_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write_pdf(dir.path(), "a.pdf", "10,8");
        write_pdf(dir.path(), "b.pdf", "6");

        let mut map = TeamDashboardMap::new();
        map.insert("Team", "First", DashboardOptions::with_filename("a.pdf"))
            .insert("Team", "Second", DashboardOptions::with_filename("b.pdf"));

        let result = get_pdf_objects(
            &map,
            dir.path(),
            &FakeRenderer { height: 20 },
            &geometry_config(FailurePolicy::Abort),
        )
        .unwrap();

        let names: Vec<_> = result.images().map(|(_, d, _)| d).collect();
        assert_eq!(names, vec!["First", "Second"]);
        // (10 - 4) + (8 - 2)
        assert_eq!(decoded_height(&result["Team"]["First"]), 12);
        assert_eq!(decoded_height(&result["Team"]["Second"]), 2);
    }

    #[test]
    fn abort_policy_returns_first_error() {
        let dir = tempfile::tempdir().unwrap();
        write_pdf(dir.path(), "blank.pdf", "10,0");

        let mut map = TeamDashboardMap::new();
        map.insert("Team", "Blank", DashboardOptions::with_filename("blank.pdf"));

        let err = get_pdf_objects(
            &map,
            dir.path(),
            &FakeRenderer { height: 20 },
            &geometry_config(FailurePolicy::Abort),
        )
        .unwrap_err();
        assert!(matches!(err, StitchError::BlankPage { page: 2 }));
    }

    #[test]
    fn continue_policy_records_failures() {
        let dir = tempfile::tempdir().unwrap();
        write_pdf(dir.path(), "ok.pdf", "9");

        let mut map = TeamDashboardMap::new();
        map.insert("Team", "Missing", DashboardOptions::with_filename("gone.pdf"))
            .insert("Team", "Present", DashboardOptions::with_filename("ok.pdf"));

        let result = get_pdf_objects(
            &map,
            dir.path(),
            &FakeRenderer { height: 20 },
            &geometry_config(FailurePolicy::Continue),
        )
        .unwrap();

        assert_eq!(result.len(), 1);
        assert!(result.get("Team", "Present").is_some());
        assert_eq!(result.failures().len(), 1);
        assert_eq!(result.failures()[0].dashboard, "Missing");
        assert!(matches!(result.failures()[0].error, StitchError::NotFound { .. }));
    }

    #[test]
    fn missing_filename_fails_before_rendering() {
        struct PanicRenderer;
        impl PageRenderer for PanicRenderer {
            fn render_document(&self, _: &Path) -> Result<PageDocument, StitchError> {
                panic!("must not render");
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let mut map = TeamDashboardMap::new();
        map.insert("Team", "Good", DashboardOptions::with_filename("a.pdf"))
            .insert("Team", "Bad", DashboardOptions::default());

        let err = get_pdf_objects(
            &map,
            dir.path(),
            &PanicRenderer,
            &geometry_config(FailurePolicy::Continue),
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn progress_events_follow_processing() {
        #[derive(Default)]
        struct Recorder(Mutex<Vec<String>>);
        impl ExtractionProgressCallback for Recorder {
            fn on_extraction_start(&self, total: usize) {
                self.0.lock().unwrap().push(format!("start {total}"));
            }
            fn on_dashboard_start(&self, _: &str, dashboard: &str) {
                self.0.lock().unwrap().push(format!("begin {dashboard}"));
            }
            fn on_dashboard_complete(&self, _: &str, dashboard: &str, _: usize) {
                self.0.lock().unwrap().push(format!("done {dashboard}"));
            }
            fn on_dashboard_error(&self, _: &str, dashboard: &str, _: &str) {
                self.0.lock().unwrap().push(format!("error {dashboard}"));
            }
            fn on_extraction_complete(&self, total: usize, ok: usize) {
                self.0.lock().unwrap().push(format!("end {ok}/{total}"));
            }
        }

        let dir = tempfile::tempdir().unwrap();
        write_pdf(dir.path(), "a.pdf", "10");

        let mut map = TeamDashboardMap::new();
        map.insert("T", "A", DashboardOptions::with_filename("a.pdf"))
            .insert("T", "B", DashboardOptions::with_filename("b.pdf"));

        let recorder = Arc::new(Recorder::default());
        let mut config = geometry_config(FailurePolicy::Continue);
        config.progress_callback = Some(recorder.clone());

        get_pdf_objects(&map, dir.path(), &FakeRenderer { height: 20 }, &config).unwrap();

        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec!["start 2", "begin A", "done A", "begin B", "error B", "end 1/2"]
        );
    }

    #[test]
    fn same_input_gives_same_bytes() {
        let dir = tempfile::tempdir().unwrap();
        write_pdf(dir.path(), "a.pdf", "12,7,9");
        let mut map = TeamDashboardMap::new();
        map.insert("T", "A", DashboardOptions::with_filename("a.pdf"));
        let config = geometry_config(FailurePolicy::Abort);
        let renderer = FakeRenderer { height: 20 };

        let first = get_pdf_objects(&map, dir.path(), &renderer, &config).unwrap();
        let second = get_pdf_objects(&map, dir.path(), &renderer, &config).unwrap();
        assert_eq!(first["T"]["A"], second["T"]["A"]);
    }
}
