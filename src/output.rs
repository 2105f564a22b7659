//! Extraction results and the downstream writers that publish them.
//!
//! [`ExtractionResult`] is the only thing the orchestrator hands back: an
//! ordered team → dashboard → PNG mapping. The writers here turn it into
//! per-dashboard PNG files or a single HTML report with the images inlined.

use crate::error::StitchError;
use crate::pipeline::encode::png_data_uri;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::ops::Index;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Dashboard name → encoded PNG, in declaration order.
pub type DashboardImages = IndexMap<String, Vec<u8>>;

/// A dashboard skipped under [`crate::config::FailurePolicy::Continue`].
#[derive(Debug)]
pub struct DashboardFailure {
    pub team: String,
    pub dashboard: String,
    pub error: StitchError,
}

/// Stitched images for every successfully processed dashboard.
///
/// ```rust
/// # use dashboard_stitch::ExtractionResult;
/// let mut result = ExtractionResult::default();
/// result.insert("Mock Team", "Mock Team Dashboard", vec![0x89, b'P', b'N', b'G']);
/// assert_eq!(result["Mock Team"]["Mock Team Dashboard"].len(), 4);
/// ```
#[derive(Debug, Default)]
pub struct ExtractionResult {
    teams: IndexMap<String, DashboardImages>,
    failures: Vec<DashboardFailure>,
}

impl ExtractionResult {
    pub fn insert(&mut self, team: impl Into<String>, dashboard: impl Into<String>, png: Vec<u8>) {
        self.teams
            .entry(team.into())
            .or_default()
            .insert(dashboard.into(), png);
    }

    pub(crate) fn record_failure(&mut self, failure: DashboardFailure) {
        self.failures.push(failure);
    }

    pub fn get(&self, team: &str, dashboard: &str) -> Option<&[u8]> {
        self.teams
            .get(team)
            .and_then(|d| d.get(dashboard))
            .map(Vec::as_slice)
    }

    pub fn team(&self, team: &str) -> Option<&DashboardImages> {
        self.teams.get(team)
    }

    /// Teams in declaration order.
    pub fn teams(&self) -> impl Iterator<Item = (&str, &DashboardImages)> {
        self.teams.iter().map(|(t, d)| (t.as_str(), d))
    }

    /// Every `(team, dashboard, png)` in declaration order.
    pub fn images(&self) -> impl Iterator<Item = (&str, &str, &[u8])> {
        self.teams().flat_map(|(team, dashboards)| {
            dashboards
                .iter()
                .map(move |(d, png)| (team, d.as_str(), png.as_slice()))
        })
    }

    /// Number of stitched dashboards across all teams.
    pub fn len(&self) -> usize {
        self.teams.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn failures(&self) -> &[DashboardFailure] {
        &self.failures
    }

    /// A serialisable overview for logs or `--json` output.
    pub fn summary(&self) -> ExtractionSummary {
        ExtractionSummary {
            dashboards: self
                .images()
                .map(|(team, dashboard, png)| DashboardSummary {
                    team: team.to_string(),
                    dashboard: dashboard.to_string(),
                    png_bytes: png.len(),
                })
                .collect(),
            failures: self
                .failures
                .iter()
                .map(|f| FailureSummary {
                    team: f.team.clone(),
                    dashboard: f.dashboard.clone(),
                    error: f.error.to_string(),
                })
                .collect(),
        }
    }
}

impl Index<&str> for ExtractionResult {
    type Output = DashboardImages;

    /// # Panics
    /// If `team` has no stitched dashboards.
    fn index(&self, team: &str) -> &Self::Output {
        &self.teams[team]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSummary {
    pub dashboards: Vec<DashboardSummary>,
    pub failures: Vec<FailureSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub team: String,
    pub dashboard: String,
    pub png_bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureSummary {
    pub team: String,
    pub dashboard: String,
    pub error: String,
}

// ── Image files ──────────────────────────────────────────────────────────

/// Output filename for a dashboard: `<team>-<dashboard>.png`, lowercased,
/// spaces replaced by hyphens.
pub fn image_filename(team: &str, dashboard: &str) -> String {
    format!("{team}-{dashboard}.png").to_lowercase().replace(' ', "-")
}

/// Write every image to `output_dir`, creating it if needed.
///
/// Files are written to a temporary name and renamed so a crash never
/// leaves a truncated PNG behind. Returns the paths written, in order.
///
/// # Errors
/// [`StitchError::Configuration`] if two dashboards map to the same
/// filename. Nothing is written in that case.
pub fn write_images(
    result: &ExtractionResult,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, StitchError> {
    check_unique_filenames(result)?;

    std::fs::create_dir_all(output_dir).map_err(|e| StitchError::OutputWriteFailed {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    let mut written = Vec::with_capacity(result.len());
    for (team, dashboard, png) in result.images() {
        let path = output_dir.join(image_filename(team, dashboard));
        info!("storing dashboard '{}' at '{}'", dashboard, path.display());
        write_atomic(&path, png)?;
        written.push(path);
    }
    info!("stored {} images in {}", written.len(), output_dir.display());
    Ok(written)
}

fn check_unique_filenames(result: &ExtractionResult) -> Result<(), StitchError> {
    let mut seen: HashMap<String, (&str, &str)> = HashMap::with_capacity(result.len());
    for (team, dashboard, _) in result.images() {
        let name = image_filename(team, dashboard);
        if let Some((first_team, first_dashboard)) = seen.get(&name) {
            return Err(StitchError::Configuration(format!(
                "dashboards '{first_team}' / '{first_dashboard}' and '{team}' / '{dashboard}' \
                 would both be written to '{name}'"
            )));
        }
        seen.insert(name, (team, dashboard));
    }
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StitchError> {
    let to_err = |source| StitchError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    let tmp_path = path.with_extension("png.tmp");
    std::fs::write(&tmp_path, bytes).map_err(to_err)?;
    std::fs::rename(&tmp_path, path).map_err(to_err)
}

// ── HTML report ──────────────────────────────────────────────────────────

/// Render the result as one self-contained HTML document.
///
/// Each team becomes an `<h2>`, each dashboard an `<h3>` followed by its
/// stitched image as a data URI, so the document can be uploaded or mailed
/// without attachments.
pub fn render_html(result: &ExtractionResult, title: &str) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(title)));

    for (team, dashboards) in result.teams() {
        html.push_str(&format!("<h2>{}</h2>\n", escape_html(team)));
        for (dashboard, png) in dashboards {
            let name = escape_html(dashboard);
            html.push_str(&format!("<h3>{name}</h3>\n"));
            html.push_str(&format!(
                "<p><img alt=\"{name}\" src=\"{}\"></p>\n",
                png_data_uri(png)
            ));
        }
    }

    html.push_str("</body>\n</html>\n");
    debug!("Rendered HTML report: {} bytes", html.len());
    html
}

/// Render the HTML report and write it to `path`.
pub fn write_html(result: &ExtractionResult, title: &str, path: &Path) -> Result<(), StitchError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StitchError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, render_html(result, title)).map_err(|e| {
        StitchError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        }
    })?;
    info!("wrote HTML report to {}", path.display());
    Ok(())
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtractionResult {
        let mut r = ExtractionResult::default();
        r.insert("My Awesome Team", "Team Productivity Dashboard", vec![1, 2, 3]);
        r.insert("My Awesome Team", "Reviews", vec![4]);
        r.insert("R&D", "Delivery <beta>", vec![5, 6]);
        r
    }

    #[test]
    fn filenames_are_lowercase_hyphenated() {
        assert_eq!(
            image_filename("My Awesome Team", "Team Productivity Dashboard"),
            "my-awesome-team-team-productivity-dashboard.png"
        );
    }

    #[test]
    fn keeps_declaration_order() {
        let r = sample();
        let order: Vec<_> = r.images().map(|(t, d, _)| (t, d)).collect();
        assert_eq!(
            order,
            vec![
                ("My Awesome Team", "Team Productivity Dashboard"),
                ("My Awesome Team", "Reviews"),
                ("R&D", "Delivery <beta>"),
            ]
        );
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn index_and_get_agree() {
        let r = sample();
        assert_eq!(r["My Awesome Team"]["Reviews"], vec![4]);
        assert_eq!(r.get("My Awesome Team", "Reviews"), Some(&[4u8][..]));
        assert_eq!(r.get("Nobody", "Reviews"), None);
    }

    #[test]
    fn write_images_creates_one_file_per_dashboard() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");
        let written = write_images(&sample(), &out).unwrap();
        assert_eq!(written.len(), 3);
        let first = out.join("my-awesome-team-team-productivity-dashboard.png");
        assert_eq!(std::fs::read(first).unwrap(), vec![1, 2, 3]);
        // No temporary files are left behind.
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 3);
    }

    #[test]
    fn colliding_filenames_are_rejected_before_writing() {
        let mut r = ExtractionResult::default();
        r.insert("Team A", "Board", vec![1]);
        r.insert("Team", "A Board", vec![2]);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");
        let err = write_images(&r, &out).unwrap_err();

        assert!(err.is_configuration());
        let msg = err.to_string();
        assert!(msg.contains("team-a-board.png"), "got: {msg}");
        assert!(msg.contains("'Team A' / 'Board'"), "got: {msg}");
        assert!(msg.contains("'Team' / 'A Board'"), "got: {msg}");
        assert!(!out.exists());
    }

    #[test]
    fn html_embeds_images_and_escapes_names() {
        let html = render_html(&sample(), "Weekly Report");
        assert!(html.contains("<h1>Weekly Report</h1>"));
        assert!(html.contains("<h2>R&amp;D</h2>"));
        assert!(html.contains("<h3>Delivery &lt;beta&gt;</h3>"));
        assert_eq!(html.matches("data:image/png;base64,").count(), 3);
        let team = html.find("<h2>My Awesome Team</h2>").unwrap();
        let other = html.find("<h2>R&amp;D</h2>").unwrap();
        assert!(team < other);
    }

    #[test]
    fn write_html_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/report.html");
        write_html(&sample(), "Weekly Report", &path).unwrap();
        assert!(std::fs::read_to_string(path).unwrap().starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn summary_lists_sizes() {
        let s = sample().summary();
        assert_eq!(s.dashboards.len(), 3);
        assert_eq!(s.dashboards[0].png_bytes, 3);
        assert!(s.failures.is_empty());
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"png_bytes\":3"));
    }
}
