//! Report configuration: which dashboards each team publishes.
//!
//! The configuration file is YAML shared with the upstream download step:
//!
//! ```yaml
//! teams:
//!   Practices Team:
//!     team_dashboards:
//!       Developer Practices Dashboard:
//!         filename: dprod_report.pdf
//!         url: https://example.invalid/dashboards/42
//! settings:
//!   scale: 2.0
//! ```
//!
//! Only `filename` matters here; `url` and `filter` are carried through for
//! the download step. Unknown top-level sections are ignored. Declaration
//! order of teams and dashboards is kept all the way to the output.

use crate::config::{ExtractionConfigBuilder, FailurePolicy};
use crate::error::StitchError;
use config::{Config, Environment, File, FileFormat};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment prefix for overrides, e.g. `DASHSTITCH__SETTINGS__SCALE=2`.
pub const ENV_PREFIX: &str = "DASHSTITCH";

/// Per-dashboard options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardOptions {
    /// Name of the exported PDF inside the source directory.
    #[serde(default, alias = "Filename")]
    pub filename: Option<String>,
    /// Dashboard location in the analytics product.
    #[serde(default)]
    pub url: Option<String>,
    /// Dashboard filters applied before export.
    #[serde(default)]
    pub filter: Option<IndexMap<String, Vec<String>>>,
}

impl DashboardOptions {
    pub fn with_filename(filename: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            ..Self::default()
        }
    }
}

/// One team's entry under `teams`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub team_dashboards: IndexMap<String, DashboardOptions>,
}

/// Team name → dashboards, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamDashboardMap(pub IndexMap<String, Team>);

impl TeamDashboardMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a dashboard, creating the team on first use.
    pub fn insert(
        &mut self,
        team: impl Into<String>,
        dashboard: impl Into<String>,
        options: DashboardOptions,
    ) -> &mut Self {
        self.0
            .entry(team.into())
            .or_default()
            .team_dashboards
            .insert(dashboard.into(), options);
        self
    }

    pub fn teams(&self) -> impl Iterator<Item = (&str, &Team)> {
        self.0.iter().map(|(name, team)| (name.as_str(), team))
    }

    /// Every `(team, dashboard, options)` triple in declaration order.
    pub fn dashboards(&self) -> impl Iterator<Item = (&str, &str, &DashboardOptions)> {
        self.teams().flat_map(|(team, entry)| {
            entry
                .team_dashboards
                .iter()
                .map(move |(dashboard, opts)| (team, dashboard.as_str(), opts))
        })
    }

    pub fn dashboard_count(&self) -> usize {
        self.0.values().map(|t| t.team_dashboards.len()).sum()
    }

    /// Resolve a dashboard's source PDF under `source_dir`.
    ///
    /// # Errors
    /// [`StitchError::Configuration`] if the dashboard has no usable filename.
    pub fn source_path(
        source_dir: &Path,
        team: &str,
        dashboard: &str,
        options: &DashboardOptions,
    ) -> Result<PathBuf, StitchError> {
        match options.filename.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(source_dir.join(name)),
            _ => Err(StitchError::Configuration(format!(
                "dashboard '{dashboard}' of team '{team}' has no filename"
            ))),
        }
    }

    /// Check every dashboard names a source file.
    ///
    /// Run before extraction so a typo fails the run before any PDF is
    /// rendered.
    pub fn validate(&self) -> Result<(), StitchError> {
        if self.0.is_empty() {
            return Err(StitchError::Configuration("no teams configured".into()));
        }
        for (team, entry) in self.teams() {
            if entry.team_dashboards.is_empty() {
                return Err(StitchError::Configuration(format!(
                    "team '{team}' has no team_dashboards"
                )));
            }
        }
        for (team, dashboard, options) in self.dashboards() {
            Self::source_path(Path::new(""), team, dashboard, options)?;
        }
        Ok(())
    }
}

/// Optional overrides of the extraction settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub scale: Option<f32>,
    pub report_header_height: Option<u32>,
    pub page_header_height: Option<u32>,
    pub footer_height: Option<u32>,
    pub failure_policy: Option<FailurePolicy>,
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Settings {
    /// Layer these settings over `builder`, leaving unset keys untouched.
    pub fn apply(&self, mut builder: ExtractionConfigBuilder) -> ExtractionConfigBuilder {
        if let Some(scale) = self.scale {
            builder = builder.scale(scale);
        }
        if let Some(rows) = self.report_header_height {
            builder = builder.report_header_height(rows);
        }
        if let Some(rows) = self.page_header_height {
            builder = builder.page_header_height(rows);
        }
        if let Some(rows) = self.footer_height {
            builder = builder.footer_height(rows);
        }
        if let Some(policy) = self.failure_policy {
            builder = builder.failure_policy(policy);
        }
        if let Some(ref path) = self.pdfium_lib_path {
            builder = builder.pdfium_lib_path(path.clone());
        }
        builder
    }
}

/// The parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfiguration {
    #[serde(default)]
    pub teams: TeamDashboardMap,
    #[serde(default)]
    pub settings: Settings,
}

impl ReportConfiguration {
    /// Load and validate a YAML configuration file.
    ///
    /// `DASHSTITCH__SETTINGS__<KEY>` environment variables override the
    /// file's `settings` section.
    pub fn load(path: &Path) -> Result<Self, StitchError> {
        if !path.is_file() {
            return Err(StitchError::Configuration(format!(
                "configuration file '{}' does not exist",
                path.display()
            )));
        }
        let builder = Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml).required(true))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );
        let parsed = Self::deserialize_from(builder)?;
        debug!(
            "Loaded {} dashboards for {} teams from {}",
            parsed.teams.dashboard_count(),
            parsed.teams.0.len(),
            path.display()
        );
        Ok(parsed)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, StitchError> {
        Self::deserialize_from(
            Config::builder().add_source(File::from_str(yaml, FileFormat::Yaml)),
        )
    }

    fn deserialize_from(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, StitchError> {
        let parsed: Self = builder
            .build()
            .map_err(|e| StitchError::Configuration(format!("Failed to read configuration: {e}")))?
            .try_deserialize()
            .map_err(|e| StitchError::Configuration(format!("Malformed configuration: {e}")))?;
        parsed.teams.validate()?;
        Ok(parsed)
    }
}
