//! CLI binary for dashboard-stitch.
//!
//! A thin shim over the library crate that loads the report configuration,
//! layers CLI flags over its settings and publishes the stitched images.

use anyhow::{Context, Result};
use clap::Parser;
use dashboard_stitch::{
    extract_dashboards, render_html, write_html, write_images, ExtractionConfig,
    ExtractionProgressCallback, ExtractionResult, FailurePolicy, ProgressCallback,
    ReportConfiguration, StitchError,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Exit status for an unreadable or invalid configuration.
const EXIT_CONFIGURATION: u8 = 5;

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One bar for the whole run plus a log line per dashboard.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Self::with_bar(ProgressBar::new(0))
    }

    fn with_bar(bar: ProgressBar) -> Arc<Self> {
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} dashboards  ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Stitching");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    /// Clear the bar when the run ends early and `on_extraction_complete`
    /// never fires.
    fn abandon(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_dashboards: usize) {
        self.bar.set_length(total_dashboards as u64);
        self.bar.reset_eta();
    }

    fn on_dashboard_start(&self, team: &str, dashboard: &str) {
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(format!("{team} / {dashboard}"));
    }

    fn on_dashboard_complete(&self, team: &str, dashboard: &str, png_len: usize) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} {} / {}  {}  {}",
            green("✓"),
            team,
            dashboard,
            dim(&format!("{:>8} bytes", png_len)),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_dashboard_error(&self, team: &str, dashboard: &str, error: &str) {
        let secs = self.elapsed_secs();
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {} / {}  {}  {}",
            red("✗"),
            team,
            dashboard,
            red(error),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, total_dashboards: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} dashboards stitched",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} dashboards stitched  ({} failed)",
                red("⚠"),
                bold(&success_count.to_string()),
                total_dashboards,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Stitch every configured dashboard into ./output/*.png
  dashstitch

  # Explicit configuration and download directory
  dashstitch -C team_report.yaml -t ./downloads

  # Self-contained HTML report to stdout
  dashstitch -O console > report.html

  # HTML report file at double resolution, skipping broken dashboards
  dashstitch -O html -s 2.0 --keep-going

  # Machine-readable summary
  dashstitch --json --no-progress

CONFIGURATION:
  teams:
    My Team:
      team_dashboards:
        Productivity Dashboard:
          filename: productivity.pdf
  settings:
    scale: 1.0
    report_header_height: 96
    page_header_height: 36
    footer_height: 40
    failure_policy: abort

ENVIRONMENT VARIABLES:
  DASHSTITCH__SETTINGS__<KEY>  Override a key of the `settings` section
  PDFIUM_LIB_PATH              Path to the pdfium shared library
  RUST_LOG                     Log filter (overrides -v / -q)

EXIT STATUS:
  0  all dashboards stitched
  1  a dashboard could not be processed
  5  the configuration is missing or invalid
"#;

/// Stitch paginated dashboard PDFs into one image per dashboard.
#[derive(Parser, Debug)]
#[command(
    name = "dashstitch",
    version,
    about = "Stitch paginated dashboard PDFs into one image per dashboard",
    long_about = "Renders each configured dashboard PDF, removes the repeated page headers, \
footers and trailing whitespace, and joins the pages into a single PNG. The images can be \
written as files or embedded into an HTML report.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// YAML file mapping teams to dashboards.
    #[arg(short = 'C', long, env = "DASHSTITCH_CONFIG", default_value = "./weekly_report.yaml")]
    config: PathBuf,

    /// Directory holding the downloaded dashboard PDFs.
    #[arg(
        short = 't',
        long,
        env = "DASHSTITCH_SOURCE_DIR",
        default_value = "./lwr_downloaded_pdfs"
    )]
    source_dir: PathBuf,

    /// Directory receiving images or the HTML report.
    #[arg(short, long, env = "DASHSTITCH_OUTPUT_DIR", default_value = "./output")]
    output_dir: PathBuf,

    /// What to produce from the stitched images.
    #[arg(short = 'O', long, env = "DASHSTITCH_OUTPUT", value_enum, default_value = "images")]
    output: OutputKind,

    /// Resolution as a multiple of 72 DPI (0.1–8.0). Overrides the configuration.
    #[arg(short, long, env = "DASHSTITCH_SCALE")]
    scale: Option<f32>,

    /// Skip failing dashboards instead of stopping at the first one.
    #[arg(long, env = "DASHSTITCH_KEEP_GOING")]
    keep_going: bool,

    /// Heading of the HTML report.
    #[arg(long, env = "DASHSTITCH_TITLE", default_value = "Weekly Report")]
    title: String,

    /// Print a JSON summary of the run (stderr when `-O console`).
    #[arg(long, env = "DASHSTITCH_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DASHSTITCH_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DASHSTITCH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DASHSTITCH_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputKind {
    /// One PNG file per dashboard in the output directory.
    Images,
    /// HTML report with embedded images on stdout.
    Console,
    /// HTML report with embedded images as `report.html`.
    Html,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{} failed to start runtime: {e}", red("error:"));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(&cli, show_progress)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", red("error:"));
            if err
                .downcast_ref::<StitchError>()
                .is_some_and(StitchError::is_configuration)
            {
                ExitCode::from(EXIT_CONFIGURATION)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    let report = ReportConfiguration::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    let cli_progress = show_progress.then(CliProgressCallback::new);
    let progress_cb = cli_progress
        .clone()
        .map(|cb| cb as Arc<dyn ExtractionProgressCallback>);
    let config = build_config(cli, &report, progress_cb)?;

    let result = match extract_dashboards(&report.teams, &cli.source_dir, &config).await {
        Ok(result) => result,
        Err(e) => {
            if let Some(ref cb) = cli_progress {
                cb.abandon();
            }
            return Err(e).context("Extraction failed");
        }
    };

    publish(cli, &result)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&result.summary())
            .context("Failed to serialise summary")?;
        if cli.output == OutputKind::Console {
            eprintln!("{json}");
        } else {
            println!("{json}");
        }
    } else if !cli.quiet && !show_progress {
        eprintln!("Stitched {} dashboards", result.len());
    }

    if !result.failures().is_empty() {
        anyhow::bail!("{} dashboards failed", result.failures().len());
    }
    Ok(())
}

/// Settings from the file, then CLI flags.
fn build_config(
    cli: &Cli,
    report: &ReportConfiguration,
    progress: Option<ProgressCallback>,
) -> Result<ExtractionConfig> {
    let mut builder = report.settings.apply(ExtractionConfig::builder());
    if let Some(scale) = cli.scale {
        builder = builder.scale(scale);
    }
    if cli.keep_going {
        builder = builder.failure_policy(FailurePolicy::Continue);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    Ok(builder.build().context("Invalid configuration")?)
}

fn publish(cli: &Cli, result: &ExtractionResult) -> Result<()> {
    match cli.output {
        OutputKind::Images => {
            let written = write_images(result, &cli.output_dir).context("Failed to store images")?;
            if !cli.quiet {
                eprintln!(
                    "{}  {} images  →  {}",
                    green("✔"),
                    written.len(),
                    bold(&cli.output_dir.display().to_string())
                );
            }
        }
        OutputKind::Console => {
            let html = render_html(result, &cli.title);
            io::stdout()
                .lock()
                .write_all(html.as_bytes())
                .context("Failed to write to stdout")?;
        }
        OutputKind::Html => {
            let path = cli.output_dir.join("report.html");
            write_html(result, &cli.title, &path).context("Failed to write HTML report")?;
            if !cli.quiet {
                eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
            }
        }
    }
    Ok(())
}
