//! CLI binary for mail-triage.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `TriageConfig`, drives the ingestion controller and prints results.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use mail_triage::{
    compose_now, export_report, AttemptId, ClassificationResult, HttpAnalysisBackend, IncomingFile,
    IngestionController, IngestionProgressCallback, IngestionSource, IngestionState,
    PdfiumReportRenderer, PlainTextRenderer, ProgressCallback, ReportRenderer, StdinClipboard,
    SubmitOutcome, TriageConfig,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner that follows the controller's
/// state and counts extracted PDF pages.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Ingesting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl IngestionProgressCallback for CliProgressCallback {
    fn on_state_change(&self, state: &IngestionState) {
        let msg = match state {
            IngestionState::Idle => return,
            IngestionState::Validating => "checking file type…".to_string(),
            IngestionState::Extracting { media, .. } => format!("reading {media}…"),
            IngestionState::Committing { .. } => "almost there…".to_string(),
            IngestionState::Analyzing { .. } => {
                self.bar.set_prefix("Analyzing");
                "waiting for the backend…".to_string()
            }
            IngestionState::Failed(_) => {
                self.bar.finish_and_clear();
                return;
            }
        };
        self.bar.set_message(msg);
    }

    fn on_page_extracted(&self, page_num: usize, total_pages: usize) {
        self.bar.set_message(format!("page {page_num}/{total_pages}"));
    }

    fn on_committed(&self, _attempt: AttemptId, text_len: usize) {
        self.bar.println(format!(
            "{} document ready  {}",
            green("✔"),
            dim(&format!("{text_len} bytes"))
        ));
    }

    fn on_superseded(&self, attempt: AttemptId) {
        self.bar
            .println(format!("{} attempt {attempt} replaced", yellow("⚠")));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print the text extracted from a PDF
  mail-triage extract message.pdf

  # Classify a file and export the report next to it
  mail-triage analyze message.txt --report-dir .

  # Classify whatever is on the clipboard
  pbpaste | mail-triage analyze --paste

  # Classify inline text, JSON output
  mail-triage analyze --text "Hi, any news on ticket 4411?" --json > result.json

  # Re-export a report from a saved result
  mail-triage report --result result.json --original message.txt -o reports/

ENVIRONMENT VARIABLES:
  MAIL_TRIAGE_BACKEND_URL   Analysis endpoint (default http://127.0.0.1:5001/api)
  MAIL_TRIAGE_TIMEOUT       Backend request timeout in seconds
  MAIL_TRIAGE_COMMIT_DELAY  Delay before extracted text is committed, in ms
  PDFIUM_LIB_PATH           Path to libpdfium (file or directory)
  RUST_LOG                  Overrides the log filter
"#;

/// Ingest emails, classify them and export analysis reports.
#[derive(Parser, Debug)]
#[command(
    name = "mail-triage",
    version,
    about = "Ingest emails (text or PDF), classify them and export analysis reports",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Analysis backend endpoint.
    #[arg(long, global = true, env = "MAIL_TRIAGE_BACKEND_URL")]
    backend_url: Option<String>,

    /// Backend request timeout in seconds.
    #[arg(long, global = true, env = "MAIL_TRIAGE_TIMEOUT")]
    timeout: Option<u64>,

    /// Delay before extracted file text lands in the buffer, in ms.
    #[arg(long, global = true, env = "MAIL_TRIAGE_COMMIT_DELAY")]
    commit_delay_ms: Option<u64>,

    /// Path to the pdfium shared library (file or directory).
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest a file and print its normalised text.
    Extract {
        /// A .txt or .pdf file.
        file: PathBuf,

        /// Declared media type, overriding the one inferred from the extension.
        #[arg(long)]
        media_type: Option<String>,
    },

    /// Ingest a document, classify it and optionally export the report.
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,

        /// Export the report into this directory.
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Export the report as plain text instead of PDF.
        #[arg(long, requires = "report_dir")]
        plain_report: bool,
    },

    /// Compose and export a report from a saved result.
    Report {
        /// JSON result as printed by `analyze --json`.
        #[arg(long)]
        result: PathBuf,

        /// The original document (.txt or .pdf).
        #[arg(long)]
        original: PathBuf,

        /// Output directory.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Export as plain text instead of PDF.
        #[arg(long)]
        plain: bool,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputArgs {
    /// A .txt or .pdf file.
    file: Option<PathBuf>,

    /// Read the document from stdin, as if pasted.
    #[arg(long)]
    paste: bool,

    /// Use this text as the document, as if typed.
    #[arg(long)]
    text: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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

    let progress: Option<Arc<CliProgressCallback>> = if cli.quiet {
        None
    } else {
        Some(CliProgressCallback::new())
    };
    let config = build_config(&cli, progress.clone().map(|p| p as ProgressCallback))?;
    let controller = IngestionController::new(&config);

    match &cli.command {
        Command::Extract { file, media_type } => {
            let text = ingest_file(&controller, file, media_type.as_deref()).await?;
            finish(&progress);
            write_stdout(&text)?;
        }

        Command::Analyze {
            input,
            json,
            report_dir,
            plain_report,
        } => {
            if let Some(ref file) = input.file {
                ingest_file(&controller, file, None).await?;
            } else if input.paste {
                controller
                    .paste_from(&StdinClipboard)
                    .await
                    .context("Failed to read pasted text")?;
            } else if let Some(ref text) = input.text {
                controller.submit_typed_text(text.clone());
            }

            let backend = HttpAnalysisBackend::from_config(&config)?;
            let result = controller.analyze(&backend).await.context("Analysis failed")?;
            finish(&progress);

            if *json {
                let out = serde_json::to_string_pretty(&result).context("Failed to serialise result")?;
                write_stdout(&out)?;
            } else {
                print_result(&result);
            }

            if let Some(dir) = report_dir {
                export(&config, &result, &controller.text(), dir, *plain_report, cli.quiet)?;
            }
        }

        Command::Report {
            result,
            original,
            output,
            plain,
        } => {
            let raw = tokio::fs::read(result)
                .await
                .with_context(|| format!("Failed to read {}", result.display()))?;
            let result: ClassificationResult = serde_json::from_slice(&raw)
                .with_context(|| format!("{} is not a valid analysis result", result.display()))?;
            let original = ingest_file(&controller, original, None).await?;
            finish(&progress);
            export(&config, &result, &original, output, *plain, cli.quiet)?;
        }
    }

    Ok(())
}

/// Clear the spinner before results are printed.
fn finish(progress: &Option<Arc<CliProgressCallback>>) {
    if let Some(p) = progress {
        p.bar.finish_and_clear();
    }
}

/// Map CLI args to `TriageConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<TriageConfig> {
    let mut builder = TriageConfig::builder();
    if let Some(ref url) = cli.backend_url {
        builder = builder.backend_url(url.clone());
    }
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(ms) = cli.commit_delay_ms {
        builder = builder.commit_delay_ms(ms);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

/// Submit a local file and wait until its text has been committed.
async fn ingest_file(
    controller: &IngestionController,
    path: &Path,
    media_type: Option<&str>,
) -> Result<String> {
    let mut file = IncomingFile::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if let Some(declared) = media_type {
        file.media_type = declared.to_string();
    }

    match controller
        .submit_file(file, IngestionSource::FileSelected)
        .await
        .with_context(|| format!("Failed to ingest {}", path.display()))?
    {
        SubmitOutcome::Scheduled(_) => {}
        SubmitOutcome::Superseded(attempt) => bail!("ingestion attempt {attempt} was superseded"),
    }

    while controller.is_busy() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    if let Some(err) = controller.error() {
        return Err(err).context("Ingestion failed");
    }
    Ok(controller.text())
}

fn export(
    config: &TriageConfig,
    result: &ClassificationResult,
    original: &str,
    dir: &Path,
    plain: bool,
    quiet: bool,
) -> Result<()> {
    let report = compose_now(result, original, &config.layout);
    let renderer: Box<dyn ReportRenderer> = if plain {
        Box::new(PlainTextRenderer)
    } else {
        Box::new(PdfiumReportRenderer::from_config(config))
    };
    let path = export_report(&report, renderer.as_ref(), dir).context("Report export failed")?;
    if !quiet {
        eprintln!(
            "{} report ({} pages) → {}",
            green("✔"),
            report.page_count(),
            bold(&path.display().to_string())
        );
    }
    Ok(())
}

fn print_result(result: &ClassificationResult) {
    println!("{}  {}", bold("Category:"), result.category);
    println!("{}  {}", bold("Purpose:"), result.purpose);
    println!(
        "{}  {}%",
        bold("Productivity:"),
        mail_triage::productivity_percent(result.probability)
    );
    println!("{}  {}", bold("Justification:"), result.justification);
    println!();
    println!("{}", bold("Suggested response:"));
    println!("{}", result.suggested_response);
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle
            .write_all(b"\n")
            .context("Failed to write to stdout")?;
    }
    Ok(())
}
