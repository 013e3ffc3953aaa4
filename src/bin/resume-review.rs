//! CLI binary for resume-review.
//!
//! A thin shim over the library crate: `analyze` maps flags to an
//! `AnalysisConfig` and runs one review against the local backends under
//! `--data-dir`; `show` and `list` read the stored records back.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use resume_review::pipeline::pdfium::is_pdfium_available_offline;
use resume_review::{
    AnalysisConfig, AnalysisProgressCallback, AnalysisStage, AnalysisStatus, Analyzer,
    JsonFileKvStore, LlmFeedbackModel, LocalFileStorage, PdfRenderer, ProgressCallback,
    ResumeRecord, ResumeStore, ScoreTier, TipKind,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

/// Terminal status line: a spinner showing the current stage, replaced by a
/// final tick or cross.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Once,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        Arc::new(Self {
            bar,
            started: Once::new(),
        })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_status(&self, status: &AnalysisStatus) {
        match status {
            AnalysisStatus::Stage(AnalysisStage::Complete) => {
                self.bar.finish_and_clear();
                eprintln!("{} {}", green("✔"), status);
            }
            AnalysisStatus::Failed(text) => {
                self.bar.finish_and_clear();
                eprintln!("{} {}", red("✘"), text);
            }
            AnalysisStatus::Stage(_) => {
                // Not drawn until a review is running.
                self.started
                    .call_once(|| self.bar.enable_steady_tick(Duration::from_millis(80)));
                self.bar.set_message(status.to_string());
            }
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Review a résumé against a job posting
  resume-review analyze cv.pdf --company Acme --job-title "Backend Engineer" \
      --job-description-file posting.txt

  # Review a résumé hosted online, print the record as JSON
  resume-review analyze https://example.com/cv.pdf --json

  # Use a specific model
  resume-review analyze cv.pdf --provider anthropic --model claude-sonnet-4-20250514

  # Show a stored review / list all reviews / list unfinished ones
  resume-review show 5f0c6c1e-0f53-4c55-9b1b-3c1e5a1f9a77
  resume-review list
  resume-review list --pending

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RESUME_REVIEW_DATA_DIR  Where uploads and records are kept
  PDFIUM_LIB_PATH         Path to an existing libpdfium; skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  PDFIUM_NO_DOWNLOAD      Never download pdfium

SETUP:
  1. Set API key:     export OPENAI_API_KEY=sk-...
  2. Review:          resume-review analyze cv.pdf --job-title "Data Analyst"

  PDFium (~30 MB) is downloaded automatically on first run and cached in
  ~/.cache/resume-review/pdfium-7690/.
"#;

/// Review PDF résumés with a vision LLM and keep the results.
#[derive(Parser, Debug)]
#[command(
    name = "resume-review",
    version,
    about = "Get ATS-style feedback on a PDF résumé from a vision LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding uploaded files and the record store.
    #[arg(long, global = true, env = "RESUME_REVIEW_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "RESUME_REVIEW_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, global = true, env = "RESUME_REVIEW_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a résumé, render its preview and ask for feedback.
    Analyze(AnalyzeArgs),

    /// Print a stored review.
    Show {
        /// Record id (with or without the `resume:` prefix).
        id: String,

        /// Print the stored JSON record.
        #[arg(long)]
        json: bool,
    },

    /// List stored reviews.
    List {
        /// Only reviews that never received feedback.
        #[arg(long)]
        pending: bool,

        /// Print the records as a JSON array.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Company the résumé is aimed at.
    #[arg(long)]
    company: Option<String>,

    /// Title of the position applied for.
    #[arg(long)]
    job_title: Option<String>,

    /// Job posting text.
    #[arg(long, conflicts_with = "job_description_file")]
    job_description: Option<String>,

    /// Read the job posting text from a file.
    #[arg(long)]
    job_description_file: Option<PathBuf>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID (e.g. gpt-4.1-mini, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Preview render scale (0.5–8.0).
    #[arg(long, env = "RESUME_REVIEW_SCALE", default_value_t = 4.0)]
    scale: f32,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "RESUME_REVIEW_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "RESUME_REVIEW_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Path to a custom instruction template ({job_title}, {job_description},
    /// {response_format} are substituted).
    #[arg(long, env = "RESUME_REVIEW_INSTRUCTIONS")]
    instructions: Option<PathBuf>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "RESUME_REVIEW_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print the finished record as JSON.
    #[arg(long)]
    json: bool,

    /// Disable the status spinner.
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner carries the status while it runs, so library INFO logs
    // are muted unless --verbose asks for everything.
    let spinner = match cli.command {
        Command::Analyze(ref a) => !cli.quiet && !a.no_progress && !a.json,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || spinner {
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

    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let storage = Arc::new(LocalFileStorage::new(data_dir.join("files")));
    let kv = Arc::new(
        JsonFileKvStore::open(data_dir.join("kv.json"))
            .await
            .with_context(|| format!("Failed to open record store in {}", data_dir.display()))?,
    );

    match cli.command {
        Command::Analyze(ref args) => {
            let progress: Option<ProgressCallback> = if spinner {
                Some(CliProgressCallback::new())
            } else {
                None
            };
            let config = build_config(args, progress).await?;

            if !cli.quiet && !is_pdfium_available_offline() {
                eprintln!(
                    "{} {}",
                    dim("◆"),
                    dim("First run: the PDF engine (~30 MB) may be downloaded…")
                );
            }

            let renderer = Arc::new(PdfRenderer::from_config(&config));
            let model = Arc::new(
                LlmFeedbackModel::from_config(&config, storage.clone(), renderer.clone())
                    .context("No LLM provider available")?,
            );

            let job_description = match (&args.job_description, &args.job_description_file) {
                (Some(text), _) => Some(text.clone()),
                (None, Some(path)) => Some(
                    tokio::fs::read_to_string(path)
                        .await
                        .with_context(|| format!("Failed to read job description from {:?}", path))?,
                ),
                (None, None) => None,
            };

            let analyzer = Analyzer::new(storage, kv, model, renderer, config);
            let outcome = analyzer
                .analyze_input(
                    &args.input,
                    args.company.clone(),
                    args.job_title.clone(),
                    job_description,
                )
                .await
                .context("Review failed")?;

            if args.json {
                print_json(&outcome.record)?;
            } else {
                print_record(&outcome.record);
            }
        }

        Command::Show { ref id, json } => {
            let store = ResumeStore::new(kv);
            let record = store.get_by_str(id).await.context("Failed to load review")?;
            if json {
                print_json(&record)?;
            } else {
                print_record(&record);
            }
        }

        Command::List { pending, json } => {
            let store = ResumeStore::new(kv);
            let records = if pending {
                store.list_pending().await
            } else {
                store.list().await
            }
            .context("Failed to list reviews")?;

            if json {
                print_json(&records)?;
            } else if records.is_empty() {
                if !cli.quiet {
                    eprintln!("No reviews in {}", data_dir.display());
                }
            } else {
                for record in &records {
                    print_summary_line(record);
                }
            }
        }
    }

    Ok(())
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("resume-review")
}

/// Map CLI args to `AnalysisConfig`.
async fn build_config(args: &AnalyzeArgs, progress: Option<ProgressCallback>) -> Result<AnalysisConfig> {
    let mut builder = AnalysisConfig::builder()
        .render_scale(args.scale)
        .temperature(args.temperature)
        .max_tokens(args.max_tokens)
        .download_timeout_secs(args.download_timeout);

    if let Some(ref path) = args.instructions {
        let template = read_text(path)
            .await
            .with_context(|| format!("Failed to read instructions from {:?}", path))?;
        builder = builder.instructions(template);
    }
    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn read_text(path: &Path) -> Result<String> {
    let text = tokio::fs::read_to_string(path).await?;
    if text.trim().is_empty() {
        bail!("{} is empty", path.display());
    }
    Ok(text)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}

fn tier_colour(score: u32) -> String {
    let label = format!("{score:>3}/100  {}", ScoreTier::from_score(score));
    match ScoreTier::from_score(score) {
        ScoreTier::Strong => green(&label),
        ScoreTier::GoodStart => yellow(&label),
        ScoreTier::NeedsWork => red(&label),
    }
}

fn print_summary_line(record: &ResumeRecord) {
    let score = match record.feedback.as_ready() {
        Some(f) => tier_colour(f.overall_score),
        None => dim("pending"),
    };
    println!("{}  {:<40}  {}", record.id, record.title(), score);
}

fn print_record(record: &ResumeRecord) {
    println!("{}  {}", bold(&record.title()), dim(&format!("resume:{}", record.id)));
    println!("{}", dim(&format!("résumé {}  ·  preview {}", record.resume_path, record.image_path)));

    let Some(feedback) = record.feedback.as_ready() else {
        println!("\n{}", yellow("Feedback pending: the review did not finish."));
        return;
    };

    println!();
    for (title, score) in feedback.scores() {
        println!("  {:<14} {}", title, tier_colour(score));
    }

    println!("\n{}", bold("ATS"));
    for tip in &feedback.ats.tips {
        println!("  {} {}", tip_mark(tip.kind), tip.tip);
    }

    let sections = [
        ("Tone & Style", &feedback.tone_and_style),
        ("Content", &feedback.content),
        ("Structure", &feedback.structure),
        ("Skills", &feedback.skills),
    ];
    for (title, category) in sections {
        println!("\n{}", bold(title));
        for tip in &category.tips {
            println!("  {} {}", tip_mark(tip.kind), tip.tip);
            if !tip.explanation.is_empty() {
                println!("    {}", dim(&tip.explanation));
            }
        }
    }
}

fn tip_mark(kind: TipKind) -> String {
    match kind {
        TipKind::Good => green("✓"),
        TipKind::Improve => yellow("!"),
    }
}
