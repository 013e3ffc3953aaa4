//! # resume-review
//!
//! Upload a PDF résumé, render a preview of its first page, and get
//! structured ATS feedback from a vision language model.
//!
//! ## Why render before asking?
//!
//! Vision APIs read images, not documents, and a résumé's layout (columns,
//! headings, white space) is exactly what an applicant-tracking reviewer
//! judges. Page 1 is rasterised at 4× so a model sees the same crisp page a
//! recruiter would, and the PNG doubles as the preview shown next to the
//! feedback.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Upload   store the original PDF
//!  ├─ 2. Render   page 1 → PNG via pdfium (spawn_blocking, bound once)
//!  ├─ 3. Upload   store the preview PNG
//!  ├─ 4. Record   write resume:<uuid> with pending feedback
//!  ├─ 5. Analyze  vision LLM + job-specific instructions
//!  ├─ 6. Parse    JSON → Feedback, validated, attached, record overwritten
//!  └─ 7. Done     return the id
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resume_review::{
//!     AnalysisConfig, AnalysisRequest, Analyzer, JsonFileKvStore, LlmFeedbackModel,
//!     LocalFileStorage, NamedFile, PdfRenderer,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalysisConfig::default();
//!     let storage = Arc::new(LocalFileStorage::new("data/files"));
//!     let kv = Arc::new(JsonFileKvStore::open("data/kv.json").await?);
//!     let renderer = Arc::new(PdfRenderer::from_config(&config));
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let model = Arc::new(LlmFeedbackModel::from_config(
//!         &config,
//!         storage.clone(),
//!         renderer.clone(),
//!     )?);
//!
//!     let analyzer = Analyzer::new(storage, kv, model, renderer, config);
//!     let request = AnalysisRequest::new(NamedFile::pdf("cv.pdf", std::fs::read("cv.pdf")?))
//!         .company_name("Acme")
//!         .job_title("Backend Engineer");
//!     let outcome = analyzer.analyze(request).await?;
//!     println!("resume:{}", outcome.id);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resume-review` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod backend;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{AnalysisOutcome, AnalysisRequest, Analyzer};
pub use backend::{
    FeedbackModel, FileStorage, InferenceResponse, JsonFileKvStore, KvEntry, KvStore,
    LocalFileStorage, MemoryKvStore,
};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, DEFAULT_RENDER_SCALE};
pub use error::{BackendError, ReviewError};
pub use pipeline::library::LazyLibrary;
pub use pipeline::llm::LlmFeedbackModel;
pub use pipeline::render::{PdfConverter, PdfRenderer};
pub use progress::{
    AnalysisProgressCallback, AnalysisStage, AnalysisStatus, NoopProgressCallback,
    ProgressCallback,
};
pub use record::{
    AtsFeedback, AtsTip, CategoryFeedback, ConversionResult, Feedback, FeedbackSlot, NamedFile,
    ResumeRecord, ScoreTier, Tip, TipKind,
};
pub use store::ResumeStore;
