//! The upload orchestrator.
//!
//! [`Analyzer::analyze`] runs one review end to end:
//!
//! ```text
//! upload PDF ─▶ render page 1 ─▶ upload PNG ─▶ write pending record
//!      ─▶ ask the model ─▶ parse feedback ─▶ overwrite record ─▶ done
//! ```
//!
//! Every step reports an [`AnalysisStatus`] before it starts. The first
//! failure reports `Error: …` and ends the run; nothing is retried and
//! nothing already stored is removed. Once the pending record is written,
//! a later failure leaves it in place with empty feedback.

use crate::backend::{FeedbackModel, FileStorage, KvStore};
use crate::config::AnalysisConfig;
use crate::error::ReviewError;
use crate::pipeline::feedback::parse_feedback;
use crate::pipeline::input::resolve_input;
use crate::pipeline::render::PdfConverter;
use crate::progress::{AnalysisStage, AnalysisStatus};
use crate::prompts::{prepare_instructions, render_instructions};
use crate::record::{FeedbackSlot, NamedFile, ResumeRecord};
use crate::store::ResumeStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// One résumé plus the job it is being reviewed against.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub file: NamedFile,
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub job_description: Option<String>,
}

impl AnalysisRequest {
    pub fn new(file: NamedFile) -> Self {
        Self {
            file,
            company_name: None,
            job_title: None,
            job_description: None,
        }
    }

    pub fn company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self
    }

    pub fn job_title(mut self, title: impl Into<String>) -> Self {
        self.job_title = Some(title.into());
        self
    }

    pub fn job_description(mut self, description: impl Into<String>) -> Self {
        self.job_description = Some(description.into());
        self
    }
}

/// A finished review.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub id: Uuid,
    /// The record as last written, with feedback attached.
    pub record: ResumeRecord,
    /// `data:image/png;base64,…` preview of page 1.
    pub image_url: String,
}

/// Sequences a review over the three backends and a PDF converter.
pub struct Analyzer {
    storage: Arc<dyn FileStorage>,
    store: ResumeStore,
    model: Arc<dyn FeedbackModel>,
    converter: Arc<dyn PdfConverter>,
    config: AnalysisConfig,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Analyzer {
    pub fn new(
        storage: Arc<dyn FileStorage>,
        kv: Arc<dyn KvStore>,
        model: Arc<dyn FeedbackModel>,
        converter: Arc<dyn PdfConverter>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            storage,
            store: ResumeStore::new(kv),
            model,
            converter,
            config,
        }
    }

    /// Typed access to the records this analyzer writes.
    pub fn store(&self) -> &ResumeStore {
        &self.store
    }

    /// Review the PDF at a local path or URL.
    pub async fn analyze_input(
        &self,
        input: &str,
        company_name: Option<String>,
        job_title: Option<String>,
        job_description: Option<String>,
    ) -> Result<AnalysisOutcome, ReviewError> {
        let file = match resolve_input(input, self.config.download_timeout_secs).await {
            Ok(file) => file,
            Err(e) => {
                warn!("Cannot review {}: {}", input, e);
                self.report(AnalysisStatus::Failed(e.status_text()));
                return Err(e);
            }
        };
        self.analyze(AnalysisRequest {
            file,
            company_name,
            job_title,
            job_description,
        })
        .await
    }

    /// Run one review, reporting status along the way.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, ReviewError> {
        let start = Instant::now();
        match self.run(request).await {
            Ok(outcome) => {
                info!("Review {} finished in {:?}", outcome.id, start.elapsed());
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_complete(&outcome.id);
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!("Review halted: {}", e);
                self.report(AnalysisStatus::Failed(e.status_text()));
                Err(e)
            }
        }
    }

    async fn run(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, ReviewError> {
        let AnalysisRequest {
            file,
            company_name,
            job_title,
            job_description,
        } = request;

        // 1. Original PDF.
        self.enter(AnalysisStage::UploadingFile);
        let resume_path = self
            .storage
            .upload(&file)
            .await
            .map_err(ReviewError::ResumeUploadFailed)?;
        info!("Uploaded {} → {}", file.name, resume_path);

        // 2. Preview render.
        self.enter(AnalysisStage::ConvertingToImage);
        let conversion = self.converter.convert_to_image(&file).await;
        let image = match conversion.file {
            Some(image) => image,
            None => {
                return Err(ReviewError::ConversionFailed {
                    detail: conversion
                        .error
                        .unwrap_or_else(|| "converter returned no image".to_string()),
                })
            }
        };

        // 3. Preview upload.
        self.enter(AnalysisStage::UploadingImage);
        let image_path = self
            .storage
            .upload(&image)
            .await
            .map_err(ReviewError::ImageUploadFailed)?;

        // 4. Pending record.
        self.enter(AnalysisStage::PreparingData);
        let mut record = ResumeRecord {
            id: Uuid::new_v4(),
            resume_path,
            image_path,
            company_name,
            job_title,
            job_description,
            feedback: FeedbackSlot::Pending,
        };
        self.store
            .save(&record)
            .await
            .map_err(|source| ReviewError::RecordWriteFailed {
                key: record.key(),
                source,
            })?;

        // 5. Inference.
        self.enter(AnalysisStage::Analyzing);
        let prompt = self.prompt_for(&record);
        let response = self
            .model
            .feedback(&record.resume_path, &prompt)
            .await
            .map_err(ReviewError::AnalysisFailed)?;
        let text = response.text().ok_or(ReviewError::EmptyAnalysis)?;

        // 6. Attach feedback.
        let feedback = parse_feedback(text)?;
        record.feedback = FeedbackSlot::Ready(feedback);
        self.store
            .save(&record)
            .await
            .map_err(|source| ReviewError::FeedbackWriteFailed {
                key: record.key(),
                source,
            })?;

        // 7. Done.
        self.enter(AnalysisStage::Complete);
        Ok(AnalysisOutcome {
            id: record.id,
            record,
            image_url: conversion.image_url,
        })
    }

    fn prompt_for(&self, record: &ResumeRecord) -> String {
        let job_title = record.job_title.as_deref().unwrap_or("");
        let job_description = record.job_description.as_deref().unwrap_or("");
        match self.config.instructions {
            Some(ref template) => render_instructions(template, job_title, job_description),
            None => prepare_instructions(job_title, job_description),
        }
    }

    fn enter(&self, stage: AnalysisStage) {
        self.report(AnalysisStatus::Stage(stage));
    }

    fn report(&self, status: AnalysisStatus) {
        info!("{}", status);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_status(&status);
        }
    }
}
