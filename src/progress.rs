//! Status reporting for an analysis run.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to receive a
//! status update as the pipeline enters each stage, and a final failure
//! status if it halts.
//!
//! # Example
//!
//! ```rust
//! use resume_review::{AnalysisConfig, AnalysisProgressCallback, AnalysisStatus};
//! use std::sync::{Arc, Mutex};
//!
//! struct StatusLog(Mutex<Vec<String>>);
//!
//! impl AnalysisProgressCallback for StatusLog {
//!     fn on_status(&self, status: &AnalysisStatus) {
//!         self.0.lock().unwrap().push(status.to_string());
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(StatusLog(Mutex::new(Vec::new()))))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Stages of one analysis, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStage {
    UploadingFile,
    ConvertingToImage,
    UploadingImage,
    PreparingData,
    Analyzing,
    Complete,
}

impl AnalysisStage {
    pub const ALL: [AnalysisStage; 6] = [
        AnalysisStage::UploadingFile,
        AnalysisStage::ConvertingToImage,
        AnalysisStage::UploadingImage,
        AnalysisStage::PreparingData,
        AnalysisStage::Analyzing,
        AnalysisStage::Complete,
    ];

    /// User-visible status text for this stage.
    pub fn message(self) -> &'static str {
        match self {
            AnalysisStage::UploadingFile => "Uploading the file...",
            AnalysisStage::ConvertingToImage => "Converting to image...",
            AnalysisStage::UploadingImage => "Uploading the image...",
            AnalysisStage::PreparingData => "Preparing data...",
            AnalysisStage::Analyzing => "Analyzing...",
            AnalysisStage::Complete => "Analysis complete, redirecting...",
        }
    }
}

/// What the user sees while a review runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisStatus {
    /// The pipeline has entered `stage`.
    Stage(AnalysisStage),
    /// The pipeline halted; the text is the full `Error: …` line.
    Failed(String),
}

impl AnalysisStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnalysisStatus::Stage(AnalysisStage::Complete) | AnalysisStatus::Failed(_)
        )
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisStatus::Stage(stage) => f.write_str(stage.message()),
            AnalysisStatus::Failed(text) => f.write_str(text),
        }
    }
}

/// Called by the analyzer as a review moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Stages of one run never overlap, but one callback
/// may be shared by runs on different tasks, hence `Send + Sync`.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called on entering each stage and once on failure.
    fn on_status(&self, status: &AnalysisStatus) {
        let _ = status;
    }

    /// Called after the final record write with the id to navigate to.
    fn on_complete(&self, id: &Uuid) {
        let _ = id;
    }
}

/// A no-op implementation for callers that don't need status updates.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
