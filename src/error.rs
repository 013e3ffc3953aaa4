//! Error types for the resume-review library.
//!
//! Two error types mirror the two sides of every pipeline step:
//!
//! * [`BackendError`] — what a collaborator (file storage, key-value store,
//!   inference model) reports when one of its calls fails. Backends know
//!   nothing about the pipeline, so these errors carry no stage information.
//!
//! * [`ReviewError`] — what the caller of [`crate::Analyzer::analyze`] sees.
//!   Each variant names the stage that failed, wrapping the backend error
//!   where there is one, and maps to the single status line shown to the
//!   user via [`ReviewError::status_text`].
//!
//! PDF rasterisation failures are absent from both: the renderer
//! folds them into [`crate::record::ConversionResult::error`] and the
//! orchestrator turns a missing image into [`ReviewError::ConversionFailed`].

use std::path::PathBuf;
use thiserror::Error;

/// A failed call to a storage, key-value or inference backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Nothing is stored at the requested path or key.
    #[error("Not found: '{0}'")]
    NotFound(String),

    /// A storage path tried to escape the backend root or was empty.
    #[error("Invalid storage path '{0}'")]
    InvalidPath(String),

    /// Local file-system failure inside a backend.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A backend could not encode or decode its own persisted state.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The remote service answered with an error or did not answer at all.
    #[error("Remote call failed: {0}")]
    Remote(String),
}

/// All errors that abort a single résumé review.
///
/// No variant is fatal to the process: each one ends the current upload
/// attempt only, and nothing is retried or rolled back.
#[derive(Debug, Error)]
pub enum ReviewError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{name}'\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: [u8; 4] },

    // ── Pipeline stage errors ─────────────────────────────────────────────
    /// Step 1: the résumé PDF could not be stored.
    #[error("Failed to upload résumé: {0}")]
    ResumeUploadFailed(#[source] BackendError),

    /// Step 2: the first page could not be rendered to an image.
    #[error("Failed to convert PDF to image: {detail}")]
    ConversionFailed { detail: String },

    /// Step 3: the preview image could not be stored.
    #[error("Failed to upload preview image: {0}")]
    ImageUploadFailed(#[source] BackendError),

    /// Step 4: the pending record could not be written.
    #[error("Failed to write record '{key}': {source}")]
    RecordWriteFailed {
        key: String,
        #[source]
        source: BackendError,
    },

    /// Step 5: the inference call failed.
    #[error("Résumé analysis failed: {0}")]
    AnalysisFailed(#[source] BackendError),

    /// Step 5: the inference call returned no text.
    #[error("Résumé analysis returned an empty response")]
    EmptyAnalysis,

    /// Step 6: the model's answer is not a complete feedback object.
    #[error("Model returned malformed feedback: {detail}")]
    MalformedFeedback { detail: String },

    /// Step 6: the record could not be updated with its feedback.
    ///
    /// The record stays persisted with pending feedback.
    #[error("Failed to save feedback for '{key}': {source}")]
    FeedbackWriteFailed {
        key: String,
        #[source]
        source: BackendError,
    },

    // ── Store errors ──────────────────────────────────────────────────────
    /// No record exists under `resume:<id>`.
    #[error("No résumé found with id '{id}'")]
    RecordNotFound { id: String },

    /// A persisted record is not valid JSON for a [`crate::ResumeRecord`].
    #[error("Record '{key}' is corrupt: {detail}")]
    CorruptRecord { key: String, detail: String },

    /// Reading from the key-value store failed.
    #[error("Key-value store error: {0}")]
    Store(#[source] BackendError),

    // ── LLM / config errors ───────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReviewError {
    /// The one-line status shown to the user when a review halts.
    ///
    /// Stage errors use the fixed wording of the upload screen; everything
    /// else falls back to the error's own message.
    pub fn status_text(&self) -> String {
        let reason = match self {
            ReviewError::ResumeUploadFailed(_) => "Failed to upload file",
            ReviewError::ConversionFailed { .. } => "Failed to convert PDF to image",
            ReviewError::ImageUploadFailed(_) => "Failed to upload image",
            ReviewError::RecordWriteFailed { .. } => "Failed to save resume data",
            ReviewError::AnalysisFailed(_) | ReviewError::EmptyAnalysis => {
                "Failed to analyze resume"
            }
            ReviewError::MalformedFeedback { .. } => "Failed to parse feedback",
            ReviewError::FeedbackWriteFailed { .. } => "Failed to save feedback",
            other => return format!("Error: {other}"),
        };
        format!("Error: {reason}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_errors_use_fixed_status_text() {
        let e = ReviewError::ResumeUploadFailed(BackendError::Remote("503".into()));
        assert_eq!(e.status_text(), "Error: Failed to upload file");

        let e = ReviewError::ConversionFailed {
            detail: "bad xref".into(),
        };
        assert_eq!(e.status_text(), "Error: Failed to convert PDF to image");

        assert_eq!(
            ReviewError::EmptyAnalysis.status_text(),
            "Error: Failed to analyze resume"
        );
    }

    #[test]
    fn non_stage_errors_fall_back_to_message() {
        let e = ReviewError::RecordNotFound { id: "abc".into() };
        let status = e.status_text();
        assert!(status.starts_with("Error: "), "got: {status}");
        assert!(status.contains("abc"));
    }

    #[test]
    fn record_write_display_names_key() {
        let e = ReviewError::RecordWriteFailed {
            key: "resume:42".into(),
            source: BackendError::NotFound("kv".into()),
        };
        assert!(e.to_string().contains("resume:42"));
    }
}
