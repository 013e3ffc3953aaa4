//! Pipeline stages for a résumé review.
//!
//! Each submodule implements one step; [`crate::Analyzer`] sequences them
//! together with the storage and key-value backends.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ llm ──▶ feedback
//! (URL/path) (pdfium)   (PNG)     (VLM)   (JSON → Feedback)
//! ```
//!
//! 1. [`input`]    — read or download the PDF and check its magic bytes
//! 2. [`render`]   — rasterise page 1 at the configured scale; runs in
//!    `spawn_blocking`, with pdfium bound once through [`library`] and
//!    located by [`pdfium`]
//! 3. [`encode`]   — PNG-encode the preview and wrap images for the API
//! 4. [`llm`]      — the vision-model [`crate::backend::FeedbackModel`]
//! 5. [`feedback`] — strip stray fences and decode the feedback JSON

pub mod encode;
pub mod feedback;
pub mod input;
pub mod library;
pub mod llm;
pub mod pdfium;
pub mod render;
