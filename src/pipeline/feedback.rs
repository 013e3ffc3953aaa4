//! Parse the model's answer into a [`Feedback`].
//!
//! The prompt asks for bare JSON, but chat models still wrap it in a
//! ```` ```json ```` fence now and then. The fence is stripped before
//! parsing; anything else that is not a complete feedback object is
//! rejected rather than patched up.

use crate::error::ReviewError;
use crate::record::Feedback;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?```$").unwrap());

/// Remove a single Markdown code fence around the whole answer, if present.
pub fn strip_code_fences(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed).and_then(|c| c.get(1)) {
        Some(body) => body.as_str().trim(),
        None => trimmed,
    }
}

/// Decode and validate the feedback JSON returned by the model.
pub fn parse_feedback(text: &str) -> Result<Feedback, ReviewError> {
    let body = strip_code_fences(text);
    let feedback: Feedback =
        serde_json::from_str(body).map_err(|e| ReviewError::MalformedFeedback {
            detail: e.to_string(),
        })?;
    feedback
        .validate()
        .map_err(|detail| ReviewError::MalformedFeedback { detail })?;
    debug!("Parsed feedback, overall score {}", feedback.overall_score);
    Ok(feedback)
}
