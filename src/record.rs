//! Persisted and transient data shapes.
//!
//! [`ResumeRecord`] is the only thing written to the key-value store; its JSON
//! field names are camelCase so records stay readable by any other client of
//! the same store. [`Feedback`] mirrors the JSON object the model is asked to
//! produce, so parsing the model's answer and loading a stored record use the
//! same serde derive.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix shared by every résumé key in the key-value store.
pub const RESUME_KEY_PREFIX: &str = "resume:";

/// Key under which the record with `id` is stored: `resume:<id>`.
pub fn resume_key(id: &Uuid) -> String {
    format!("{RESUME_KEY_PREFIX}{id}")
}

// ── Files ────────────────────────────────────────────────────────────────

/// An in-memory file ready to be uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct NamedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl NamedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn pdf(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(name, "application/pdf", bytes)
    }

    pub fn png(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(name, "image/png", bytes)
    }

    /// `true` when the payload starts with the `%PDF` magic bytes.
    pub fn looks_like_pdf(&self) -> bool {
        self.bytes.starts_with(b"%PDF")
    }

    /// A `data:` URI embedding the payload, displayable wherever a URL is.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

impl fmt::Debug for NamedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Name of the preview image for a PDF called `pdf_name`.
///
/// A trailing `.pdf` (any case) is dropped and `.png` appended, so
/// `cv.PDF` becomes `cv.png` and a name without extension just gains `.png`.
pub fn png_name_for(pdf_name: &str) -> String {
    let stem = match pdf_name.len().checked_sub(4) {
        Some(cut)
            if pdf_name.is_char_boundary(cut)
                && pdf_name[cut..].eq_ignore_ascii_case(".pdf") =>
        {
            &pdf_name[..cut]
        }
        _ => pdf_name,
    };
    format!("{stem}.png")
}

/// Outcome of rasterising the first page of a PDF.
///
/// Never an `Err`: callers branch on `file`. On failure `image_url` is empty,
/// `file` is `None` and `error` says what went wrong.
#[derive(Debug, Clone, Default)]
pub struct ConversionResult {
    pub image_url: String,
    pub file: Option<NamedFile>,
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn success(file: NamedFile) -> Self {
        Self {
            image_url: file.data_url(),
            file: Some(file),
            error: None,
        }
    }

    pub fn failure(detail: impl fmt::Display) -> Self {
        Self {
            image_url: String::new(),
            file: None,
            error: Some(format!("Failed to convert PDF: {detail}")),
        }
    }
}

// ── Feedback ─────────────────────────────────────────────────────────────

/// Whether a tip praises the résumé or asks for a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Good,
    Improve,
}

/// A tip in the ATS category (no explanation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtsTip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    pub tip: String,
}

/// A tip with a longer explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    pub tip: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtsFeedback {
    pub score: u32,
    pub tips: Vec<AtsTip>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFeedback {
    pub score: u32,
    pub tips: Vec<Tip>,
}

/// Structured review of one résumé.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub overall_score: u32,
    #[serde(rename = "ATS")]
    pub ats: AtsFeedback,
    pub tone_and_style: CategoryFeedback,
    pub content: CategoryFeedback,
    pub structure: CategoryFeedback,
    pub skills: CategoryFeedback,
}

impl Feedback {
    /// Every score with its display title, overall score first.
    pub fn scores(&self) -> [(&'static str, u32); 6] {
        [
            ("Overall", self.overall_score),
            ("ATS", self.ats.score),
            ("Tone & Style", self.tone_and_style.score),
            ("Content", self.content.score),
            ("Structure", self.structure.score),
            ("Skills", self.skills.score),
        ]
    }

    /// Check that every score lies in 0–100.
    pub fn validate(&self) -> Result<(), String> {
        match self.scores().iter().find(|(_, score)| *score > 100) {
            Some((title, score)) => Err(format!("{title} score {score} is outside 0–100")),
            None => Ok(()),
        }
    }
}

/// Feedback attached to a record: pending until the model has answered.
///
/// Serialised as the empty string `""` while pending so a stored record is
/// either unanswered or complete, never half-filled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeedbackSlot {
    #[default]
    Pending,
    Ready(Feedback),
}

impl FeedbackSlot {
    pub fn is_pending(&self) -> bool {
        matches!(self, FeedbackSlot::Pending)
    }

    pub fn as_ready(&self) -> Option<&Feedback> {
        match self {
            FeedbackSlot::Ready(f) => Some(f),
            FeedbackSlot::Pending => None,
        }
    }
}

impl Serialize for FeedbackSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeedbackSlot::Pending => serializer.serialize_str(""),
            FeedbackSlot::Ready(feedback) => feedback.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FeedbackSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Ready(Box<Feedback>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) if s.is_empty() => Ok(FeedbackSlot::Pending),
            Raw::Text(s) => Err(de::Error::custom(format!(
                "feedback must be \"\" or an object, got string {s:?}"
            ))),
            Raw::Ready(feedback) => Ok(FeedbackSlot::Ready(*feedback)),
        }
    }
}

// ── Record ───────────────────────────────────────────────────────────────

/// One uploaded résumé, persisted as JSON under `resume:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: Uuid,
    pub resume_path: String,
    pub image_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    #[serde(default)]
    pub feedback: FeedbackSlot,
}

impl ResumeRecord {
    pub fn key(&self) -> String {
        resume_key(&self.id)
    }

    /// Heading shown for the record: company, job title, or a generic label.
    pub fn title(&self) -> String {
        let company = self.company_name.as_deref().filter(|s| !s.is_empty());
        let job = self.job_title.as_deref().filter(|s| !s.is_empty());
        match (company, job) {
            (Some(c), Some(j)) => format!("{c} — {j}"),
            (Some(c), None) => c.to_string(),
            (None, Some(j)) => j.to_string(),
            (None, None) => "Resume".to_string(),
        }
    }
}

// ── Score tiers ──────────────────────────────────────────────────────────

/// Coarse verdict for a 0–100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreTier {
    /// Above 70.
    Strong,
    /// 50–70.
    GoodStart,
    /// 49 and below.
    NeedsWork,
}

impl ScoreTier {
    pub fn from_score(score: u32) -> Self {
        if score > 70 {
            ScoreTier::Strong
        } else if score > 49 {
            ScoreTier::GoodStart
        } else {
            ScoreTier::NeedsWork
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreTier::Strong => "Strong",
            ScoreTier::GoodStart => "Good Start",
            ScoreTier::NeedsWork => "Needs Work",
        }
    }
}

impl fmt::Display for ScoreTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_feedback() -> Feedback {
        let tip = |kind| Tip {
            kind,
            tip: "Quantify results".into(),
            explanation: "Numbers make impact concrete.".into(),
        };
        let cat = |score| CategoryFeedback {
            score,
            tips: vec![tip(TipKind::Good), tip(TipKind::Improve)],
        };
        Feedback {
            overall_score: 72,
            ats: AtsFeedback {
                score: 65,
                tips: vec![AtsTip {
                    kind: TipKind::Improve,
                    tip: "Add keywords from the posting".into(),
                }],
            },
            tone_and_style: cat(80),
            content: cat(70),
            structure: cat(75),
            skills: cat(60),
        }
    }

    #[test]
    fn png_name_swaps_extension() {
        assert_eq!(png_name_for("resume.pdf"), "resume.png");
        assert_eq!(png_name_for("Resume.PDF"), "Resume.png");
        assert_eq!(png_name_for("resume"), "resume.png");
        assert_eq!(png_name_for("a.pdf.pdf"), "a.pdf.png");
        assert_eq!(png_name_for("notes.txt"), "notes.txt.png");
        assert_eq!(png_name_for("é.pdf"), "é.png");
    }

    #[test]
    fn pending_feedback_serialises_as_empty_string() {
        let record = ResumeRecord {
            id: Uuid::nil(),
            resume_path: "a/cv.pdf".into(),
            image_path: "b/cv.png".into(),
            company_name: None,
            job_title: Some("Engineer".into()),
            job_description: None,
            feedback: FeedbackSlot::Pending,
        };
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(json["feedback"], "");
        assert_eq!(json["jobTitle"], "Engineer");
        assert_eq!(json["resumePath"], "a/cv.pdf");
        assert!(json.get("companyName").is_none());

        let back: ResumeRecord = serde_json::from_value(json).unwrap();
        assert!(back.feedback.is_pending());
    }

    #[test]
    fn ready_feedback_uses_camel_case_and_ats_key() {
        let json = serde_json::to_value(FeedbackSlot::Ready(sample_feedback())).unwrap();
        assert_eq!(json["overallScore"], 72);
        assert_eq!(json["ATS"]["score"], 65);
        assert_eq!(json["toneAndStyle"]["tips"][0]["type"], "good");
        assert_eq!(json["ATS"]["tips"][0]["type"], "improve");
    }

    #[test]
    fn non_empty_string_feedback_is_rejected() {
        let err = serde_json::from_str::<FeedbackSlot>("\"soon\"").unwrap_err();
        assert!(err.to_string().contains("soon"), "got: {err}");
    }

    #[test]
    fn validate_rejects_out_of_range_scores() {
        let mut fb = sample_feedback();
        assert!(fb.validate().is_ok());
        fb.skills.score = 140;
        let err = fb.validate().unwrap_err();
        assert!(err.contains("Skills"), "got: {err}");
    }

    #[test]
    fn score_tier_thresholds() {
        assert_eq!(ScoreTier::from_score(71), ScoreTier::Strong);
        assert_eq!(ScoreTier::from_score(70), ScoreTier::GoodStart);
        assert_eq!(ScoreTier::from_score(50), ScoreTier::GoodStart);
        assert_eq!(ScoreTier::from_score(49), ScoreTier::NeedsWork);
        assert_eq!(ScoreTier::from_score(0).label(), "Needs Work");
    }

    #[test]
    fn record_title_falls_back_to_resume() {
        let mut record = ResumeRecord {
            id: Uuid::nil(),
            resume_path: String::new(),
            image_path: String::new(),
            company_name: Some(String::new()),
            job_title: None,
            job_description: None,
            feedback: FeedbackSlot::Pending,
        };
        assert_eq!(record.title(), "Resume");
        record.job_title = Some("Engineer".into());
        assert_eq!(record.title(), "Engineer");
        assert_eq!(record.key(), format!("resume:{}", Uuid::nil()));
    }

    #[test]
    fn conversion_failure_has_no_file() {
        let r = ConversionResult::failure("boom");
        assert!(r.file.is_none());
        assert!(r.image_url.is_empty());
        assert_eq!(r.error.as_deref(), Some("Failed to convert PDF: boom"));
    }

    #[test]
    fn data_url_embeds_mime_type() {
        let f = NamedFile::png("x.png", vec![1, 2, 3]);
        assert_eq!(f.data_url(), "data:image/png;base64,AQID");
    }
}
