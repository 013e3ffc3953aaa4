//! Collaborator seams: file storage, key-value persistence and inference.
//!
//! The analyzer only ever talks to these three traits, so the same pipeline
//! runs against a hosted platform, the local backends shipped here, or test
//! doubles. Every method returns an explicit [`BackendError`] instead of a
//! null result; the analyzer decides which stage a failure belongs to.
//!
//! | Trait | Local implementation |
//! |-------|----------------------|
//! | [`FileStorage`] | [`LocalFileStorage`] (directory tree) |
//! | [`KvStore`] | [`MemoryKvStore`], [`JsonFileKvStore`] |
//! | [`FeedbackModel`] | [`crate::pipeline::llm::LlmFeedbackModel`] |

use crate::error::BackendError;
use crate::record::NamedFile;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod kv;
pub mod storage;

pub use kv::{glob_match, JsonFileKvStore, MemoryKvStore};
pub use storage::LocalFileStorage;

/// Opaque blob storage addressed by path.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `file` and return the path it can be read back from.
    async fn upload(&self, file: &NamedFile) -> Result<String, BackendError>;

    /// Read back the bytes stored at `path`.
    async fn read(&self, path: &str) -> Result<Vec<u8>, BackendError>;
}

/// One key-value pair returned by [`KvStore::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
}

/// String-keyed store of JSON-encoded string values.
///
/// No compare-and-swap: concurrent writers to one key resolve last-write-wins.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Create or overwrite `key`.
    async fn set(&self, key: &str, value: String) -> Result<(), BackendError>;

    /// All entries whose key matches `pattern` (`*` matches any run of
    /// characters), sorted by key.
    async fn list(&self, pattern: &str) -> Result<Vec<KvEntry>, BackendError>;
}

/// Produces feedback for a stored file.
#[async_trait]
pub trait FeedbackModel: Send + Sync {
    /// Ask the model about the file at `file_path` with `prompt`.
    async fn feedback(&self, file_path: &str, prompt: &str)
        -> Result<InferenceResponse, BackendError>;
}

// ── Inference response ───────────────────────────────────────────────────

/// Chat-style response envelope: `{message: {content}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceResponse {
    pub message: InferenceMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceMessage {
    pub content: MessageContent,
}

/// Content is either a bare string or a list of content blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: String,
}

impl InferenceResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            message: InferenceMessage {
                content: MessageContent::Text(text.into()),
            },
        }
    }

    /// The textual payload: the string content, or the first block's text.
    ///
    /// `None` when there is no text at all.
    pub fn text(&self) -> Option<&str> {
        let text = match &self.message.content {
            MessageContent::Text(s) => s.as_str(),
            MessageContent::Blocks(blocks) => blocks.first().map(|b| b.text.as_str())?,
        };
        (!text.trim().is_empty()).then_some(text)
    }
}
