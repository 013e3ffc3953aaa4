//! Vision-LLM [`FeedbackModel`]: send the résumé and the prompt to a provider.
//!
//! Requests name the résumé by its *storage path*, not its bytes.
//! [`LlmFeedbackModel`] reads the file back from storage, rasterises it when
//! it is a PDF (vision APIs take images, not documents) and attaches it to a
//! single user turn carrying the prompt.
//!
//! There is no retry here: a failed call ends the review and the record
//! stays pending.

use crate::backend::{FeedbackModel, FileStorage, InferenceResponse};
use crate::config::AnalysisConfig;
use crate::error::{BackendError, ReviewError};
use crate::pipeline::encode::{encode_page, image_attachment, sniff_image_mime};
use crate::pipeline::render::PdfRenderer;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Model used when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Answers feedback requests with a vision-capable chat model.
pub struct LlmFeedbackModel {
    provider: Arc<dyn LLMProvider>,
    storage: Arc<dyn FileStorage>,
    renderer: Arc<PdfRenderer>,
    options: CompletionOptions,
}

impl fmt::Debug for LlmFeedbackModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmFeedbackModel")
            .field("provider", &"<dyn LLMProvider>")
            .field("temperature", &self.options.temperature)
            .field("max_tokens", &self.options.max_tokens)
            .finish()
    }
}

impl LlmFeedbackModel {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        storage: Arc<dyn FileStorage>,
        renderer: Arc<PdfRenderer>,
        config: &AnalysisConfig,
    ) -> Self {
        Self {
            provider,
            storage,
            renderer,
            options: build_options(config),
        }
    }

    /// Resolve the provider from `config` and the environment.
    pub fn from_config(
        config: &AnalysisConfig,
        storage: Arc<dyn FileStorage>,
        renderer: Arc<PdfRenderer>,
    ) -> Result<Self, ReviewError> {
        let provider = resolve_provider(config)?;
        info!(
            "Feedback model: provider={} model={}",
            provider.name(),
            provider.model()
        );
        Ok(Self::new(provider, storage, renderer, config))
    }

    /// Load the stored file as an image attachment.
    async fn attachment(&self, file_path: &str) -> Result<ImageData, BackendError> {
        let bytes = self.storage.read(file_path).await?;

        if bytes.starts_with(b"%PDF") {
            let page = self
                .renderer
                .render_first_page(bytes)
                .await
                .map_err(|e| BackendError::Remote(format!("cannot rasterise '{file_path}': {e}")))?;
            return encode_page(&page).map_err(|e| BackendError::Remote(e.to_string()));
        }

        match sniff_image_mime(&bytes) {
            Some(mime) => Ok(image_attachment(&bytes, mime)),
            None => Err(BackendError::Remote(format!(
                "'{file_path}' is neither a PDF nor a PNG/JPEG image"
            ))),
        }
    }
}

#[async_trait]
impl FeedbackModel for LlmFeedbackModel {
    async fn feedback(
        &self,
        file_path: &str,
        prompt: &str,
    ) -> Result<InferenceResponse, BackendError> {
        let start = Instant::now();
        let image = self.attachment(file_path).await?;
        let messages = vec![ChatMessage::user_with_images(prompt, vec![image])];

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| BackendError::Remote(e.to_string()))?;

        debug!(
            "Feedback for {}: {} input tokens, {} output tokens, {:?}",
            file_path,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        Ok(InferenceResponse::from_text(response.content))
    }
}

/// Build `CompletionOptions` from the analysis config.
fn build_options(config: &AnalysisConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Which provider to build when the config does not carry one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderChoice {
    /// A provider and model picked by name.
    Named { provider: String, model: String },
    /// Whatever [`ProviderFactory::from_env`] finds.
    AutoDetect,
}

impl ProviderChoice {
    /// Decide, from most to least specific:
    ///
    /// 1. `config.provider_name` (with `config.model` or [`DEFAULT_MODEL`]);
    /// 2. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are non-empty;
    /// 3. OpenAI whenever `OPENAI_API_KEY` is non-empty, even if other keys are set;
    /// 4. auto-detection.
    ///
    /// `env` looks up environment variables, so this stays pure.
    pub fn decide(config: &AnalysisConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let model = || config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let non_empty = |key: &str| env(key).filter(|v| !v.is_empty());

        if let Some(ref name) = config.provider_name {
            return Self::Named {
                provider: name.clone(),
                model: model(),
            };
        }
        if let (Some(provider), Some(model)) = (
            non_empty("EDGEQUAKE_LLM_PROVIDER"),
            non_empty("EDGEQUAKE_MODEL"),
        ) {
            return Self::Named { provider, model };
        }
        if non_empty("OPENAI_API_KEY").is_some() {
            return Self::Named {
                provider: "openai".to_string(),
                model: model(),
            };
        }
        Self::AutoDetect
    }
}

/// The provider for `config`: its pre-built one if set, otherwise the
/// [`ProviderChoice`] made from the process environment.
pub fn resolve_provider(config: &AnalysisConfig) -> Result<Arc<dyn LLMProvider>, ReviewError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }
    match ProviderChoice::decide(config, |key| std::env::var(key).ok()) {
        ProviderChoice::Named { provider, model } => {
            ProviderFactory::create_llm_provider(&provider, &model).map_err(|e| {
                ReviewError::ProviderNotConfigured {
                    provider,
                    hint: e.to_string(),
                }
            })
        }
        ProviderChoice::AutoDetect => ProviderFactory::from_env()
            .map(|(llm, _embedding)| llm)
            .map_err(|e| ReviewError::ProviderNotConfigured {
                provider: "auto".to_string(),
                hint: format!("set OPENAI_API_KEY or ANTHROPIC_API_KEY, or pass --provider ({e})"),
            }),
    }
}
