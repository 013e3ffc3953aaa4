//! Configuration types for résumé analysis.
//!
//! Everything that shapes a run (render scale, model choice, sampling,
//! progress reporting) lives in [`AnalysisConfig`], built via
//! [`AnalysisConfigBuilder`]. Backends are not part of the config: they are
//! handed to [`crate::Analyzer::new`] directly because they own connections
//! and state, not knobs.

use crate::error::ReviewError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Scale factor applied to the first page's viewport before rasterising.
pub const DEFAULT_RENDER_SCALE: f32 = 4.0;

/// Configuration for a résumé analysis.
///
/// # Example
/// ```rust
/// use resume_review::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .render_scale(4.0)
///     .model("gpt-4.1-mini")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Upscale factor for the preview render. Range: 0.5–8.0. Default: 4.0.
    ///
    /// A US-letter page is 612 × 792 pt, so 4× yields a 2448 × 3168 px image:
    /// sharp enough for a vision model to read 9 pt body text.
    pub render_scale: f32,

    /// Longest edge of the rendered image in pixels. Default: 6000.
    ///
    /// Caps oversized pages (posters, A0 CVs) so a single render cannot
    /// allocate hundreds of megabytes.
    pub max_rendered_pixels: u32,

    /// LLM model identifier, e.g. "gpt-4.1-mini", "claude-sonnet-4-20250514".
    /// If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the feedback completion. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    ///
    /// A complete feedback object with five categories of tips runs to
    /// roughly 1 500 tokens; the headroom keeps long explanations intact.
    pub max_tokens: usize,

    /// Custom instruction template. `{job_title}` and `{job_description}` are
    /// substituted. If None, uses [`crate::prompts::prepare_instructions`].
    pub instructions: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Receives a status update at every stage of the run.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            render_scale: DEFAULT_RENDER_SCALE,
            max_rendered_pixels: 6000,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 4096,
            instructions: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("render_scale", &self.render_scale)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("instructions", &self.instructions.as_ref().map(|s| s.len()))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn AnalysisProgressCallback>"),
            )
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn instructions(mut self, template: impl Into<String>) -> Self {
        self.config.instructions = Some(template.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, ReviewError> {
        let c = &self.config;
        if !(0.5..=8.0).contains(&c.render_scale) {
            return Err(ReviewError::InvalidConfig(format!(
                "Render scale must be 0.5–8.0, got {}",
                c.render_scale
            )));
        }
        if c.max_tokens == 0 {
            return Err(ReviewError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
