//! PDF rasterisation: render the first page of a résumé to a PNG preview.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is CPU-bound and
//! synchronous. `tokio::task::spawn_blocking` moves each render onto the
//! blocking pool so Tokio worker threads never stall on it.
//!
//! ## Why a lazily bound library?
//!
//! Binding pdfium may involve a download on first use. [`PdfRenderer`] keeps
//! the binding in a [`LazyLibrary`], so it happens on the first conversion
//! only, and concurrent first conversions wait for that single bind.
//!
//! ## Why cap pixels as well as scale?
//!
//! The preview is rendered at a fixed scale (4× by default), but page sizes
//! vary: a 4× A0 page would be 13,000 px tall. `max_rendered_pixels` caps
//! the longest edge so one odd upload cannot exhaust memory.

use crate::config::AnalysisConfig;
use crate::error::ReviewError;
use crate::pipeline::encode::encode_png;
use crate::pipeline::library::LazyLibrary;
use crate::pipeline::pdfium::bind_pdfium;
use crate::record::{png_name_for, ConversionResult, NamedFile};
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Turns an uploaded PDF into the preview image stored next to it.
///
/// Never fails outright: problems are reported in
/// [`ConversionResult::error`].
#[async_trait]
pub trait PdfConverter: Send + Sync {
    async fn convert_to_image(&self, file: &NamedFile) -> ConversionResult;
}

/// Why a single render failed. Folded into [`ConversionResult::error`].
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("not a PDF (first bytes {0:?})")]
    NotAPdf(Vec<u8>),

    #[error("PDF engine unavailable: {0}")]
    Library(#[source] ReviewError),

    #[error("could not open document: {0}")]
    Load(String),

    #[error("document has no pages")]
    NoPages,

    #[error("could not rasterise page 1: {0}")]
    Rasterise(String),

    #[error("could not encode PNG: {0}")]
    Encode(#[from] image::ImageError),

    #[error("render task panicked: {0}")]
    Task(String),
}

/// pdfium-backed [`PdfConverter`].
#[derive(Debug)]
pub struct PdfRenderer {
    library: LazyLibrary<Pdfium, ReviewError>,
    scale: f32,
    max_pixels: u32,
}

impl PdfRenderer {
    pub fn new(scale: f32, max_pixels: u32) -> Self {
        Self {
            library: LazyLibrary::new(|| async {
                tokio::task::spawn_blocking(bind_pdfium)
                    .await
                    .map_err(|e| ReviewError::Internal(format!("pdfium bind task panicked: {e}")))?
            }),
            scale,
            max_pixels,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.render_scale, config.max_rendered_pixels)
    }

    /// Whether pdfium has been bound yet.
    pub fn is_library_loaded(&self) -> bool {
        self.library.is_loaded()
    }

    /// Rasterise page 1 of `pdf`.
    pub async fn render_first_page(&self, pdf: Vec<u8>) -> Result<DynamicImage, RenderError> {
        if !pdf.starts_with(b"%PDF") {
            return Err(RenderError::NotAPdf(pdf.iter().take(4).copied().collect()));
        }

        let pdfium = self.library.get().await.map_err(RenderError::Library)?;
        let scale = self.scale;
        let max_pixels = self.max_pixels;

        tokio::task::spawn_blocking(move || render_first_page_blocking(&pdfium, &pdf, scale, max_pixels))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))?
    }

    async fn render_preview(&self, file: &NamedFile) -> Result<NamedFile, RenderError> {
        let image = self.render_first_page(file.bytes.clone()).await?;
        let png = encode_png(&image)?;
        Ok(NamedFile::png(png_name_for(&file.name), png))
    }
}

#[async_trait]
impl PdfConverter for PdfRenderer {
    async fn convert_to_image(&self, file: &NamedFile) -> ConversionResult {
        match self.render_preview(file).await {
            Ok(preview) => {
                info!("Rendered preview {} ({} bytes)", preview.name, preview.bytes.len());
                ConversionResult::success(preview)
            }
            Err(e) => {
                warn!("Could not render {}: {}", file.name, e);
                ConversionResult::failure(e)
            }
        }
    }
}

/// pdfium takes pixel limits as `i32`; anything larger saturates.
fn pixel_limit(max_pixels: u32) -> i32 {
    i32::try_from(max_pixels).unwrap_or(i32::MAX)
}

fn render_first_page_blocking(
    pdfium: &Pdfium,
    pdf: &[u8],
    scale: f32,
    max_pixels: u32,
) -> Result<DynamicImage, RenderError> {
    let document = pdfium
        .load_pdf_from_byte_slice(pdf, None)
        .map_err(|e| RenderError::Load(format!("{e:?}")))?;

    let pages = document.pages();
    if pages.len() == 0 {
        return Err(RenderError::NoPages);
    }
    debug!("PDF loaded: {} pages, rendering page 1", pages.len());

    let page = pages
        .get(0)
        .map_err(|e| RenderError::Rasterise(format!("{e:?}")))?;

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(scale)
        .set_maximum_width(pixel_limit(max_pixels))
        .set_maximum_height(pixel_limit(max_pixels));

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| RenderError::Rasterise(format!("{e:?}")))?;

    let image = bitmap.as_image();
    debug!("Rendered page 1 → {}x{} px", image.width(), image.height());
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_pdf_fails_without_binding_pdfium() {
        let renderer = PdfRenderer::new(4.0, 6000);
        let result = renderer
            .convert_to_image(&NamedFile::pdf("cv.pdf", b"hello world".to_vec()))
            .await;

        assert!(result.file.is_none());
        assert!(result.image_url.is_empty());
        let error = result.error.unwrap();
        assert!(error.starts_with("Failed to convert PDF:"), "got: {error}");
        assert!(error.contains("not a PDF"), "got: {error}");
        assert!(!renderer.is_library_loaded());
    }

    #[test]
    fn pixel_limit_saturates_instead_of_wrapping() {
        assert_eq!(pixel_limit(6000), 6000);
        assert_eq!(pixel_limit(i32::MAX as u32), i32::MAX);
        assert_eq!(pixel_limit(u32::MAX), i32::MAX);
    }

    #[tokio::test]
    async fn empty_file_is_not_a_pdf() {
        let renderer = PdfRenderer::new(4.0, 6000);
        let err = renderer.render_first_page(Vec::new()).await.unwrap_err();
        assert!(matches!(err, RenderError::NotAPdf(ref magic) if magic.is_empty()));
    }
}
