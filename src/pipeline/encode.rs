//! Image encoding: `DynamicImage` → PNG bytes, and stored images → `ImageData`.
//!
//! The preview is stored as PNG because it is lossless: JPEG artefacts around
//! rendered glyphs make small print harder for a vision model to read.
//! `detail: "high"` asks GPT-4-class models to tile the full image instead of
//! looking at a single 512 px overview, which would lose bullet-level text.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = b"\xff\xd8\xff";

/// PNG-encode a rendered page.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} image → {} bytes PNG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

/// Encode a rendered page as a base64 PNG attachment for the vision API.
pub fn encode_page(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    Ok(image_attachment(&encode_png(img)?, "image/png"))
}

/// Wrap already-encoded image bytes as an attachment.
pub fn image_attachment(bytes: &[u8], mime_type: &str) -> ImageData {
    ImageData::new(STANDARD.encode(bytes), mime_type).with_detail("high")
}

/// MIME type of an encoded image, sniffed from its magic bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(PNG_MAGIC) {
        Some("image/png")
    } else if bytes.starts_with(JPEG_MAGIC) {
        Some("image/jpeg")
    } else {
        None
    }
}
