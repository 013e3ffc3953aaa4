//! Input resolution: turn a user-supplied path or URL into an in-memory PDF.
//!
//! The whole résumé is held in memory: it is uploaded as-is and pdfium reads
//! it from a byte slice, so nothing needs a path on disk. The `%PDF` magic is
//! checked here so a wrong file fails before anything is uploaded.

use crate::error::ReviewError;
use crate::record::NamedFile;
use std::path::PathBuf;
use tracing::{debug, info};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a PDF file.
///
/// URLs are downloaded (bounded by `timeout_secs`); anything else is read
/// from the local file system.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<NamedFile, ReviewError> {
    let file = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };
    ensure_pdf(&file)?;
    Ok(file)
}

fn ensure_pdf(file: &NamedFile) -> Result<(), ReviewError> {
    if file.looks_like_pdf() {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = file.bytes.len().min(4);
    magic[..n].copy_from_slice(&file.bytes[..n]);
    Err(ReviewError::NotAPdf {
        name: file.name.clone(),
        magic,
    })
}

async fn read_local(path_str: &str) -> Result<NamedFile, ReviewError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ReviewError::PermissionDenied { path });
        }
        Err(_) => return Err(ReviewError::FileNotFound { path }),
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume.pdf".to_string());

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(NamedFile::pdf(name, bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<NamedFile, ReviewError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ReviewError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ReviewError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ReviewError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ReviewError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ReviewError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(NamedFile::pdf(extract_filename(url), bytes.to_vec()))
}

/// A file name for a downloaded résumé: the last URL path segment when it
/// looks like a file name, else `resume.pdf`.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "resume.pdf".to_string()
}
