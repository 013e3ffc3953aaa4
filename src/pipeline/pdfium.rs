//! Locate and bind the pdfium shared library.
//!
//! Resolution order (first hit wins):
//!
//! 1. `PDFIUM_LIB_PATH` — an existing library file.
//! 2. The per-version cache directory (see [`pdfium_cache_dir`]).
//! 3. The system library search path (`libpdfium.so` / `.dylib` / `pdfium.dll`).
//! 4. A one-time download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries)
//!    into the cache directory. Set `PDFIUM_NO_DOWNLOAD=1` to forbid it.
//!
//! Everything here blocks; call it from `spawn_blocking`.

use crate::error::ReviewError;
use pdfium_render::prelude::Pdfium;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// The pdfium-binaries release tag used for downloads.
pub const PDFIUM_VERSION: &str = "7690";

const BASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Where the library sits for one OS/architecture pair.
struct PlatformArchive {
    /// Asset filename in the GitHub release.
    archive: &'static str,
    /// Path of the library inside the archive.
    member: &'static str,
    /// Filename on disk.
    lib_name: &'static str,
}

fn platform_archive() -> Result<PlatformArchive, ReviewError> {
    let (archive, member, lib_name) = match (std::env::consts::OS, std::env::consts::ARCH) {
        ("macos", "aarch64") => ("pdfium-mac-arm64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib"),
        ("macos", "x86_64") => ("pdfium-mac-x64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib"),
        ("linux", "x86_64") => ("pdfium-linux-x64.tgz", "lib/libpdfium.so", "libpdfium.so"),
        ("linux", "aarch64") => ("pdfium-linux-arm64.tgz", "lib/libpdfium.so", "libpdfium.so"),
        ("windows", "x86_64") => ("pdfium-win-x64.tgz", "bin/pdfium.dll", "pdfium.dll"),
        ("windows", "aarch64") => ("pdfium-win-arm64.tgz", "bin/pdfium.dll", "pdfium.dll"),
        (os, arch) => {
            return Err(ReviewError::PdfiumBindingFailed(format!(
                "no prebuilt pdfium for {os}/{arch}; set PDFIUM_LIB_PATH"
            )))
        }
    };
    Ok(PlatformArchive {
        archive,
        member,
        lib_name,
    })
}

/// Per-version cache directory for the downloaded library.
///
/// `$PDFIUM_AUTO_CACHE_DIR/pdfium-{VERSION}` when set, otherwise
/// `<platform cache dir>/resume-review/pdfium-{VERSION}`.
pub fn pdfium_cache_dir() -> PathBuf {
    let versioned = format!("pdfium-{PDFIUM_VERSION}");
    if let Ok(dir) = std::env::var("PDFIUM_AUTO_CACHE_DIR") {
        return PathBuf::from(dir).join(versioned);
    }
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("resume-review")
        .join(versioned)
}

/// `true` if binding will not need the network.
pub fn is_pdfium_available_offline() -> bool {
    if let Ok(p) = std::env::var("PDFIUM_LIB_PATH") {
        return Path::new(&p).exists();
    }
    platform_archive()
        .map(|info| pdfium_cache_dir().join(info.lib_name).exists())
        .unwrap_or(false)
}

/// Bind to pdfium, downloading it on first use if needed.
pub fn bind_pdfium() -> Result<Pdfium, ReviewError> {
    if let Ok(p) = std::env::var("PDFIUM_LIB_PATH") {
        let path = PathBuf::from(p);
        if path.exists() {
            return bind_at(&path);
        }
        warn!("PDFIUM_LIB_PATH '{}' does not exist; ignoring", path.display());
    }

    let info = platform_archive()?;
    let cached = pdfium_cache_dir().join(info.lib_name);
    if cached.exists() {
        return bind_at(&cached);
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => {
            debug!("Bound pdfium from the system library path");
            return Ok(Pdfium::new(bindings));
        }
        Err(e) => debug!("No system pdfium: {e:?}"),
    }

    if std::env::var_os("PDFIUM_NO_DOWNLOAD").is_some() {
        return Err(ReviewError::PdfiumBindingFailed(
            "pdfium not found and PDFIUM_NO_DOWNLOAD is set".into(),
        ));
    }

    let url = format!("{BASE_URL}/chromium%2F{PDFIUM_VERSION}/{}", info.archive);
    info!("Downloading pdfium {} from {}", PDFIUM_VERSION, url);
    let archive = download(&url)?;
    extract_member(&archive, info.member, &cached)?;
    info!("Cached pdfium at {}", cached.display());

    bind_at(&cached)
}

fn bind_at(path: &Path) -> Result<Pdfium, ReviewError> {
    debug!("Binding pdfium from {}", path.display());
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| ReviewError::PdfiumBindingFailed(format!("{}: {e}", path.display())))
}

fn download(url: &str) -> Result<Vec<u8>, ReviewError> {
    let fail = |reason: String| ReviewError::PdfiumBindingFailed(format!("download {url}: {reason}"));

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("resume-review/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(600))
        .build()
        .map_err(|e| fail(e.to_string()))?;

    let response = client.get(url).send().map_err(|e| fail(e.to_string()))?;
    if !response.status().is_success() {
        return Err(fail(format!("HTTP {}", response.status())));
    }
    let bytes = response.bytes().map_err(|e| fail(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Unpack `member` from a gzipped tarball to `dest`, via a temp name so a
/// half-written library is never picked up from the cache.
fn extract_member(archive: &[u8], member: &str, dest: &Path) -> Result<(), ReviewError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let fail = |reason: String| ReviewError::PdfiumBindingFailed(format!("extract {member}: {reason}"));

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
    }

    let mut tarball = Archive::new(GzDecoder::new(archive));
    let entries = tarball.entries().map_err(|e| fail(e.to_string()))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| fail(e.to_string()))?;
        let is_member = entry
            .path()
            .map(|p| p.to_string_lossy() == member)
            .unwrap_or(false);
        if !is_member {
            continue;
        }
        let tmp = dest.with_extension("partial");
        entry.unpack(&tmp).map_err(|e| fail(e.to_string()))?;
        std::fs::rename(&tmp, dest).map_err(|e| fail(e.to_string()))?;
        return Ok(());
    }

    Err(fail("not present in archive".into()))
}
