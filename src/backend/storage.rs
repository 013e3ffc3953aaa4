//! Directory-backed [`FileStorage`].
//!
//! Each upload lands in its own random sub-directory so two résumés named
//! `cv.pdf` never collide; the returned path is relative to the storage root
//! and is the only handle callers keep.

use super::FileStorage;
use crate::error::BackendError;
use crate::record::NamedFile;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Stores files under a root directory on the local file system.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a storage path to a file under the root, refusing anything
    /// that would escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, BackendError> {
        let rel = Path::new(path);
        let safe = !path.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(BackendError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

/// Reduce an uploaded file name to a single safe path component.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn upload(&self, file: &NamedFile) -> Result<String, BackendError> {
        let path = format!(
            "{}/{}",
            Uuid::new_v4().simple(),
            sanitize_file_name(&file.name)
        );
        let dest = self.resolve(&path)?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| BackendError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&dest, &file.bytes)
            .await
            .map_err(|source| BackendError::Io {
                path: dest.clone(),
                source,
            })?;

        debug!("Stored {} ({} bytes) at {}", file.name, file.bytes.len(), path);
        Ok(path)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        let src = self.resolve(path)?;
        match tokio::fs::read(&src).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BackendError::NotFound(path.to_string()))
            }
            Err(source) => Err(BackendError::Io { path: src, source }),
        }
    }
}
