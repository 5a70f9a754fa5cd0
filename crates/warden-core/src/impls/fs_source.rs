//! FsArtifactSource - source handle をルートディレクトリ相対のパスとして解決

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::ports::{ArtifactSource, SourceError};

#[derive(Debug, Clone)]
pub struct FsArtifactSource {
    root: PathBuf,
}

impl FsArtifactSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a handle to a path under `root`, rejecting anything that escapes it.
    fn resolve_path(&self, handle: &str) -> Result<PathBuf, SourceError> {
        let relative = Path::new(handle);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if handle.is_empty() || escapes {
            return Err(SourceError::InvalidHandle(handle.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ArtifactSource for FsArtifactSource {
    async fn resolve_bytes(&self, source_handle: &str) -> Result<Vec<u8>, SourceError> {
        let path = self.resolve_path(source_handle)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SourceError::NotFound(source_handle.to_string()))
            }
            Err(source) => Err(SourceError::Unreadable {
                handle: source_handle.to_string(),
                source,
            }),
        }
    }
}
