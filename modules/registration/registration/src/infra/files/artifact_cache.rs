use std::path::{Path, PathBuf};

use async_trait::async_trait;
use registration_sdk::CredentialArtifact;
use tracing::debug;

use crate::domain::ports::ArtifactCache;

/// Keeps the latest copy of each rendered document in a directory.
///
/// Files are overwritten on every render and never read back.
#[derive(Debug, Clone)]
pub struct DirectoryArtifactCache {
    dir: PathBuf,
}

impl DirectoryArtifactCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactCache for DirectoryArtifactCache {
    async fn put(&self, artifact: &CredentialArtifact) -> std::io::Result<()> {
        let file_name = Path::new(&artifact.file_name).file_name().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("unusable artifact file name '{}'", artifact.file_name),
            )
        })?;
        let path = self.dir.join(file_name);

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, &artifact.bytes).await?;
        debug!(path = %path.display(), "artifact cached");
        Ok(())
    }
}
