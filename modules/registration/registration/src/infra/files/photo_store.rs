use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use registration_sdk::PhotoUpload;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use crate::domain::error::PhotoStoreError;
use crate::domain::ports::PhotoStore;

/// Writes uploads to `{upload_dir}/{unix_millis}-{file_name}`.
///
/// Files are created exclusively. When that name is taken (same name in the
/// same millisecond) a counter goes in front of the file name:
/// `{unix_millis}-{n}-{file_name}`. The returned reference is that path, which is what lands in the sheet's
/// photo column.
#[derive(Debug, Clone)]
pub struct LocalPhotoStore {
    upload_dir: PathBuf,
}

impl LocalPhotoStore {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }
}

#[async_trait]
impl PhotoStore for LocalPhotoStore {
    #[instrument(skip(self, photo), fields(file_name = %photo.file_name, bytes = photo.bytes.len()))]
    async fn store(&self, photo: PhotoUpload) -> Result<String, PhotoStoreError> {
        let fail = |source| PhotoStoreError {
            file_name: photo.file_name.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(fail)?;

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let (path, mut file) =
            create_unique(&self.upload_dir, millis, &sanitize_file_name(&photo.file_name))
                .await
                .map_err(fail)?;

        file.write_all(&photo.bytes).await.map_err(fail)?;
        file.flush().await.map_err(fail)?;
        debug!(path = %path.display(), "photo stored");
        Ok(path.to_string_lossy().into_owned())
    }
}

const MAX_NAME_ATTEMPTS: u32 = 64;

async fn create_unique(dir: &Path, millis: u128, name: &str) -> std::io::Result<(PathBuf, File)> {
    let mut attempt = 0;
    loop {
        let path = if attempt == 0 {
            dir.join(format!("{millis}-{name}"))
        } else {
            dir.join(format!("{millis}-{attempt}-{name}"))
        };
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Last path component with everything outside `[A-Za-z0-9._-]` dropped.
#[must_use]
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "photo".to_owned()
    } else {
        cleaned
    }
}
