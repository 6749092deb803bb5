//! Collaborators the service reaches through narrow traits.

use async_trait::async_trait;
use registration_sdk::{CredentialArtifact, PhotoUpload, RegistrationRecord};

use super::error::{PhotoStoreError, RenderError};

/// Turns records into printable ID-card documents.
///
/// Rendering is CPU-bound; callers run it on the blocking pool.
pub trait CredentialRenderer: Send + Sync {
    /// One card as a single-page document.
    ///
    /// # Errors
    ///
    /// Template, QR encoding, or serialization failures.
    fn render(&self, record: &RegistrationRecord) -> Result<CredentialArtifact, RenderError>;

    /// One page per record, in input order. Any failure aborts the whole
    /// document.
    ///
    /// # Errors
    ///
    /// Template, QR encoding, or serialization failures.
    fn render_bulk(
        &self,
        records: &[RegistrationRecord],
    ) -> Result<CredentialArtifact, RenderError>;
}

/// Persists uploaded photos and hands back an opaque reference.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn store(&self, photo: PhotoUpload) -> Result<String, PhotoStoreError>;
}

/// Non-authoritative copy of rendered documents.
#[async_trait]
pub trait ArtifactCache: Send + Sync {
    async fn put(&self, artifact: &CredentialArtifact) -> std::io::Result<()>;
}
