use std::sync::Arc;

use registration_sdk::{
    CredentialArtifact, CredentialHandle, Identifier, NewRegistration, PhotoUpload,
    RegistrationRecord,
};
use tracing::{debug, error, info, instrument, warn};

use super::error::{DomainError, RenderError};
use super::identifier::IdentifierGenerator;
use super::ports::{ArtifactCache, CredentialRenderer, PhotoStore};
use super::repo::RegistrationRepository;

// ============================================================================
// Service Configuration
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Extra identifier draws allowed when a fresh identifier is already
    /// taken. Zero skips the lookup entirely.
    pub collision_retries: u32,
}

// ============================================================================
// Service Implementation
// ============================================================================

pub struct RegistrationService {
    repo: Arc<dyn RegistrationRepository>,
    ids: Arc<dyn IdentifierGenerator>,
    renderer: Arc<dyn CredentialRenderer>,
    photos: Arc<dyn PhotoStore>,
    cache: Option<Arc<dyn ArtifactCache>>,
    config: ServiceConfig,
}

impl RegistrationService {
    pub fn new(
        repo: Arc<dyn RegistrationRepository>,
        ids: Arc<dyn IdentifierGenerator>,
        renderer: Arc<dyn CredentialRenderer>,
        photos: Arc<dyn PhotoStore>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            ids,
            renderer,
            photos,
            cache: None,
            config,
        }
    }

    #[must_use]
    pub fn with_artifact_cache(mut self, cache: Arc<dyn ArtifactCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Validate, store the photo, issue an identifier and append the record.
    ///
    /// # Errors
    ///
    /// `MissingField` for blank name or role or an absent photo; `Upload`,
    /// `Store` or `IdentifierExhausted` from the collaborators.
    #[instrument(skip(self, registration), fields(role = %registration.role.trim()))]
    pub async fn register(
        &self,
        registration: NewRegistration,
    ) -> Result<(RegistrationRecord, CredentialHandle), DomainError> {
        let NewRegistration { name, role, photo } = registration;
        let name = required_text("name", &name)?;
        let role = required_text("role", &role)?;
        let photo = required_photo(photo)?;

        let photo_ref = self.photos.store(photo).await.map_err(|e| {
            error!(error = %e, "photo upload failed");
            DomainError::from(e)
        })?;

        let identifier = self.issue_identifier().await?;
        let record = RegistrationRecord {
            name,
            role,
            identifier,
            photo_ref,
        };

        self.repo.append(&record).await.map_err(|e| {
            error!(error = %e, identifier = %record.identifier, "record append failed");
            DomainError::from(e)
        })?;

        info!(identifier = %record.identifier, "registration stored");
        let handle = CredentialHandle::for_identifier(record.identifier.clone());
        Ok((record, handle))
    }

    /// # Errors
    ///
    /// `NotFound` when no record matches; `Store` on read failure.
    #[instrument(skip(self))]
    pub async fn resolve(&self, identifier: &str) -> Result<RegistrationRecord, DomainError> {
        let found = self
            .repo
            .find_by_identifier(identifier)
            .await
            .map_err(|e| {
                error!(error = %e, "record lookup failed");
                DomainError::from(e)
            })?;

        found.ok_or_else(|| {
            warn!("no registration for identifier");
            DomainError::not_found(identifier)
        })
    }

    /// # Errors
    ///
    /// `Store` on read failure.
    pub async fn list_all(&self) -> Result<Vec<RegistrationRecord>, DomainError> {
        self.repo.list_all().await.map_err(|e| {
            error!(error = %e, "record listing failed");
            DomainError::from(e)
        })
    }

    /// Resolve and render one ID card.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Store`, or `Render`.
    #[instrument(skip(self))]
    pub async fn credential(&self, identifier: &str) -> Result<CredentialArtifact, DomainError> {
        let record = self.resolve(identifier).await?;
        let renderer = Arc::clone(&self.renderer);
        let artifact = run_render(move || renderer.render(&record)).await?;

        debug!(bytes = artifact.bytes.len(), "credential rendered");
        self.cache_artifact(&artifact).await;
        Ok(artifact)
    }

    /// Render every record into one document, one page each, store order.
    ///
    /// # Errors
    ///
    /// `Store`, or `Render` if any single card fails.
    #[instrument(skip(self))]
    pub async fn bulk_credentials(&self) -> Result<CredentialArtifact, DomainError> {
        let records = self.list_all().await?;
        let count = records.len();
        let renderer = Arc::clone(&self.renderer);
        let artifact = run_render(move || renderer.render_bulk(&records)).await?;

        info!(pages = count, bytes = artifact.bytes.len(), "bulk credentials rendered");
        self.cache_artifact(&artifact).await;
        Ok(artifact)
    }

    async fn issue_identifier(&self) -> Result<Identifier, DomainError> {
        let retries = self.config.collision_retries;
        let mut candidate = self.ids.generate();
        if retries == 0 {
            return Ok(candidate);
        }

        for attempt in 0..=retries {
            let taken = self
                .repo
                .find_by_identifier(candidate.as_str())
                .await
                .map_err(|e| {
                    error!(error = %e, "collision check failed");
                    DomainError::from(e)
                })?
                .is_some();
            if !taken {
                return Ok(candidate);
            }
            debug!(attempt, identifier = %candidate, "identifier already issued");
            if attempt < retries {
                candidate = self.ids.generate();
            }
        }

        error!(attempts = retries + 1, "identifier space exhausted");
        Err(DomainError::IdentifierExhausted {
            attempts: retries + 1,
        })
    }

    async fn cache_artifact(&self, artifact: &CredentialArtifact) {
        if let Some(cache) = &self.cache
            && let Err(e) = cache.put(artifact).await
        {
            warn!(error = %e, file = %artifact.file_name, "artifact cache write failed");
        }
    }
}

fn required_text(field: &'static str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        warn!(field, "registration rejected: field is blank");
        return Err(DomainError::missing_field(field));
    }
    Ok(trimmed.to_owned())
}

fn required_photo(photo: Option<PhotoUpload>) -> Result<PhotoUpload, DomainError> {
    match photo {
        Some(p) if !p.bytes.is_empty() => Ok(p),
        _ => {
            warn!(field = "photo", "registration rejected: no photo attached");
            Err(DomainError::missing_field("photo"))
        }
    }
}

async fn run_render<F>(job: F) -> Result<CredentialArtifact, DomainError>
where
    F: FnOnce() -> Result<CredentialArtifact, RenderError> + Send + 'static,
{
    let rendered = tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| RenderError::Finalize(format!("render task failed: {e}")))?;
    rendered.map_err(|e| {
        error!(error = %e, "credential rendering failed");
        DomainError::from(e)
    })
}
