//! Composition root: wires config into repositories, renderer and routes.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use registration_sdk::RegistrationClientV1;
use sheets_client::{
    ServiceAccountKey, ServiceAccountTokenProvider, SheetsClient, SheetsClientConfig,
};
use tracing::info;

use crate::api::rest::routes;
use crate::config::{RegistrationConfig, SheetsStoreConfig, StoreConfig};
use crate::domain::attendance::AttendanceVerifier;
use crate::domain::identifier::RandomIdentifierGenerator;
use crate::domain::repo::RegistrationRepository;
use crate::domain::service::{RegistrationService, ServiceConfig};
use crate::infra::files::{DirectoryArtifactCache, LocalPhotoStore};
use crate::infra::render::PdfCredentialRenderer;
use crate::infra::storage::{InMemoryRegistrationRepository, SheetsRegistrationRepository};
use crate::local_client::RegistrationLocalClient;

pub struct RegistrationModule {
    service: Arc<RegistrationService>,
    verifier: Arc<AttendanceVerifier>,
}

impl RegistrationModule {
    /// Build the module from configuration.
    ///
    /// # Errors
    ///
    /// Fails when the Sheets store is selected and its key file or client
    /// settings are unusable.
    pub fn from_config(cfg: &RegistrationConfig) -> anyhow::Result<Self> {
        let repo = build_repository(&cfg.store)?;
        let renderer = PdfCredentialRenderer::new(&cfg.template_path);
        if !renderer.template_path().exists() {
            tracing::warn!(
                path = %renderer.template_path().display(),
                "card template not found; ID card downloads will fail until it exists"
            );
        }

        let mut service = RegistrationService::new(
            repo,
            Arc::new(RandomIdentifierGenerator),
            Arc::new(renderer),
            Arc::new(LocalPhotoStore::new(&cfg.upload_dir)),
            ServiceConfig {
                collision_retries: cfg.collision_retries,
            },
        );
        if let Some(dir) = &cfg.artifact_cache_dir {
            info!(dir = %dir.display(), "artifact cache enabled");
            service = service.with_artifact_cache(Arc::new(DirectoryArtifactCache::new(dir)));
        }

        Ok(Self::new(Arc::new(service)))
    }

    pub fn new(service: Arc<RegistrationService>) -> Self {
        let verifier = Arc::new(AttendanceVerifier::new(Arc::clone(&service)));
        Self { service, verifier }
    }

    #[must_use]
    pub fn service(&self) -> Arc<RegistrationService> {
        Arc::clone(&self.service)
    }

    /// Registration endpoints, ready to be merged into the server router.
    #[must_use]
    pub fn router(&self) -> Router {
        routes::register_routes(Router::new(), self.service(), Arc::clone(&self.verifier))
    }

    #[must_use]
    pub fn client(&self) -> Arc<dyn RegistrationClientV1> {
        Arc::new(RegistrationLocalClient::new(
            self.service(),
            Arc::clone(&self.verifier),
        ))
    }
}

fn build_repository(store: &StoreConfig) -> anyhow::Result<Arc<dyn RegistrationRepository>> {
    match store {
        StoreConfig::Memory => {
            info!("using in-memory registration store; records are lost on restart");
            Ok(Arc::new(InMemoryRegistrationRepository::new()))
        }
        StoreConfig::Sheets(sheets) => Ok(Arc::new(build_sheets_repository(sheets)?)),
    }
}

/// # Errors
///
/// Fails if the key file cannot be read or the client config is invalid.
pub fn build_sheets_repository(
    cfg: &SheetsStoreConfig,
) -> anyhow::Result<SheetsRegistrationRepository> {
    let timeout = Duration::from_secs(cfg.timeout_secs);
    let key = ServiceAccountKey::from_file(&cfg.credentials_path).with_context(|| {
        format!(
            "loading service account key from '{}'",
            cfg.credentials_path.display()
        )
    })?;
    let client_email = key.client_email.clone();
    let tokens = ServiceAccountTokenProvider::new(key, timeout)?;

    let client_cfg = SheetsClientConfig::new(cfg.spreadsheet_id.clone())?
        .with_base_url(cfg.base_url.clone())
        .with_timeout(timeout);
    let client = SheetsClient::new(client_cfg, Arc::new(tokens))?;

    info!(
        spreadsheet_id = %cfg.spreadsheet_id,
        sheet = %cfg.sheet_name,
        service_account = %client_email,
        "using Google Sheets registration store"
    );
    Ok(SheetsRegistrationRepository::new(client, cfg.sheet_name.clone())
        .with_header_rows(cfg.header_rows))
}
