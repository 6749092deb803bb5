use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Router};

use super::handlers;
use crate::domain::attendance::AttendanceVerifier;
use crate::domain::service::RegistrationService;

pub const REGISTER_PATH: &str = "/register";
pub const DOWNLOAD_PATH: &str = "/download-id/{id}";
pub const BULK_PATH: &str = "/generate-bulk-id-cards";
pub const ATTENDANCE_PATH: &str = "/attendance";

/// Mount the registration endpoints onto `router`.
pub fn register_routes(
    router: Router,
    service: Arc<RegistrationService>,
    verifier: Arc<AttendanceVerifier>,
) -> Router {
    let routes = Router::new()
        .route(REGISTER_PATH, post(handlers::register))
        .route(DOWNLOAD_PATH, get(handlers::download_id))
        .route(BULK_PATH, get(handlers::bulk_id_cards))
        .route(ATTENDANCE_PATH, post(handlers::attendance))
        .layer(Extension(service))
        .layer(Extension(verifier));

    router.merge(routes)
}
