use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Multipart, Path};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use registrar_errors::{Problem, internal_error};
use registration_sdk::{CredentialArtifact, NewRegistration, PhotoUpload};
use tracing::{debug, instrument};

use super::dto::{AttendanceRequest, AttendanceResponse, RegisterResponse};
use super::error::{Operation, domain_error_to_problem, malformed_body};
use crate::domain::attendance::AttendanceVerifier;
use crate::domain::error::DomainError;
use crate::domain::service::RegistrationService;

pub type ApiResult<T> = Result<T, Problem>;

#[instrument(skip_all)]
pub async fn register(
    Extension(svc): Extension<Arc<RegistrationService>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<RegisterResponse>> {
    let multipart = multipart.map_err(|e| malformed_body(e.body_text(), Operation::Register))?;
    let registration = read_registration_form(multipart).await?;

    let (_, handle) = svc
        .register(registration)
        .await
        .map_err(|e| domain_error_to_problem(&e, Operation::Register))?;
    Ok(Json(handle.into()))
}

#[instrument(skip_all, fields(id = %id))]
pub async fn download_id(
    Extension(svc): Extension<Arc<RegistrationService>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let artifact = svc
        .credential(&id)
        .await
        .map_err(|e| domain_error_to_problem(&e, Operation::DownloadCard))?;
    pdf_attachment(artifact, Operation::DownloadCard)
}

#[instrument(skip_all)]
pub async fn bulk_id_cards(
    Extension(svc): Extension<Arc<RegistrationService>>,
) -> ApiResult<Response> {
    let artifact = svc
        .bulk_credentials()
        .await
        .map_err(|e| domain_error_to_problem(&e, Operation::BulkCards))?;
    pdf_attachment(artifact, Operation::BulkCards)
}

#[instrument(skip_all)]
pub async fn attendance(
    Extension(verifier): Extension<Arc<AttendanceVerifier>>,
    body: Result<Json<AttendanceRequest>, JsonRejection>,
) -> ApiResult<Json<AttendanceResponse>> {
    let Json(req) = body.map_err(|e| malformed_body(e.body_text(), Operation::Attendance))?;
    let identifier = req.id_number.into_string();

    let result = verifier
        .verify(&identifier)
        .await
        .map_err(|e| domain_error_to_problem(&e, Operation::Attendance))?;

    match result.name {
        Some(name) if result.present => Ok(Json(AttendanceResponse::recorded_for(&name))),
        _ => Err(domain_error_to_problem(
            &DomainError::not_found(identifier),
            Operation::Attendance,
        )),
    }
}

/// Collect `name`, `role` (or its older alias `position`) and the `photo`
/// file part. Unknown parts are ignored.
async fn read_registration_form(mut multipart: Multipart) -> ApiResult<NewRegistration> {
    let mut name = String::new();
    let mut role = None;
    let mut position = None;
    let mut photo = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| form_problem(&e))? {
        let field_name = field.name().unwrap_or_default().to_owned();
        match field_name.as_str() {
            "name" => name = field.text().await.map_err(|e| form_problem(&e))?,
            "role" => role = Some(field.text().await.map_err(|e| form_problem(&e))?),
            "position" => position = Some(field.text().await.map_err(|e| form_problem(&e))?),
            "photo" if field.file_name().is_some() => photo = Some(read_photo(field).await?),
            "photo" => debug!("ignoring photo part without a file name"),
            other => debug!(field = other, "ignoring unknown form field"),
        }
    }

    Ok(NewRegistration {
        name,
        role: role.or(position).unwrap_or_default(),
        photo,
    })
}

async fn read_photo(field: Field<'_>) -> ApiResult<PhotoUpload> {
    let file_name = field.file_name().unwrap_or_default().to_owned();
    let content_type = field.content_type().map(str::to_owned);
    let bytes = field.bytes().await.map_err(|e| form_problem(&e))?;
    Ok(PhotoUpload {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    })
}

fn form_problem(e: &MultipartError) -> Problem {
    Problem::new(e.status(), "Invalid multipart body", e.body_text())
        .with_code("registration.invalid_form")
        .with_instance(Operation::Register.instance())
}

fn pdf_attachment(artifact: CredentialArtifact, op: Operation) -> ApiResult<Response> {
    let disposition =
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", artifact.file_name))
            .map_err(|_| {
                tracing::error!(file = %artifact.file_name, "file name not valid in a header");
                internal_error(op.failure_detail()).with_instance(op.instance())
            })?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(artifact.content_type),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}
