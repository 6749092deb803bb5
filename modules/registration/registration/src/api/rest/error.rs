use registrar_errors::{Problem, bad_request, internal_error, not_found};

use crate::domain::error::{DomainError, RenderError, StoreError};

/// HTTP operation a problem is reported for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Register,
    DownloadCard,
    BulkCards,
    Attendance,
}

impl Operation {
    #[must_use]
    pub const fn instance(self) -> &'static str {
        match self {
            Self::Register => super::routes::REGISTER_PATH,
            Self::DownloadCard => super::routes::DOWNLOAD_PATH,
            Self::BulkCards => super::routes::BULK_PATH,
            Self::Attendance => super::routes::ATTENDANCE_PATH,
        }
    }

    /// Client-facing detail for 5xx responses.
    #[must_use]
    pub const fn failure_detail(self) -> &'static str {
        match self {
            Self::Register => "Error saving registration data",
            Self::DownloadCard => "Error generating ID card",
            Self::BulkCards => "Error generating bulk ID cards",
            Self::Attendance => "Error recording attendance",
        }
    }
}

/// Map a domain error to an RFC 9457 Problem.
///
/// 5xx problems carry only a fixed per-operation detail; the cause has already
/// been logged where it was detected.
pub fn domain_error_to_problem(e: &DomainError, op: Operation) -> Problem {
    let problem = match e {
        DomainError::MissingField { field } => {
            bad_request(format!("Missing required field: {field}"))
                .with_code("registration.missing_field")
                .with_violation(*field, "is required")
        }
        DomainError::NotFound { .. } => not_found("ID not found").with_code("registration.not_found"),
        other => internal_error(op.failure_detail()).with_code(internal_code(other)),
    };
    problem.with_instance(op.instance())
}

fn internal_code(e: &DomainError) -> &'static str {
    match e {
        DomainError::Store(StoreError::Unavailable(_)) => "registration.store_unavailable",
        DomainError::Store(StoreError::Rejected(_)) => "registration.store_rejected",
        DomainError::Render(RenderError::MissingTemplate { .. }) => "registration.template_missing",
        DomainError::Render(RenderError::InvalidTemplate { .. }) => "registration.template_invalid",
        DomainError::Render(RenderError::EncodingFailed { .. }) => "registration.encoding_failed",
        DomainError::Render(RenderError::Finalize(_)) => "registration.render_failed",
        DomainError::Upload(_) => "registration.upload_failed",
        DomainError::IdentifierExhausted { .. } => "registration.identifier_exhausted",
        DomainError::MissingField { .. } | DomainError::NotFound { .. } => "registration.internal",
    }
}

/// 400 for a request body the extractors could not read.
pub fn malformed_body(detail: impl Into<String>, op: Operation) -> Problem {
    bad_request(detail)
        .with_code("registration.invalid_body")
        .with_instance(op.instance())
}
