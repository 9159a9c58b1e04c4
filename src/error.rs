use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::collaborators::CollaboratorError;

// key: billing-errors -> engine failures surfaced to the operator

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("invalid enrollment date: {}", .value.as_deref().unwrap_or("<missing>"))]
    InvalidEnrollmentDate { value: Option<String> },
    #[error("billing period {index} is outside the supported calendar range")]
    PeriodOutOfRange { index: u32 },
    #[error("enrollment fee for registration {registration_id} has not been paid")]
    EnrollmentNotPaid { registration_id: String },
    #[error("billing period {index} is unavailable: {reason}")]
    PeriodUnavailable {
        index: u32,
        reason: PeriodUnavailableReason,
    },
    #[error("registration {0} not found")]
    RegistrationNotFound(String),
    #[error(transparent)]
    Remote(#[from] CollaboratorError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnavailableReason {
    AlreadyPaid,
    BeforeRegistration,
}

impl std::fmt::Display for PeriodUnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodUnavailableReason::AlreadyPaid => f.write_str("already paid"),
            PeriodUnavailableReason::BeforeRegistration => f.write_str("before registration"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Billing(#[from] BillingError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error("not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Billing(err) => match err {
                BillingError::InvalidEnrollmentDate { .. } | BillingError::PeriodOutOfRange { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                BillingError::EnrollmentNotPaid { .. } | BillingError::PeriodUnavailable { .. } => {
                    StatusCode::CONFLICT
                }
                BillingError::RegistrationNotFound(_) => StatusCode::NOT_FOUND,
                BillingError::Remote(remote) => collaborator_status(remote),
            },
            AppError::Collaborator(remote) => collaborator_status(remote),
        }
    }
}

fn collaborator_status(err: &CollaboratorError) -> StatusCode {
    match err {
        CollaboratorError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self);
        } else {
            tracing::warn!(error = %self, status = status.as_u16());
        }
        (status, self.to_string()).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
