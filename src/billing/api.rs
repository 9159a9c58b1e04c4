use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    EnrollmentOutcome, Payment, Registration, RegistrationFilters, RegistrationState,
    ScheduledPeriod,
};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

const DEFAULT_SCHEDULE_LENGTH: u32 = 12;
const MAX_SCHEDULE_LENGTH: u32 = 120;

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub count: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub registration: Registration,
    pub state: RegistrationState,
    pub periods: Vec<ScheduledPeriod>,
}

#[derive(Debug, Deserialize)]
pub struct EnrollmentRequest {
    pub amount: f64,
    #[serde(default, deserialize_with = "super::period::deserialize_optional_timestamp")]
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub registration: Registration,
    #[serde(flatten)]
    pub outcome: EnrollmentOutcome,
}

#[derive(Debug, Serialize)]
pub struct PeriodPaymentResponse {
    pub registration: Registration,
    pub payment: Payment,
}

// key: billing-api -> registration listing

pub async fn list_registrations(
    Extension(state): Extension<AppState>,
    Path(assignment_id): Path<String>,
    Query(filters): Query<RegistrationFilters>,
) -> AppResult<Json<Vec<Registration>>> {
    let registrations = state.billing().registrations(&assignment_id, &filters).await?;
    Ok(Json(registrations))
}

pub async fn period_schedule(
    Extension(state): Extension<AppState>,
    Path((assignment_id, registration_id)): Path<(String, String)>,
    Query(query): Query<ScheduleQuery>,
) -> AppResult<Json<ScheduleResponse>> {
    let count = query.count.unwrap_or(DEFAULT_SCHEDULE_LENGTH);
    if count > MAX_SCHEDULE_LENGTH {
        return Err(AppError::BadRequest(format!(
            "count must not exceed {MAX_SCHEDULE_LENGTH}"
        )));
    }

    let billing = state.billing();
    let registration = billing.registration(&assignment_id, &registration_id).await?;
    let periods = billing.schedule(&registration, Utc::now(), count).await?;
    let state = billing.state(&registration).await?;
    Ok(Json(ScheduleResponse {
        registration,
        state,
        periods,
    }))
}

pub async fn record_enrollment(
    Extension(state): Extension<AppState>,
    Path((assignment_id, registration_id)): Path<(String, String)>,
    Json(payload): Json<EnrollmentRequest>,
) -> AppResult<Json<EnrollmentResponse>> {
    if !payload.amount.is_finite() || payload.amount < 0.0 {
        return Err(AppError::BadRequest(
            "amount must be a non-negative number".to_string(),
        ));
    }

    let billing = state.billing();
    let mut registration = billing.registration(&assignment_id, &registration_id).await?;
    let outcome = billing
        .record_enrollment(
            &mut registration,
            payload.amount,
            payload.paid_at.unwrap_or_else(Utc::now),
        )
        .await?;
    Ok(Json(EnrollmentResponse {
        registration,
        outcome,
    }))
}

pub async fn pay_period(
    Extension(state): Extension<AppState>,
    Path((assignment_id, registration_id, index)): Path<(String, String, u32)>,
) -> AppResult<(StatusCode, Json<PeriodPaymentResponse>)> {
    let billing = state.billing();
    let mut registration = billing.registration(&assignment_id, &registration_id).await?;
    let payment = billing
        .pay_period(&mut registration, index, Utc::now())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(PeriodPaymentResponse {
            registration,
            payment,
        }),
    ))
}
