use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::models::{NewPayment, Payment, Registration, RegistrationPatch};
use super::period::compute_period;
use super::reconciliation::{is_period_eligible, is_period_paid, paid_indices};
use crate::error::{BillingError, PeriodUnavailableReason};
use crate::membership::Group;

// key: billing-registration-state -> enrollment gating

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RegistrationState {
    Unregistered,
    RegisteredUnpaid,
    RegisteredPaid { paid_periods: BTreeSet<u32> },
}

impl RegistrationState {
    pub fn derive(
        registration: Option<&Registration>,
        payments: &[Payment],
    ) -> Result<Self, BillingError> {
        let Some(registration) = registration else {
            return Ok(RegistrationState::Unregistered);
        };
        if !registration.enrollment_paid() {
            return Ok(RegistrationState::RegisteredUnpaid);
        }
        let enrollment = registration.enrollment_date()?;
        Ok(RegistrationState::RegisteredPaid {
            paid_periods: paid_indices(payments, enrollment),
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationState::Unregistered => "unregistered",
            RegistrationState::RegisteredUnpaid => "registered_unpaid",
            RegistrationState::RegisteredPaid { .. } => "registered_paid",
        }
    }
}

/// Result of recording the enrollment fee. A repeat call overwrites the
/// previous timestamp and amount; the overwritten values are reported back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EnrollmentOutcome {
    Recorded,
    Overwritten {
        previous_pay: DateTime<Utc>,
        previous_amount: f64,
    },
}

pub fn pay_enrollment(
    registration: &mut Registration,
    amount: f64,
    timestamp: DateTime<Utc>,
) -> EnrollmentOutcome {
    let outcome = match registration.registration_pay {
        Some(previous_pay) => EnrollmentOutcome::Overwritten {
            previous_pay,
            previous_amount: registration.registration_amount,
        },
        None => EnrollmentOutcome::Recorded,
    };
    registration.registration_pay = Some(timestamp);
    registration.registration_amount = amount;
    outcome
}

pub fn enrollment_patch(registration: &Registration) -> RegistrationPatch {
    RegistrationPatch {
        registration_pay: registration.registration_pay,
        registration_amount: Some(registration.registration_amount),
        ..Default::default()
    }
}

pub fn ensure_enrollment_paid(registration: &Registration) -> Result<(), BillingError> {
    if registration.enrollment_paid() {
        Ok(())
    } else {
        Err(BillingError::EnrollmentNotPaid {
            registration_id: registration.id.clone(),
        })
    }
}

/// Validates that period `index` may be billed and builds the payment record
/// for it. Does not touch the registration.
pub fn prepare_period_payment(
    registration: &Registration,
    group: &Group,
    payments: &[Payment],
    index: u32,
    now: DateTime<Utc>,
) -> Result<NewPayment, BillingError> {
    ensure_enrollment_paid(registration)?;
    let enrollment = registration.enrollment_date()?;

    if !is_period_eligible(enrollment, index, now) {
        return Err(BillingError::PeriodUnavailable {
            index,
            reason: PeriodUnavailableReason::BeforeRegistration,
        });
    }
    if is_period_paid(payments, enrollment, index)? {
        return Err(BillingError::PeriodUnavailable {
            index,
            reason: PeriodUnavailableReason::AlreadyPaid,
        });
    }

    let period = compute_period(enrollment, index)?;
    Ok(NewPayment {
        amount: group.monthly_fee,
        group_id: registration.group_id.clone(),
        athlete_id: registration.athlete_id.clone(),
        payment_date: now,
        payment_start: period.start,
        payment_end: period.end,
    })
}
