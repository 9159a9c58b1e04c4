use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::models::{Payment, Registration, RegistrationFilters, ScheduledPeriod};
use super::reconciliation::schedule;
use super::registration::{
    enrollment_patch, ensure_enrollment_paid, pay_enrollment, prepare_period_payment,
    EnrollmentOutcome, RegistrationState,
};
use crate::collaborators::{ClubDirectory, RegistrationLedger};
use crate::error::BillingError;
use crate::telemetry::{BillingAuditEvent, BillingAuditKind};

// key: billing-service -> operator-triggered billing actions

/// Mutations are applied to the caller's registration first and rolled back
/// when the remote call fails.
#[derive(Clone)]
pub struct BillingService {
    ledger: Arc<dyn RegistrationLedger>,
    directory: Arc<dyn ClubDirectory>,
}

impl BillingService {
    pub fn new(ledger: Arc<dyn RegistrationLedger>, directory: Arc<dyn ClubDirectory>) -> Self {
        Self { ledger, directory }
    }

    pub async fn registrations(
        &self,
        assignment_id: &str,
        filters: &RegistrationFilters,
    ) -> Result<Vec<Registration>, BillingError> {
        let registrations = if filters.unpaid == Some(true) && filters.group.is_none() {
            self.ledger
                .list_unpaid_registrations_by_assignment(assignment_id)
                .await?
        } else {
            self.ledger
                .list_registrations_by_assignment(assignment_id, filters)
                .await?
        };
        Ok(registrations)
    }

    pub async fn registration(
        &self,
        assignment_id: &str,
        registration_id: &str,
    ) -> Result<Registration, BillingError> {
        self.ledger
            .list_registrations_by_assignment(assignment_id, &RegistrationFilters::default())
            .await?
            .into_iter()
            .find(|registration| registration.id == registration_id)
            .ok_or_else(|| BillingError::RegistrationNotFound(registration_id.to_string()))
    }

    pub async fn payments(&self, registration: &Registration) -> Result<Vec<Payment>, BillingError> {
        Ok(self
            .ledger
            .list_payments(&registration.athlete_id, &registration.group_id)
            .await?)
    }

    pub async fn state(&self, registration: &Registration) -> Result<RegistrationState, BillingError> {
        let payments = self.payments(registration).await?;
        let state = RegistrationState::derive(Some(registration), &payments)?;
        debug!(registration = %registration.id, state = state.as_str(), "registration state derived");
        Ok(state)
    }

    pub async fn record_enrollment(
        &self,
        registration: &mut Registration,
        amount: f64,
        paid_at: DateTime<Utc>,
    ) -> Result<EnrollmentOutcome, BillingError> {
        let snapshot = registration.clone();
        let outcome = pay_enrollment(registration, amount, paid_at);
        if let EnrollmentOutcome::Overwritten {
            previous_pay,
            previous_amount,
        } = &outcome
        {
            warn!(
                registration = %registration.id,
                %previous_pay,
                previous_amount,
                amount,
                "enrollment fee recorded again; overwriting previous payment"
            );
        }

        match self
            .ledger
            .update_registration(&registration.id, &enrollment_patch(registration))
            .await
        {
            Ok(stored) => {
                *registration = stored;
                BillingAuditEvent::new(BillingAuditKind::EnrollmentPaid, registration, amount)
                    .emit();
                Ok(outcome)
            }
            Err(err) => {
                *registration = snapshot;
                warn!(registration = %registration.id, error = %err, "enrollment payment rolled back");
                Err(err.into())
            }
        }
    }

    pub async fn pay_period(
        &self,
        registration: &mut Registration,
        index: u32,
        now: DateTime<Utc>,
    ) -> Result<Payment, BillingError> {
        ensure_enrollment_paid(registration)?;
        let group = self.directory.get_group(&registration.group_id).await?;
        let payments = self.payments(registration).await?;
        let draft = prepare_period_payment(registration, &group, &payments, index, now)?;

        let provisional = format!("pending-{}", Uuid::new_v4());
        registration.monthly_payments.push(provisional.clone());

        match self.ledger.create_payment(&draft).await {
            Ok(payment) => {
                if let Some(slot) = registration
                    .monthly_payments
                    .iter_mut()
                    .find(|id| **id == provisional)
                {
                    *slot = payment.id.clone();
                }
                BillingAuditEvent::new(BillingAuditKind::PeriodPaid, registration, payment.amount)
                    .with_period(index, payment.payment_start, payment.payment_end)
                    .emit();
                info!(
                    registration = %registration.id,
                    payment = %payment.id,
                    index,
                    "billing period paid"
                );
                Ok(payment)
            }
            Err(err) => {
                registration.monthly_payments.retain(|id| *id != provisional);
                warn!(registration = %registration.id, index, error = %err, "period payment rolled back");
                Err(err.into())
            }
        }
    }

    pub async fn schedule(
        &self,
        registration: &Registration,
        now: DateTime<Utc>,
        count: u32,
    ) -> Result<Vec<ScheduledPeriod>, BillingError> {
        let enrollment = registration.enrollment_date()?;
        let payments = self.payments(registration).await?;
        schedule(&payments, enrollment, registration.enrollment_paid(), now, count)
    }
}
