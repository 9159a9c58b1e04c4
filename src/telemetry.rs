use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::billing::Registration;

/// JSON log output filtered through `RUST_LOG`.
pub fn init_tracing() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingAuditKind {
    EnrollmentPaid,
    PeriodPaid,
}

// key: billing-audit-event -> one line per recorded payment

#[derive(Debug, Clone, Serialize)]
pub struct BillingAuditEvent {
    pub kind: BillingAuditKind,
    pub registration_id: String,
    pub athlete_id: String,
    pub group_id: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_end: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

impl BillingAuditEvent {
    pub fn new(kind: BillingAuditKind, registration: &Registration, amount: f64) -> Self {
        Self {
            kind,
            registration_id: registration.id.clone(),
            athlete_id: registration.athlete_id.clone(),
            group_id: registration.group_id.clone(),
            amount,
            period_index: None,
            period_start: None,
            period_end: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_period(mut self, index: u32, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.period_index = Some(index);
        self.period_start = Some(start);
        self.period_end = Some(end);
        self
    }

    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(details) => tracing::info!(target: "billing.audit", kind = ?self.kind, %details),
            Err(err) => tracing::warn!(target: "billing.audit", ?err, "failed to encode audit event"),
        }
    }
}
