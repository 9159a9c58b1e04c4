use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::period::{deserialize_optional_timestamp, deserialize_timestamp, parse_enrollment_date};
use crate::error::BillingError;
use crate::membership::models::{document_id, MemberRef};

// key: billing-registration-model -> athlete enrollment in one group

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RegistrationPayload")]
pub struct Registration {
    pub id: String,
    pub athlete_id: String,
    pub group_id: String,
    /// Raw ISO-8601 anchor date as delivered by the API; parsed on demand.
    pub registration_date: Option<String>,
    pub registration_pay: Option<DateTime<Utc>>,
    pub registration_amount: f64,
    pub monthly_payments: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RegistrationPayload {
    #[serde(default, rename = "_id")]
    object_id: Option<MemberRef>,
    #[serde(default)]
    id: Option<MemberRef>,
    #[serde(alias = "athlete")]
    athlete_id: String,
    #[serde(alias = "group")]
    group_id: String,
    #[serde(default)]
    registration_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    registration_pay: Option<DateTime<Utc>>,
    #[serde(default)]
    registration_amount: f64,
    #[serde(default)]
    monthly_payments: Vec<String>,
}

impl TryFrom<RegistrationPayload> for Registration {
    type Error = String;

    fn try_from(payload: RegistrationPayload) -> Result<Self, Self::Error> {
        Ok(Registration {
            id: document_id(payload.object_id, payload.id).ok_or("registration without `_id`")?,
            athlete_id: payload.athlete_id,
            group_id: payload.group_id,
            registration_date: payload.registration_date,
            registration_pay: payload.registration_pay,
            registration_amount: payload.registration_amount,
            monthly_payments: payload.monthly_payments,
        })
    }
}

impl Registration {
    pub fn enrollment_date(&self) -> Result<DateTime<Utc>, BillingError> {
        parse_enrollment_date(self.registration_date.as_deref())
    }

    pub fn enrollment_paid(&self) -> bool {
        self.registration_pay.is_some()
    }
}

// key: billing-payment-model -> one recorded monthly fee

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PaymentPayload")]
pub struct Payment {
    pub id: String,
    pub athlete_id: String,
    pub group_id: String,
    pub amount: f64,
    pub payment_date: DateTime<Utc>,
    pub payment_start: DateTime<Utc>,
    pub payment_end: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct PaymentPayload {
    #[serde(default, rename = "_id")]
    object_id: Option<MemberRef>,
    #[serde(default)]
    id: Option<MemberRef>,
    #[serde(alias = "athlete")]
    athlete_id: String,
    #[serde(alias = "group")]
    group_id: String,
    amount: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    payment_date: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    payment_start: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    payment_end: DateTime<Utc>,
}

impl TryFrom<PaymentPayload> for Payment {
    type Error = String;

    fn try_from(payload: PaymentPayload) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: document_id(payload.object_id, payload.id).ok_or("payment without `_id`")?,
            athlete_id: payload.athlete_id,
            group_id: payload.group_id,
            amount: payload.amount,
            payment_date: payload.payment_date,
            payment_start: payload.payment_start,
            payment_end: payload.payment_end,
        })
    }
}

/// Body of `createPayment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPayment {
    pub amount: f64,
    pub group_id: String,
    pub athlete_id: String,
    pub payment_date: DateTime<Utc>,
    pub payment_start: DateTime<Utc>,
    pub payment_end: DateTime<Utc>,
}

/// Partial update accepted by `updateRegistration`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_pay: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegistrationFilters {
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub unpaid: Option<bool>,
}

/// Derived month-long window; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BillingPeriod {
    pub index: u32,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

// key: billing-schedule-row -> one line of the operator's payment table

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledPeriod {
    #[serde(flatten)]
    pub period: BillingPeriod,
    pub paid: bool,
    pub eligible: bool,
    pub payable: bool,
}
