use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Utc};

use super::models::{Payment, ScheduledPeriod};
use super::period::{compute_period, period_month};
use crate::error::BillingError;

// key: billing-reconciliation -> payment to period matching

/// A period counts as paid when any payment *starts* in the same calendar
/// month and year as the period. Payment ranges are not compared, so a payment
/// recorded for another enrollment that shares the calendar month also matches.
pub fn is_period_paid(
    payments: &[Payment],
    enrollment: DateTime<Utc>,
    index: u32,
) -> Result<bool, BillingError> {
    let (month0, year) = period_month(enrollment, index)?;
    Ok(payments.iter().any(|payment| {
        payment.payment_start.month0() == month0 && payment.payment_start.year() == year
    }))
}

/// Indices below the enrollment month are blocked only while the current year
/// is still the enrollment year.
pub fn is_period_eligible(enrollment: DateTime<Utc>, index: u32, now: DateTime<Utc>) -> bool {
    let before_registration = index < enrollment.month0() && now.year() == enrollment.year();
    !before_registration
}

/// Period indices covered by `payments`, using the same month/year matching as
/// [`is_period_paid`]. Payments starting before the enrollment month are ignored.
pub fn paid_indices(payments: &[Payment], enrollment: DateTime<Utc>) -> BTreeSet<u32> {
    let anchor = i64::from(enrollment.year()) * 12 + i64::from(enrollment.month0());
    payments
        .iter()
        .filter_map(|payment| {
            let start = payment.payment_start;
            let offset = i64::from(start.year()) * 12 + i64::from(start.month0()) - anchor;
            u32::try_from(offset).ok()
        })
        .collect()
}

/// Builds the first `count` rows of the payment table for one registration.
pub fn schedule(
    payments: &[Payment],
    enrollment: DateTime<Utc>,
    enrollment_paid: bool,
    now: DateTime<Utc>,
    count: u32,
) -> Result<Vec<ScheduledPeriod>, BillingError> {
    (0..count)
        .map(|index| {
            let period = compute_period(enrollment, index)?;
            let paid = is_period_paid(payments, enrollment, index)?;
            let eligible = is_period_eligible(enrollment, index, now);
            Ok(ScheduledPeriod {
                period,
                paid,
                eligible,
                payable: enrollment_paid && eligible && !paid,
            })
        })
        .collect()
}
