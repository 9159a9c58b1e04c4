//! Day-anchored monthly billing windows.
//!
//! A period starts on the enrollment day-of-month and ends one second before
//! the same day of the following month. All components are read in UTC.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer};

use super::models::BillingPeriod;
use crate::error::BillingError;

/// Reads a timestamp as the club API delivers it: RFC 3339, an offset-less
/// timestamp (taken as UTC) or a bare `YYYY-MM-DD` date (UTC midnight).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    let midnight = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}

pub fn parse_enrollment_date(raw: Option<&str>) -> Result<DateTime<Utc>, BillingError> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(parse_timestamp)
        .ok_or_else(|| BillingError::InvalidEnrollmentDate {
            value: raw.map(str::to_string),
        })
}

pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp `{raw}`")))
}

pub(crate) fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid timestamp `{raw}`"))),
        None => Ok(None),
    }
}

/// Zero-based month and year the period `index` falls in, counted from the
/// enrollment month.
pub fn period_month(enrollment: DateTime<Utc>, index: u32) -> Result<(u32, i32), BillingError> {
    let months = u64::from(enrollment.month0()) + u64::from(index);
    let carry = i32::try_from(months / 12).map_err(|_| BillingError::PeriodOutOfRange { index })?;
    let year = enrollment
        .year()
        .checked_add(carry)
        .ok_or(BillingError::PeriodOutOfRange { index })?;
    Ok(((months % 12) as u32, year))
}

pub fn compute_period(enrollment: DateTime<Utc>, index: u32) -> Result<BillingPeriod, BillingError> {
    let out_of_range = || BillingError::PeriodOutOfRange { index };
    let day = i64::from(enrollment.day());
    let (month0, year) = period_month(enrollment, index)?;
    let (next_month0, next_year) = if month0 + 1 == 12 {
        (0, year.checked_add(1).ok_or_else(out_of_range)?)
    } else {
        (month0 + 1, year)
    };

    let start = calendar_day(year, month0, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(out_of_range)?;
    let end = calendar_day(next_year, next_month0, day - 1)
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .ok_or_else(out_of_range)?;

    Ok(BillingPeriod {
        index,
        start: Utc.from_utc_datetime(&start),
        end: Utc.from_utc_datetime(&end),
    })
}

/// Builds `year-month-day` letting out-of-range days roll over: day 31 of a
/// 30-day month lands on the 1st of the next, day 0 on the last of the previous.
fn calendar_day(year: i32, month0: u32, day: i64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month0 + 1, 1)?.checked_add_signed(Duration::days(day - 1))
}
