pub mod api;
pub mod models;
pub mod period;
pub mod reconciliation;
pub mod registration;
pub mod service;

pub use api::{
    list_registrations as billing_list_registrations, pay_period as billing_pay_period,
    period_schedule as billing_period_schedule, record_enrollment as billing_record_enrollment,
    EnrollmentRequest, EnrollmentResponse, PeriodPaymentResponse, ScheduleResponse,
};
pub use models::{
    BillingPeriod, NewPayment, Payment, Registration, RegistrationFilters, RegistrationPatch,
    ScheduledPeriod,
};
pub use period::{compute_period, parse_enrollment_date, parse_timestamp};
pub use reconciliation::{is_period_eligible, is_period_paid};
pub use registration::{EnrollmentOutcome, RegistrationState};
pub use service::BillingService;
