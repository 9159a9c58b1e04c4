mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use club_backend::billing::{BillingService, EnrollmentOutcome, RegistrationFilters};
use club_backend::error::{BillingError, PeriodUnavailableReason};
use common::{fee_group, registration, utc, FakeDirectory, FakeLedger};

fn service(ledger: Arc<FakeLedger>) -> BillingService {
    let directory = Arc::new(FakeDirectory::default().with_club("club-1", vec![fee_group(35.0)]));
    BillingService::new(ledger, directory)
}

// key: billing-tests -> enrollment gating
#[tokio::test]
async fn period_payment_requires_enrollment_fee() {
    let ledger = Arc::new(FakeLedger::new(
        "asg-1",
        vec![registration("r1", "2024-01-15T00:00:00.000Z", None)],
    ));
    let billing = service(ledger.clone());
    let mut target = billing.registration("asg-1", "r1").await.unwrap();

    for index in [0, 1, 11] {
        let err = billing
            .pay_period(&mut target, index, utc("2024-03-01T00:00:00Z"))
            .await
            .expect_err("unpaid enrollment must block monthly billing");
        assert!(matches!(err, BillingError::EnrollmentNotPaid { .. }));
    }

    assert!(target.monthly_payments.is_empty());
    assert_eq!(ledger.create_calls.load(Ordering::SeqCst), 0);
    assert_eq!(ledger.payment_count(), 0);
}

#[tokio::test]
async fn paying_a_period_records_payment_for_window() {
    let ledger = Arc::new(FakeLedger::new(
        "asg-1",
        vec![registration(
            "r1",
            "2024-01-15T00:00:00.000Z",
            Some("2024-01-15T09:00:00Z"),
        )],
    ));
    let billing = service(ledger.clone());
    let mut target = billing.registration("asg-1", "r1").await.unwrap();
    let now = utc("2024-02-20T12:00:00Z");

    let payment = billing.pay_period(&mut target, 1, now).await.unwrap();

    assert_eq!(payment.amount, 35.0);
    assert_eq!(payment.payment_start, utc("2024-02-15T00:00:00Z"));
    assert_eq!(payment.payment_end, utc("2024-03-14T23:59:59Z"));
    assert_eq!(payment.payment_date, now);
    assert_eq!(target.monthly_payments, vec![payment.id.clone()]);

    let err = billing
        .pay_period(&mut target, 1, now)
        .await
        .expect_err("second payment for the same period must be refused");
    assert!(matches!(
        err,
        BillingError::PeriodUnavailable {
            index: 1,
            reason: PeriodUnavailableReason::AlreadyPaid
        }
    ));
    assert_eq!(target.monthly_payments.len(), 1);
    assert_eq!(ledger.payment_count(), 1);
}

#[tokio::test]
async fn failed_payment_submission_rolls_back_local_state() {
    let ledger = Arc::new(FakeLedger::new(
        "asg-1",
        vec![registration(
            "r1",
            "2024-01-15T00:00:00.000Z",
            Some("2024-01-15T09:00:00Z"),
        )],
    ));
    ledger.fail_create.store(true, Ordering::SeqCst);
    let billing = service(ledger.clone());
    let mut target = billing.registration("asg-1", "r1").await.unwrap();
    target.monthly_payments.push("pay-existing".to_string());

    let err = billing
        .pay_period(&mut target, 2, utc("2024-04-01T00:00:00Z"))
        .await
        .expect_err("remote failure must surface");

    assert!(matches!(err, BillingError::Remote(_)));
    assert_eq!(target.monthly_payments, vec!["pay-existing".to_string()]);
    assert_eq!(ledger.create_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn early_index_in_enrollment_year_is_unavailable() {
    let ledger = Arc::new(FakeLedger::new(
        "asg-1",
        vec![registration(
            "r1",
            "2024-06-10T00:00:00.000Z",
            Some("2024-06-10T09:00:00Z"),
        )],
    ));
    let billing = service(ledger.clone());
    let mut target = billing.registration("asg-1", "r1").await.unwrap();

    let err = billing
        .pay_period(&mut target, 2, utc("2024-09-01T00:00:00Z"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BillingError::PeriodUnavailable {
            reason: PeriodUnavailableReason::BeforeRegistration,
            ..
        }
    ));

    // The same index opens up once the calendar year changes.
    let payment = billing
        .pay_period(&mut target, 2, utc("2025-01-05T00:00:00Z"))
        .await
        .unwrap();
    assert_eq!(payment.payment_start, utc("2024-08-10T00:00:00Z"));
}

#[tokio::test]
async fn repeated_enrollment_payment_is_last_write_wins() {
    let ledger = Arc::new(FakeLedger::new(
        "asg-1",
        vec![registration("r1", "2024-01-15", None)],
    ));
    let billing = service(ledger.clone());
    let mut target = billing.registration("asg-1", "r1").await.unwrap();

    let first = billing
        .record_enrollment(&mut target, 50.0, utc("2024-01-15T09:00:00Z"))
        .await
        .unwrap();
    assert_eq!(first, EnrollmentOutcome::Recorded);

    let second = billing
        .record_enrollment(&mut target, 45.0, utc("2024-01-20T09:00:00Z"))
        .await
        .unwrap();
    assert_eq!(
        second,
        EnrollmentOutcome::Overwritten {
            previous_pay: utc("2024-01-15T09:00:00Z"),
            previous_amount: 50.0,
        }
    );

    let stored = ledger.stored("r1");
    assert_eq!(stored.registration_pay, Some(utc("2024-01-20T09:00:00Z")));
    assert_eq!(stored.registration_amount, 45.0);
    assert_eq!(target, stored);
}

#[tokio::test]
async fn failed_enrollment_update_restores_registration() {
    let ledger = Arc::new(FakeLedger::new(
        "asg-1",
        vec![registration("r1", "2024-01-15", None)],
    ));
    ledger.fail_update.store(true, Ordering::SeqCst);
    let billing = service(ledger.clone());
    let mut target = billing.registration("asg-1", "r1").await.unwrap();
    let before = target.clone();

    let err = billing
        .record_enrollment(&mut target, 50.0, utc("2024-01-15T09:00:00Z"))
        .await
        .unwrap_err();

    assert!(matches!(err, BillingError::Remote(_)));
    assert_eq!(target, before);
    assert!(ledger.stored("r1").registration_pay.is_none());
}

#[tokio::test]
async fn schedule_reflects_payments_and_gating() {
    let ledger = Arc::new(FakeLedger::new(
        "asg-1",
        vec![registration(
            "r1",
            "2024-01-15T00:00:00.000Z",
            Some("2024-01-15T09:00:00Z"),
        )],
    ));
    let billing = service(ledger.clone());
    let mut target = billing.registration("asg-1", "r1").await.unwrap();
    let now = utc("2024-02-01T00:00:00Z");
    billing.pay_period(&mut target, 0, now).await.unwrap();

    let rows = billing.schedule(&target, now, 12).await.unwrap();
    assert_eq!(rows.len(), 12);
    assert!(rows[0].paid && !rows[0].payable);
    assert!(rows[1..].iter().all(|row| !row.paid && row.payable));
    assert_eq!(rows[11].period.start, utc("2024-12-15T00:00:00Z"));
    assert_eq!(rows[11].period.end, utc("2025-01-14T23:59:59Z"));
}

#[tokio::test]
async fn invalid_enrollment_date_fails_fast() {
    let ledger = Arc::new(FakeLedger::new(
        "asg-1",
        vec![registration("r1", "not-a-date", Some("2024-01-15T09:00:00Z"))],
    ));
    let billing = service(ledger.clone());
    let mut target = billing.registration("asg-1", "r1").await.unwrap();

    let err = billing
        .pay_period(&mut target, 0, utc("2024-02-01T00:00:00Z"))
        .await
        .unwrap_err();
    assert!(matches!(err, BillingError::InvalidEnrollmentDate { .. }));
    assert!(target.monthly_payments.is_empty());
}

#[tokio::test]
async fn unpaid_filter_uses_dedicated_listing() {
    let ledger = Arc::new(FakeLedger::new(
        "asg-1",
        vec![
            registration("r1", "2024-01-15", None),
            registration("r2", "2024-01-15", Some("2024-01-15T09:00:00Z")),
        ],
    ));
    let billing = service(ledger);

    let unpaid = billing
        .registrations(
            "asg-1",
            &RegistrationFilters {
                unpaid: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(unpaid.len(), 1);
    assert_eq!(unpaid[0].id, "r1");

    let err = billing.registration("asg-1", "missing").await.unwrap_err();
    assert!(matches!(err, BillingError::RegistrationNotFound(_)));
}
