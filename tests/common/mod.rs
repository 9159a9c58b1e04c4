#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use club_backend::billing::{
    NewPayment, Payment, Registration, RegistrationFilters, RegistrationPatch,
};
use club_backend::collaborators::{ClubDirectory, CollaboratorError, RegistrationLedger};
use club_backend::membership::{Club, Group};

pub fn utc(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
}

pub fn club(id: &str) -> Club {
    Club {
        id: id.to_string(),
        name: format!("Club {id}"),
    }
}

pub fn group_from_json(value: serde_json::Value) -> Group {
    serde_json::from_value(value).unwrap()
}

/// Directory whose roster fetches can be scripted to fail a number of times per club.
#[derive(Default)]
pub struct FakeDirectory {
    pub clubs: Vec<Club>,
    pub groups: HashMap<String, Vec<Group>>,
    pub failures: Mutex<HashMap<String, u32>>,
    pub roster_calls: AtomicUsize,
    pub fail_listing: AtomicBool,
}

impl FakeDirectory {
    pub fn with_club(mut self, club_id: &str, groups: Vec<Group>) -> Self {
        self.clubs.push(club(club_id));
        self.groups.insert(club_id.to_string(), groups);
        self
    }

    pub fn failing(self, club_id: &str, times: u32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(club_id.to_string(), times);
        self
    }

    pub fn calls(&self) -> usize {
        self.roster_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClubDirectory for FakeDirectory {
    async fn list_clubs(&self) -> Result<Vec<Club>, CollaboratorError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Unavailable("clubs".to_string()));
        }
        Ok(self.clubs.clone())
    }

    async fn list_groups_by_club(&self, club_id: &str) -> Result<Vec<Group>, CollaboratorError> {
        self.roster_calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(club_id) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(CollaboratorError::Unavailable(format!("groups of {club_id}")));
                }
            }
        }
        Ok(self.groups.get(club_id).cloned().unwrap_or_default())
    }

    async fn get_group(&self, group_id: &str) -> Result<Group, CollaboratorError> {
        self.groups
            .values()
            .flatten()
            .find(|group| group.id == group_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(format!("groups/{group_id}")))
    }
}

/// Ledger keeping registrations and payments in memory.
#[derive(Default)]
pub struct FakeLedger {
    pub assignment_id: String,
    pub registrations: Mutex<Vec<Registration>>,
    pub payments: Mutex<Vec<Payment>>,
    pub fail_create: AtomicBool,
    pub fail_update: AtomicBool,
    pub create_calls: AtomicUsize,
}

impl FakeLedger {
    pub fn new(assignment_id: &str, registrations: Vec<Registration>) -> Self {
        Self {
            assignment_id: assignment_id.to_string(),
            registrations: Mutex::new(registrations),
            ..Default::default()
        }
    }

    pub fn stored(&self, registration_id: &str) -> Registration {
        self.registrations
            .lock()
            .unwrap()
            .iter()
            .find(|registration| registration.id == registration_id)
            .cloned()
            .unwrap()
    }

    pub fn payment_count(&self) -> usize {
        self.payments.lock().unwrap().len()
    }
}

#[async_trait]
impl RegistrationLedger for FakeLedger {
    async fn list_registrations_by_assignment(
        &self,
        assignment_id: &str,
        filters: &RegistrationFilters,
    ) -> Result<Vec<Registration>, CollaboratorError> {
        if assignment_id != self.assignment_id {
            return Ok(Vec::new());
        }
        Ok(self
            .registrations
            .lock()
            .unwrap()
            .iter()
            .filter(|registration| {
                filters
                    .group
                    .as_ref()
                    .map_or(true, |group| &registration.group_id == group)
            })
            .filter(|registration| match filters.unpaid {
                Some(true) => registration.registration_pay.is_none(),
                Some(false) => registration.registration_pay.is_some(),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn list_unpaid_registrations_by_assignment(
        &self,
        assignment_id: &str,
    ) -> Result<Vec<Registration>, CollaboratorError> {
        self.list_registrations_by_assignment(
            assignment_id,
            &RegistrationFilters {
                unpaid: Some(true),
                ..Default::default()
            },
        )
        .await
    }

    async fn list_payments(
        &self,
        athlete_id: &str,
        group_id: &str,
    ) -> Result<Vec<Payment>, CollaboratorError> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .filter(|payment| payment.athlete_id == athlete_id && payment.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn update_registration(
        &self,
        registration_id: &str,
        patch: &RegistrationPatch,
    ) -> Result<Registration, CollaboratorError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Unavailable("registrations".to_string()));
        }
        let mut registrations = self.registrations.lock().unwrap();
        let stored = registrations
            .iter_mut()
            .find(|registration| registration.id == registration_id)
            .ok_or_else(|| CollaboratorError::NotFound(format!("registrations/{registration_id}")))?;
        if let Some(date) = &patch.registration_date {
            stored.registration_date = Some(date.clone());
        }
        if let Some(pay) = patch.registration_pay {
            stored.registration_pay = Some(pay);
        }
        if let Some(amount) = patch.registration_amount {
            stored.registration_amount = amount;
        }
        Ok(stored.clone())
    }

    async fn create_payment(&self, record: &NewPayment) -> Result<Payment, CollaboratorError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Status {
                endpoint: "/payments".to_string(),
                status: 503,
            });
        }
        let mut payments = self.payments.lock().unwrap();
        let payment = Payment {
            id: format!("pay-{}", payments.len() + 1),
            athlete_id: record.athlete_id.clone(),
            group_id: record.group_id.clone(),
            amount: record.amount,
            payment_date: record.payment_date,
            payment_start: record.payment_start,
            payment_end: record.payment_end,
        };
        payments.push(payment.clone());
        Ok(payment)
    }
}

pub fn registration(id: &str, date: &str, pay: Option<&str>) -> Registration {
    Registration {
        id: id.to_string(),
        athlete_id: format!("ath-{id}"),
        group_id: "grp-1".to_string(),
        registration_date: Some(date.to_string()),
        registration_pay: pay.map(utc),
        registration_amount: 0.0,
        monthly_payments: Vec::new(),
    }
}

pub fn fee_group(monthly_fee: f64) -> Group {
    group_from_json(serde_json::json!({
        "_id": "grp-1",
        "club": "club-1",
        "name": "Infantiles",
        "monthly_fee": monthly_fee,
        "athletes": ["ath-r1", "ath-r2"],
        "coaches": ["coach-1"],
    }))
}
