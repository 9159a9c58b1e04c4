//! Shared application state handed to every handler through `Extension`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::billing::BillingService;
use crate::collaborators::{ClubDirectory, RegistrationLedger};
use crate::error::AppResult;
use crate::membership::{ClubCounts, MembershipAggregator, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStatus {
    Verified,
    /// Attempt budget exhausted; counts are absent, not zero.
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
pub struct MembershipSnapshot {
    pub status: AggregationStatus,
    pub clubs: ClubCounts,
    pub refreshed_at: DateTime<Utc>,
}

/// Proof that a caller started a refresh; stale once a newer refresh starts
/// or the board is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
}

// key: membership-board -> latest counts with cooperative cancellation

#[derive(Debug, Default)]
pub struct MembershipBoard {
    generation: AtomicU64,
    closed: AtomicBool,
    latest: RwLock<Option<MembershipSnapshot>>,
}

impl MembershipBoard {
    pub fn begin_refresh(&self) -> RefreshTicket {
        RefreshTicket {
            generation: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    pub fn is_current(&self, ticket: RefreshTicket) -> bool {
        !self.is_closed() && self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    /// Stores `snapshot` unless the ticket went stale. Returns whether it was applied.
    pub async fn commit(&self, ticket: RefreshTicket, snapshot: MembershipSnapshot) -> bool {
        let mut latest = self.latest.write().await;
        if !self.is_current(ticket) {
            debug!(generation = ticket.generation, "discarding stale membership refresh");
            return false;
        }
        *latest = Some(snapshot);
        true
    }

    pub async fn latest(&self) -> Option<MembershipSnapshot> {
        self.latest.read().await.clone()
    }

    /// Invalidates every outstanding ticket.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct AppStateInner {
    directory: Arc<dyn ClubDirectory>,
    ledger: Arc<dyn RegistrationLedger>,
    aggregator: MembershipAggregator,
    membership: MembershipBoard,
}

// key: app-state -> injected collaborators and view state

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(
        directory: Arc<dyn ClubDirectory>,
        ledger: Arc<dyn RegistrationLedger>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                directory,
                ledger,
                aggregator: MembershipAggregator::new(policy),
                membership: MembershipBoard::default(),
            }),
        }
    }

    pub fn directory(&self) -> Arc<dyn ClubDirectory> {
        self.inner.directory.clone()
    }

    pub fn ledger(&self) -> Arc<dyn RegistrationLedger> {
        self.inner.ledger.clone()
    }

    pub fn billing(&self) -> BillingService {
        BillingService::new(self.ledger(), self.directory())
    }

    pub fn membership(&self) -> &MembershipBoard {
        &self.inner.membership
    }

    /// Lists clubs and aggregates their rosters. Club listing failures are
    /// returned; roster failures degrade to an `Unknown` snapshot.
    pub async fn refresh_membership(&self) -> AppResult<MembershipSnapshot> {
        let ticket = self.inner.membership.begin_refresh();
        let clubs = self.inner.directory.list_clubs().await?;

        let snapshot = match self
            .inner
            .aggregator
            .aggregate_directory(self.inner.directory.as_ref(), &clubs)
            .await
        {
            Ok(clubs) => MembershipSnapshot {
                status: AggregationStatus::Verified,
                clubs,
                refreshed_at: Utc::now(),
            },
            Err(err) => {
                warn!(error = %err, "membership counts unknown");
                MembershipSnapshot {
                    status: AggregationStatus::Unknown,
                    clubs: ClubCounts::new(),
                    refreshed_at: Utc::now(),
                }
            }
        };

        if self.inner.membership.commit(ticket, snapshot.clone()).await {
            info!(clubs = snapshot.clubs.len(), status = ?snapshot.status, "membership board updated");
        }
        Ok(snapshot)
    }

    pub fn shutdown(&self) {
        self.inner.membership.close();
        info!("application state closed");
    }
}
