use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use futures_util::future::join_all;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::adapters::{count_groups, MembershipCount};
use super::models::{Club, Group};
use crate::collaborators::{ClubDirectory, CollaboratorError};
use crate::config;

// key: membership-retry-policy -> exponential backoff between rounds

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config() -> Self {
        Self {
            max_attempts: *config::MEMBERSHIP_MAX_ATTEMPTS,
            base_backoff: Duration::from_millis(*config::MEMBERSHIP_BASE_BACKOFF_MS),
        }
    }

    /// Delay after failed round `attempt` (1-based): `base × 2^(attempt−1)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_backoff.saturating_mul(factor)
    }
}

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("membership aggregation gave up after {attempts} attempts ({failed_clubs} clubs failing in the last round)")]
    Exhausted { attempts: u32, failed_clubs: usize },
}

pub type ClubCounts = HashMap<String, MembershipCount>;

// key: membership-aggregator -> all-or-nothing roster rounds

#[derive(Clone, Debug, Default)]
pub struct MembershipAggregator {
    policy: RetryPolicy,
}

impl MembershipAggregator {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Counts per club. An exhausted attempt budget yields an empty map, which
    /// callers must read as "unknown" rather than zero members.
    pub async fn aggregate<F, Fut>(&self, clubs: &[Club], fetch_groups: F) -> ClubCounts
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<Vec<Group>, CollaboratorError>>,
    {
        match self.try_aggregate(clubs, fetch_groups).await {
            Ok(counts) => counts,
            Err(err) => {
                warn!(error = %err, "membership aggregation degraded to empty result");
                ClubCounts::new()
            }
        }
    }

    /// Same as [`aggregate`](Self::aggregate) but reports exhaustion.
    ///
    /// Every round refetches all clubs, even ones that succeeded earlier.
    pub async fn try_aggregate<F, Fut>(
        &self,
        clubs: &[Club],
        fetch_groups: F,
    ) -> Result<ClubCounts, AggregationError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<Vec<Group>, CollaboratorError>>,
    {
        let attempts = self.policy.max_attempts.max(1);
        let mut failed_clubs = 0;

        for attempt in 1..=attempts {
            let round = join_all(clubs.iter().map(|club| {
                let fetch = fetch_groups(club.id.clone());
                async move { (club, fetch.await) }
            }))
            .await;

            let mut counts = ClubCounts::with_capacity(round.len());
            failed_clubs = 0;
            for (club, outcome) in round {
                match outcome {
                    Ok(groups) => {
                        counts.insert(club.id.clone(), count_groups(&groups));
                    }
                    Err(err) => {
                        failed_clubs += 1;
                        debug!(club_id = %club.id, attempt, error = %err, "club roster fetch failed");
                    }
                }
            }

            if failed_clubs == 0 {
                info!(attempt, clubs = counts.len(), "membership aggregation complete");
                return Ok(counts);
            }

            warn!(attempt, max_attempts = attempts, failed_clubs, "membership fetch round incomplete");
            if attempt < attempts {
                sleep(self.policy.delay_for_attempt(attempt)).await;
            }
        }

        Err(AggregationError::Exhausted {
            attempts,
            failed_clubs,
        })
    }

    pub async fn aggregate_directory(
        &self,
        directory: &dyn ClubDirectory,
        clubs: &[Club],
    ) -> Result<ClubCounts, AggregationError> {
        self.try_aggregate(clubs, |club_id| async move {
            directory.list_groups_by_club(&club_id).await
        })
        .await
    }
}
