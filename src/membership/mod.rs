//! Per-club athlete and coach counts from legacy group rosters.

pub mod adapters;
pub mod aggregator;
pub mod api;
pub mod models;

pub use adapters::{count_groups, MembershipCount, MembershipTally, RosterAdapter};
pub use aggregator::{AggregationError, ClubCounts, MembershipAggregator, RetryPolicy};
pub use api::membership_summary;
pub use models::{
    document_id, AthleteEntryList, AthleteIdList, AthleteMembership, Club, CoachIdList, Group,
    LegacyMemberList, MemberRef, MembershipRecord,
};
