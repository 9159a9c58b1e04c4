use std::collections::HashSet;

use serde::Serialize;

use super::models::{
    AthleteEntryList, AthleteIdList, CoachIdList, Group, LegacyMemberList, MembershipRecord,
};

/// Deduplicated counts for one club.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MembershipCount {
    pub athletes: usize,
    pub coaches: usize,
}

/// Identifier sets accumulated across every roster of a club.
#[derive(Debug, Default)]
pub struct MembershipTally {
    athletes: HashSet<String>,
    coaches: HashSet<String>,
}

impl MembershipTally {
    pub fn add_athlete(&mut self, id: Option<String>) {
        if let Some(id) = id {
            self.athletes.insert(id);
        }
    }

    pub fn add_coach(&mut self, id: Option<String>) {
        if let Some(id) = id {
            self.coaches.insert(id);
        }
    }

    pub fn absorb_group(&mut self, group: &Group) {
        for roster in &group.rosters {
            roster.normalize(self);
        }
    }

    pub fn counts(&self) -> MembershipCount {
        MembershipCount {
            athletes: self.athletes.len(),
            coaches: self.coaches.len(),
        }
    }
}

// key: membership-adapter -> one normalizer per roster shape

pub trait RosterAdapter {
    fn normalize(&self, tally: &mut MembershipTally);
}

impl RosterAdapter for AthleteIdList {
    fn normalize(&self, tally: &mut MembershipTally) {
        for member in &self.ids {
            tally.add_athlete(member.id());
        }
    }
}

impl RosterAdapter for AthleteEntryList {
    fn normalize(&self, tally: &mut MembershipTally) {
        for entry in &self.entries {
            tally.add_athlete(entry.athlete.as_ref().and_then(|athlete| athlete.id()));
        }
    }
}

impl RosterAdapter for CoachIdList {
    fn normalize(&self, tally: &mut MembershipTally) {
        for member in &self.ids {
            tally.add_coach(member.id());
        }
    }
}

impl RosterAdapter for LegacyMemberList {
    fn normalize(&self, tally: &mut MembershipTally) {
        for member in &self.ids {
            let id = member.id();
            tally.add_athlete(id.clone());
            tally.add_coach(id);
        }
    }
}

impl RosterAdapter for MembershipRecord {
    fn normalize(&self, tally: &mut MembershipTally) {
        match self {
            MembershipRecord::AthleteIds(roster) => roster.normalize(tally),
            MembershipRecord::AthleteEntries(roster) => roster.normalize(tally),
            MembershipRecord::CoachIds(roster) => roster.normalize(tally),
            MembershipRecord::LegacyMembers(roster) => roster.normalize(tally),
        }
    }
}

pub fn count_groups(groups: &[Group]) -> MembershipCount {
    let mut tally = MembershipTally::default();
    for group in groups {
        tally.absorb_group(group);
    }
    tally.counts()
}
