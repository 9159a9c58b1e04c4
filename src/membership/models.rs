use serde::{Deserialize, Serialize};
use serde_json::Value;

// key: membership-club-model

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ClubPayload")]
pub struct Club {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ClubPayload {
    #[serde(default, rename = "_id")]
    object_id: Option<MemberRef>,
    #[serde(default)]
    id: Option<MemberRef>,
    #[serde(default)]
    name: String,
}

impl TryFrom<ClubPayload> for Club {
    type Error = String;

    fn try_from(payload: ClubPayload) -> Result<Self, Self::Error> {
        Ok(Club {
            id: document_id(payload.object_id, payload.id).ok_or("club without `_id`")?,
            name: payload.name,
        })
    }
}

/// Resolves a document key that may arrive as `_id`, `id` or both. Stores that
/// add a virtual `id` next to `_id` send both; `_id` wins.
pub fn document_id(object_id: Option<MemberRef>, id: Option<MemberRef>) -> Option<String> {
    object_id
        .and_then(|value| value.id())
        .or_else(|| id.and_then(|value| value.id()))
}

// key: membership-group-model -> fee plus normalized rosters

/// The API delivers rosters as several overlapping legacy fields; they are
/// converted into [`MembershipRecord`] variants when the group is decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GroupPayload")]
pub struct Group {
    pub id: String,
    pub club_id: Option<String>,
    pub name: String,
    pub monthly_fee: f64,
    pub rosters: Vec<MembershipRecord>,
}

/// An identifier as it appears in a roster: a bare string or number, or an
/// embedded document carrying `_id`/`id`. Anything else is kept but yields no id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberRef {
    Text(String),
    Number(serde_json::Number),
    Embedded(EmbeddedMember),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedMember {
    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<Box<MemberRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Box<MemberRef>>,
}

impl MemberRef {
    /// Identifier coerced to its string form.
    pub fn id(&self) -> Option<String> {
        match self {
            MemberRef::Text(value) => Some(value.clone()),
            MemberRef::Number(value) => Some(value.to_string()),
            MemberRef::Embedded(embedded) => embedded
                .object_id
                .as_deref()
                .and_then(MemberRef::id)
                .or_else(|| embedded.id.as_deref().and_then(MemberRef::id)),
            MemberRef::Other(_) => None,
        }
    }
}

impl From<&str> for MemberRef {
    fn from(value: &str) -> Self {
        MemberRef::Text(value.to_string())
    }
}

/// Entry of the membership-entry roster; `athlete` may be missing on stale rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteMembership {
    #[serde(default)]
    pub athlete: Option<MemberRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AthleteIdList {
    pub ids: Vec<MemberRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AthleteEntryList {
    pub entries: Vec<AthleteMembership>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoachIdList {
    pub ids: Vec<MemberRef>,
}

/// Generic `members` array of older groups. Entries carry no role, so each one
/// counts as an athlete and as a coach.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyMemberList {
    pub ids: Vec<MemberRef>,
}

// key: membership-roster-union -> one variant per legacy roster shape

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MembershipRecord {
    AthleteIds(AthleteIdList),
    AthleteEntries(AthleteEntryList),
    CoachIds(CoachIdList),
    LegacyMembers(LegacyMemberList),
}

/// Wire form of a group as served by the club administration API.
#[derive(Debug, Deserialize)]
struct GroupPayload {
    #[serde(default, rename = "_id")]
    object_id: Option<MemberRef>,
    #[serde(default)]
    id: Option<MemberRef>,
    #[serde(default, alias = "club")]
    club_id: Option<MemberRef>,
    #[serde(default)]
    name: String,
    #[serde(default, alias = "monthlyFee")]
    monthly_fee: Option<f64>,
    #[serde(default)]
    athletes: Option<Vec<MemberRef>>,
    #[serde(default, alias = "athleteMemberships")]
    athlete_memberships: Option<Vec<AthleteMembership>>,
    #[serde(default)]
    coaches: Option<Vec<MemberRef>>,
    #[serde(default)]
    members: Option<Vec<MemberRef>>,
    /// Already-normalized rosters, as produced by serializing a [`Group`].
    #[serde(default)]
    rosters: Vec<MembershipRecord>,
}

impl TryFrom<GroupPayload> for Group {
    type Error = String;

    fn try_from(payload: GroupPayload) -> Result<Self, Self::Error> {
        let id = document_id(payload.object_id, payload.id).ok_or("group without `_id`")?;
        let mut rosters = payload.rosters;
        if let Some(ids) = payload.athletes {
            rosters.push(MembershipRecord::AthleteIds(AthleteIdList { ids }));
        }
        if let Some(entries) = payload.athlete_memberships {
            rosters.push(MembershipRecord::AthleteEntries(AthleteEntryList { entries }));
        }
        if let Some(ids) = payload.coaches {
            rosters.push(MembershipRecord::CoachIds(CoachIdList { ids }));
        }
        if let Some(ids) = payload.members {
            rosters.push(MembershipRecord::LegacyMembers(LegacyMemberList { ids }));
        }

        Ok(Group {
            id,
            club_id: payload.club_id.and_then(|club| club.id()),
            name: payload.name,
            monthly_fee: payload.monthly_fee.unwrap_or_default(),
            rosters,
        })
    }
}
