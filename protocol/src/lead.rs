use serde::Deserialize;
use serde::Serialize;
use serde_with::skip_serializing_none;
use time::OffsetDateTime;

pub type LeadId = String;
pub type StatusId = String;
pub type TagId = String;
pub type UserId = String;
pub type UnitId = String;

/// A record as returned by the record store.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: LeadId,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub status_id: Option<StatusId>,
    #[serde(default)]
    pub tag_id: Option<TagId>,
    #[serde(default)]
    pub assigned_to: Vec<UserId>,
    pub unit_id: UnitId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Lead {
    pub fn is_unassigned(&self) -> bool {
        self.assigned_to.is_empty()
    }

    pub fn is_assigned_to(&self, user: &str) -> bool {
        self.assigned_to.iter().any(|id| id == user)
    }
}
