use crate::lead::Lead;
use crate::lead::StatusId;
use crate::lead::TagId;
use crate::lead::UnitId;
use crate::lead::UserId;
use serde::Deserialize;
use serde::Serialize;
use serde_with::skip_serializing_none;
use strum_macros::AsRefStr;
use strum_macros::Display;
use strum_macros::EnumString;
use time::Date;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
    Phone,
    Email,
    Status,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Named view filter deciding which records are visible independently of the
/// explicit filter fields.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Scope {
    /// Records nobody is assigned to. An explicit assignee filter overrides it.
    #[default]
    Unassigned,
    /// Every record of the unit.
    UnitWide,
    /// Records assigned to the current operator.
    Mine,
}

/// Query string of `GET /records`.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub unit_id: UnitId,
    pub skip: u64,
    pub limit: u64,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status_id: Option<StatusId>,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    #[serde(default)]
    pub unassigned_only: Option<bool>,
    #[serde(default)]
    pub tag_id: Option<TagId>,
    #[serde(default, with = "crate::date::iso_date_opt")]
    pub date_from: Option<Date>,
    #[serde(default, with = "crate::date::iso_date_opt")]
    pub date_to: Option<Date>,
    #[serde(default)]
    pub sort_by: SortKey,
    #[serde(default)]
    pub sort_order: SortOrder,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListResponse {
    pub items: Vec<Lead>,
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}
