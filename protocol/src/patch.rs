use crate::lead::Lead;
use crate::lead::LeadId;
use crate::lead::StatusId;
use crate::lead::TagId;
use crate::lead::UserId;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

/// Per-field edit instruction.
///
/// `Unchanged` is omitted from payloads entirely, `Clear` travels as `null`,
/// and `Set` carries the new value. Fields must be declared with
/// `#[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]` so a
/// missing key decodes back to `Unchanged`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FieldPatch<T> {
    #[default]
    Unchanged,
    Clear,
    Set(T),
}

impl<T> FieldPatch<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Unchanged | Self::Clear => None,
        }
    }

    /// Builds a patch from two mutually exclusive inputs: a new value and a
    /// "clear" switch.
    pub fn from_parts(value: Option<T>, clear: bool) -> Self {
        match (value, clear) {
            (Some(value), _) => Self::Set(value),
            (None, true) => Self::Clear,
            (None, false) => Self::Unchanged,
        }
    }
}

impl<T: Clone> FieldPatch<T> {
    /// Resolves the patch against the current value of an optional field.
    pub fn resolve(&self, current: Option<T>) -> Option<T> {
        match self {
            Self::Unchanged => current,
            Self::Clear => None,
            Self::Set(value) => Some(value.clone()),
        }
    }

    pub fn apply_to(&self, target: &mut Option<T>) {
        *target = self.resolve(target.take());
    }
}

impl<T: Serialize> Serialize for FieldPatch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Set(value) => value.serialize(serializer),
            Self::Unchanged | Self::Clear => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldPatch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Self::Set(value),
            None => Self::Clear,
        })
    }
}

/// Body of `PATCH /records/:id` and the field part of a bulk update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadPatch {
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub name: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub phone: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub email: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub comment: FieldPatch<String>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub status_id: FieldPatch<StatusId>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub tag_id: FieldPatch<TagId>,
    #[serde(default, skip_serializing_if = "FieldPatch::is_unchanged")]
    pub assigned_to: FieldPatch<Vec<UserId>>,
}

impl LeadPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_unchanged()
            && self.phone.is_unchanged()
            && self.email.is_unchanged()
            && self.comment.is_unchanged()
            && self.status_id.is_unchanged()
            && self.tag_id.is_unchanged()
            && self.assigned_to.is_unchanged()
    }

    /// Applies the patch the way the record store does. A `Clear` on the
    /// required `name` is a no-op.
    pub fn apply_to(&self, lead: &mut Lead) {
        if let FieldPatch::Set(name) = &self.name {
            lead.name.clone_from(name);
        }
        self.phone.apply_to(&mut lead.phone);
        self.email.apply_to(&mut lead.email);
        self.comment.apply_to(&mut lead.comment);
        self.status_id.apply_to(&mut lead.status_id);
        self.tag_id.apply_to(&mut lead.tag_id);
        match &self.assigned_to {
            FieldPatch::Unchanged => {}
            FieldPatch::Clear => lead.assigned_to.clear(),
            FieldPatch::Set(users) => lead.assigned_to.clone_from(users),
        }
    }
}

/// Body of `PATCH /records/bulk`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdateRequest {
    pub ids: Vec<LeadId>,
    #[serde(flatten)]
    pub patch: LeadPatch,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkUpdateResponse {
    pub updated: u64,
}

/// Body of `POST /records/bulk-delete`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<LeadId>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDeleteResponse {
    pub deleted: u64,
}
