//! Translates a view scope plus the explicit filters into record store
//! parameters, and decides whether a record still belongs to the view.

use crate::query::QueryDescriptor;
use crate::query::TextFilter;
use leaddesk_protocol::Lead;
use leaddesk_protocol::ListParams;
use leaddesk_protocol::Scope;
use leaddesk_protocol::UserId;

/// What the view requires of a record's assignees.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssigneeConstraint {
    Any,
    AssignedTo(UserId),
    UnassignedOnly,
}

impl AssigneeConstraint {
    pub fn matches(&self, lead: &Lead) -> bool {
        match self {
            Self::Any => true,
            Self::AssignedTo(user) => lead.is_assigned_to(user),
            Self::UnassignedOnly => lead.is_unassigned(),
        }
    }
}

/// `mine` always means the operator. Otherwise an explicit assignee filter
/// wins; without one, `unassigned` narrows to unassigned records and
/// `unit-wide` adds no constraint.
pub fn resolve_assignee(scope: Scope, filter: Option<&str>, operator: &str) -> AssigneeConstraint {
    match (scope, filter) {
        (Scope::Mine, _) => AssigneeConstraint::AssignedTo(operator.to_string()),
        (Scope::Unassigned | Scope::UnitWide, Some(user)) => {
            AssigneeConstraint::AssignedTo(user.to_string())
        }
        (Scope::UnitWide, None) => AssigneeConstraint::Any,
        (Scope::Unassigned, None) => AssigneeConstraint::UnassignedOnly,
    }
}

pub fn list_params(
    unit_id: &str,
    query: &QueryDescriptor,
    operator: &str,
    skip: u64,
    limit: u64,
) -> ListParams {
    let mut params = ListParams {
        unit_id: unit_id.to_string(),
        skip,
        limit,
        status_id: query.status_id.clone(),
        tag_id: query.tag_id.clone(),
        date_from: query.dates.from,
        date_to: query.dates.to,
        sort_by: query.sort.key,
        sort_order: query.sort.order,
        ..Default::default()
    };
    match &query.text {
        TextFilter::Search(term) => params.search = Some(term.clone()),
        TextFilter::Fields(fields) => {
            params.name = fields.name.clone();
            params.phone = fields.phone.clone();
            params.email = fields.email.clone();
        }
    }
    match resolve_assignee(query.scope, query.assigned_to.as_deref(), operator) {
        AssigneeConstraint::Any => {}
        AssigneeConstraint::AssignedTo(user) => params.assigned_to = Some(user),
        AssigneeConstraint::UnassignedOnly => params.unassigned_only = Some(true),
    }
    params
}

/// Parameters for the page the descriptor points at.
pub fn page_params(unit_id: &str, query: &QueryDescriptor, operator: &str) -> ListParams {
    list_params(
        unit_id,
        query,
        operator,
        query.offset(),
        u64::from(query.page_size.get()),
    )
}

/// Whether `lead` still satisfies the view that listed it.
///
/// Checks the assignee constraint and the exact-match status and tag filters.
/// Text and date filters are left to the record store.
pub fn belongs_to_scope(lead: &Lead, query: &QueryDescriptor, operator: &str) -> bool {
    let assignee = resolve_assignee(query.scope, query.assigned_to.as_deref(), operator);
    if !assignee.matches(lead) {
        return false;
    }
    if let Some(status) = &query.status_id
        && lead.status_id.as_ref() != Some(status)
    {
        return false;
    }
    if let Some(tag) = &query.tag_id
        && lead.tag_id.as_ref() != Some(tag)
    {
        return false;
    }
    true
}
