//! In-memory [`RecordStore`] that behaves like the remote store and records
//! every request it receives.

use crate::error::StoreError;
use crate::store::RecordStore;
use async_trait::async_trait;
use leaddesk_protocol::BulkDeleteRequest;
use leaddesk_protocol::BulkDeleteResponse;
use leaddesk_protocol::BulkUpdateRequest;
use leaddesk_protocol::BulkUpdateResponse;
use leaddesk_protocol::Lead;
use leaddesk_protocol::LeadPatch;
use leaddesk_protocol::ListParams;
use leaddesk_protocol::ListResponse;
use leaddesk_protocol::SortKey;
use leaddesk_protocol::SortOrder;
use std::cmp::Ordering;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockCall {
    List(ListParams),
    Update(String, LeadPatch),
    BulkUpdate(BulkUpdateRequest),
    BulkDelete(BulkDeleteRequest),
}

#[derive(Default)]
struct Failures {
    /// `(successful lists left, error to return afterwards)`
    list: Option<(usize, StoreError)>,
    mutation: Option<StoreError>,
    /// `(1-based list call, token to cancel while serving it)`
    cancel: Option<(usize, CancellationToken)>,
}

#[derive(Default)]
pub struct MockRecordStore {
    leads: Mutex<Vec<Lead>>,
    calls: Mutex<Vec<MockCall>>,
    failures: Mutex<Failures>,
}

impl MockRecordStore {
    pub fn new(leads: Vec<Lead>) -> Self {
        Self {
            leads: Mutex::new(leads),
            ..Default::default()
        }
    }

    /// Lets `successes` list calls through, then fails every later one.
    pub fn fail_lists_after(&self, successes: usize, err: StoreError) {
        lock(&self.failures).list = Some((successes, err));
    }

    /// Cancels `token` while serving the `nth` list call. That call still
    /// returns its records.
    pub fn cancel_during_list(&self, nth: usize, token: CancellationToken) {
        lock(&self.failures).cancel = Some((nth, token));
    }

    /// Fails every update, bulk update, and bulk delete.
    pub fn fail_mutations(&self, err: StoreError) {
        lock(&self.failures).mutation = Some(err);
    }

    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    pub fn list_calls(&self) -> Vec<ListParams> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::List(params) => Some(params),
                _ => None,
            })
            .collect()
    }

    pub fn leads(&self) -> Vec<Lead> {
        lock(&self.leads).clone()
    }

    pub fn lead(&self, id: &str) -> Option<Lead> {
        lock(&self.leads).iter().find(|lead| lead.id == id).cloned()
    }

    fn record(&self, call: MockCall) {
        lock(&self.calls).push(call);
    }

    fn mutation_failure(&self) -> Result<(), StoreError> {
        match &lock(&self.failures).mutation {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn list(&self, params: &ListParams) -> Result<ListResponse, StoreError> {
        self.record(MockCall::List(params.clone()));
        let served = self.list_calls().len();
        {
            let mut failures = lock(&self.failures);
            if let Some((nth, token)) = &failures.cancel
                && *nth == served
            {
                token.cancel();
            }
            if let Some((remaining, err)) = failures.list.as_mut() {
                if *remaining == 0 {
                    return Err(err.clone());
                }
                *remaining -= 1;
            }
        }

        let mut matching: Vec<Lead> = lock(&self.leads)
            .iter()
            .filter(|lead| matches(lead, params))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            let ordering = compare(a, b, params.sort_by).then_with(|| a.id.cmp(&b.id));
            match params.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matching.len() as u64;
        let skip = usize::try_from(params.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(params.limit).unwrap_or(usize::MAX);
        let items = matching.into_iter().skip(skip).take(limit).collect();
        Ok(ListResponse {
            items,
            total,
            skip: params.skip,
            limit: params.limit,
        })
    }

    async fn update(&self, id: &str, patch: &LeadPatch) -> Result<Lead, StoreError> {
        self.record(MockCall::Update(id.to_string(), patch.clone()));
        self.mutation_failure()?;
        let mut leads = lock(&self.leads);
        let lead = leads
            .iter_mut()
            .find(|lead| lead.id == id)
            .ok_or_else(|| StoreError::Status {
                status: 404,
                message: format!("lead {id} not found"),
            })?;
        patch.apply_to(lead);
        lead.updated_at = OffsetDateTime::now_utc();
        Ok(lead.clone())
    }

    async fn bulk_update(
        &self,
        request: &BulkUpdateRequest,
    ) -> Result<BulkUpdateResponse, StoreError> {
        self.record(MockCall::BulkUpdate(request.clone()));
        self.mutation_failure()?;
        let now = OffsetDateTime::now_utc();
        let mut updated = 0;
        for lead in lock(&self.leads).iter_mut() {
            if request.ids.contains(&lead.id) {
                request.patch.apply_to(lead);
                lead.updated_at = now;
                updated += 1;
            }
        }
        Ok(BulkUpdateResponse { updated })
    }

    async fn bulk_delete(
        &self,
        request: &BulkDeleteRequest,
    ) -> Result<BulkDeleteResponse, StoreError> {
        self.record(MockCall::BulkDelete(request.clone()));
        self.mutation_failure()?;
        let mut leads = lock(&self.leads);
        let before = leads.len();
        leads.retain(|lead| !request.ids.contains(&lead.id));
        Ok(BulkDeleteResponse {
            deleted: (before - leads.len()) as u64,
        })
    }
}

/// A lead in unit `unit` named after its id, created at the Unix epoch.
pub fn sample_lead(id: &str) -> Lead {
    Lead {
        id: id.to_string(),
        name: id.to_string(),
        phone: None,
        email: None,
        comment: None,
        status_id: None,
        tag_id: None,
        assigned_to: Vec::new(),
        unit_id: "unit".to_string(),
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

/// `count` unassigned sample leads with ids `L000`, `L001`, ...
pub fn sample_leads(count: usize) -> Vec<Lead> {
    (0..count).map(|n| sample_lead(&format!("L{n:03}"))).collect()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|value| value.to_lowercase().contains(&needle.to_lowercase()))
}

fn matches(lead: &Lead, params: &ListParams) -> bool {
    if lead.unit_id != params.unit_id {
        return false;
    }
    if let Some(term) = &params.search {
        let hit = [
            Some(lead.name.as_str()),
            lead.phone.as_deref(),
            lead.email.as_deref(),
            lead.comment.as_deref(),
        ]
        .into_iter()
        .any(|field| contains_ci(field, term));
        if !hit {
            return false;
        }
    }
    let field_filters = [
        (Some(lead.name.as_str()), params.name.as_deref()),
        (lead.phone.as_deref(), params.phone.as_deref()),
        (lead.email.as_deref(), params.email.as_deref()),
    ];
    for (value, filter) in field_filters {
        if let Some(filter) = filter
            && !contains_ci(value, filter)
        {
            return false;
        }
    }
    if params.status_id.is_some() && lead.status_id != params.status_id {
        return false;
    }
    if params.tag_id.is_some() && lead.tag_id != params.tag_id {
        return false;
    }
    if let Some(user) = &params.assigned_to
        && !lead.is_assigned_to(user)
    {
        return false;
    }
    if params.unassigned_only == Some(true) && !lead.is_unassigned() {
        return false;
    }
    let created = lead.created_at.date();
    if params.date_from.is_some_and(|from| created < from) {
        return false;
    }
    if params.date_to.is_some_and(|to| created > to) {
        return false;
    }
    true
}

fn compare(a: &Lead, b: &Lead, key: SortKey) -> Ordering {
    match key {
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Phone => a.phone.cmp(&b.phone),
        SortKey::Email => a.email.cmp(&b.email),
        SortKey::Status => a.status_id.cmp(&b.status_id),
    }
}
