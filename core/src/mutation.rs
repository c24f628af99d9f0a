//! Inline and bulk mutations against the record store.
//!
//! The coordinator only talks to the store. Reconciling the local page is the
//! caller's job: [`reconcile_inline`] for single-record edits, a wholesale
//! refetch after bulk operations.

use crate::error::MutationError;
use crate::fetcher::PageState;
use crate::fetcher::Reconciled;
use crate::query::QueryDescriptor;
use crate::scope::belongs_to_scope;
use crate::store::RecordStore;
use leaddesk_protocol::BulkDeleteRequest;
use leaddesk_protocol::BulkDeleteResponse;
use leaddesk_protocol::BulkUpdateRequest;
use leaddesk_protocol::BulkUpdateResponse;
use leaddesk_protocol::FieldPatch;
use leaddesk_protocol::Lead;
use leaddesk_protocol::LeadId;
use leaddesk_protocol::LeadPatch;
use std::sync::Arc;
use tracing::debug;
use tracing::info;

#[derive(Clone)]
pub struct MutationCoordinator {
    store: Arc<dyn RecordStore>,
}

impl MutationCoordinator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Sends a single-record patch and returns the record as stored.
    pub async fn update_field(&self, id: &str, patch: &LeadPatch) -> Result<Lead, MutationError> {
        validate_patch(patch)?;
        debug!(lead = id, "updating lead");
        Ok(self.store.update(id, patch).await?)
    }

    /// One request for the whole id set, however large.
    pub async fn bulk_update(
        &self,
        ids: &[LeadId],
        patch: &LeadPatch,
    ) -> Result<BulkUpdateResponse, MutationError> {
        if ids.is_empty() {
            return Err(MutationError::EmptySelection);
        }
        validate_patch(patch)?;
        let request = BulkUpdateRequest {
            ids: ids.to_vec(),
            patch: patch.clone(),
        };
        let response = self.store.bulk_update(&request).await?;
        info!(requested = ids.len(), updated = response.updated, "bulk update committed");
        Ok(response)
    }

    pub async fn bulk_delete(&self, ids: &[LeadId]) -> Result<BulkDeleteResponse, MutationError> {
        if ids.is_empty() {
            return Err(MutationError::EmptySelection);
        }
        let request = BulkDeleteRequest { ids: ids.to_vec() };
        let response = self.store.bulk_delete(&request).await?;
        info!(requested = ids.len(), deleted = response.deleted, "bulk delete committed");
        Ok(response)
    }
}

/// Rejects patches the store would refuse or that would do nothing.
pub fn validate_patch(patch: &LeadPatch) -> Result<(), MutationError> {
    if patch.is_empty() {
        return Err(MutationError::InvalidPatch("nothing to change".to_string()));
    }
    match &patch.name {
        FieldPatch::Clear => {
            return Err(MutationError::InvalidPatch("name cannot be cleared".to_string()));
        }
        FieldPatch::Set(name) if name.trim().is_empty() => {
            return Err(MutationError::InvalidPatch("name cannot be blank".to_string()));
        }
        FieldPatch::Set(_) | FieldPatch::Unchanged => {}
    }
    Ok(())
}

/// Folds a confirmed single-record update into the page: replaced in place
/// while it still belongs to the view, dropped (and the total decremented)
/// otherwise.
pub fn reconcile_inline(
    page: &mut PageState,
    lead: Lead,
    query: &QueryDescriptor,
    operator: &str,
) -> Reconciled {
    let keep = belongs_to_scope(&lead, query, operator);
    let id = lead.id.clone();
    let outcome = page.reconcile(lead, keep);
    if outcome == Reconciled::Removed {
        debug!(lead = %id, "lead left the view after update");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::fetcher::FetchCompletion;
    use crate::fetcher::FetchOutcome;
    use crate::mock::MockCall;
    use crate::mock::MockRecordStore;
    use crate::mock::sample_leads;
    use leaddesk_protocol::ListResponse;
    use pretty_assertions::assert_eq;

    fn assign(user: &str) -> LeadPatch {
        LeadPatch {
            assigned_to: FieldPatch::Set(vec![user.to_string()]),
            ..Default::default()
        }
    }

    #[test]
    fn validation_rejects_empty_and_nameless_patches() {
        assert!(validate_patch(&LeadPatch::default()).is_err());
        assert!(
            validate_patch(&LeadPatch {
                name: FieldPatch::Clear,
                ..Default::default()
            })
            .is_err()
        );
        assert!(
            validate_patch(&LeadPatch {
                name: FieldPatch::Set(" ".to_string()),
                ..Default::default()
            })
            .is_err()
        );
        assert!(validate_patch(&assign("u1")).is_ok());
    }

    #[tokio::test]
    async fn bulk_update_is_a_single_request() -> anyhow::Result<()> {
        let store = Arc::new(MockRecordStore::new(sample_leads(300)));
        let coordinator = MutationCoordinator::new(store.clone());
        let ids: Vec<LeadId> = store.leads().into_iter().map(|lead| lead.id).collect();

        let response = coordinator.bulk_update(&ids, &assign("u1")).await?;

        assert_eq!(response.updated, 300);
        assert_eq!(store.calls().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn bulk_update_status_tri_state() -> anyhow::Result<()> {
        let mut leads = sample_leads(4);
        for lead in &mut leads {
            lead.status_id = Some("open".to_string());
        }
        let store = Arc::new(MockRecordStore::new(leads));
        let coordinator = MutationCoordinator::new(store.clone());
        let ids = vec!["L000".to_string(), "L001".to_string()];

        coordinator
            .bulk_update(
                &ids,
                &LeadPatch {
                    comment: FieldPatch::Set("called".to_string()),
                    ..Default::default()
                },
            )
            .await?;
        for id in &ids {
            assert_eq!(
                store.lead(id).and_then(|lead| lead.status_id),
                Some("open".to_string())
            );
        }

        coordinator
            .bulk_update(
                &ids,
                &LeadPatch {
                    status_id: FieldPatch::Clear,
                    ..Default::default()
                },
            )
            .await?;
        for id in &ids {
            assert_eq!(store.lead(id).and_then(|lead| lead.status_id), None);
        }
        assert_eq!(
            store.lead("L002").and_then(|lead| lead.status_id),
            Some("open".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn empty_selection_sends_nothing() {
        let store = Arc::new(MockRecordStore::new(sample_leads(1)));
        let coordinator = MutationCoordinator::new(store.clone());

        assert_eq!(
            coordinator.bulk_delete(&[]).await,
            Err(MutationError::EmptySelection)
        );
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn store_rejection_is_reported() {
        let store = Arc::new(MockRecordStore::new(sample_leads(1)));
        let rejection = StoreError::Validation {
            message: "statusId unknown".to_string(),
        };
        store.fail_mutations(rejection.clone());
        let coordinator = MutationCoordinator::new(store.clone());

        let result = coordinator
            .update_field(
                "L000",
                &LeadPatch {
                    status_id: FieldPatch::Set("nope".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(result, Err(MutationError::Store(rejection)));
        assert!(matches!(store.calls()[0], MockCall::Update(..)));
    }

    #[tokio::test]
    async fn assigning_in_unassigned_view_drops_the_row() -> anyhow::Result<()> {
        let store = Arc::new(MockRecordStore::new(sample_leads(3)));
        let coordinator = MutationCoordinator::new(store.clone());
        let mut page = PageState::default();
        let ticket = page.begin();
        page.complete(FetchCompletion {
            ticket,
            outcome: FetchOutcome::Loaded(ListResponse {
                items: store.leads(),
                total: 3,
                skip: 0,
                limit: 20,
            }),
        });
        let query = QueryDescriptor::default();

        let updated = coordinator.update_field("L001", &assign("u7")).await?;
        let outcome = reconcile_inline(&mut page, updated, &query, "me");

        assert_eq!(outcome, Reconciled::Removed);
        assert_eq!(page.ids(), vec!["L000".to_string(), "L002".to_string()]);
        assert_eq!(page.total(), 2);
        Ok(())
    }
}
