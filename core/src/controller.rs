//! Page-level façade the presentation layer drives.
//!
//! Every state transition takes `&mut self`. Work that has to wait on the
//! record store either runs to completion inside an `async` method or is
//! split into a [`FetchRequest`] the caller runs and a [`FetchCompletion`] it
//! hands back, so several fetches can be in flight while only the most recent
//! one lands.

use crate::address;
use crate::error::ExpandError;
use crate::error::MutationError;
use crate::expander::MatchingSetExpander;
use crate::fetcher::Applied;
use crate::fetcher::FetchCompletion;
use crate::fetcher::FetchRequest;
use crate::fetcher::ListFetcher;
use crate::fetcher::PageState;
use crate::fetcher::Reconciled;
use crate::mutation::MutationCoordinator;
use crate::mutation::reconcile_inline;
use crate::notice::Notice;
use crate::query::QueryDescriptor;
use crate::query::QueryUpdate;
use crate::scope::page_params;
use crate::selection::PageCheckState;
use crate::selection::SelectionSet;
use crate::session::SessionContext;
use crate::store::RecordStore;
use leaddesk_protocol::LeadPatch;
use leaddesk_protocol::UnitId;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;

pub struct LeadListController {
    store: Arc<dyn RecordStore>,
    fetcher: ListFetcher,
    mutations: MutationCoordinator,
    session: SessionContext,
    /// Child of the session token, replaced on every unit switch.
    context: CancellationToken,
    unit_id: UnitId,
    address: String,
    query: QueryDescriptor,
    page: PageState,
    selection: SelectionSet,
    notices: Vec<Notice>,
    chunk_size: u32,
}

impl LeadListController {
    pub fn new(
        store: Arc<dyn RecordStore>,
        session: SessionContext,
        unit_id: impl Into<UnitId>,
        chunk_size: u32,
    ) -> Self {
        let context = session.cancellation().child_token();
        Self {
            fetcher: ListFetcher::new(store.clone()),
            mutations: MutationCoordinator::new(store.clone()),
            store,
            session,
            context,
            unit_id: unit_id.into(),
            address: String::new(),
            query: QueryDescriptor::default(),
            page: PageState::default(),
            selection: SelectionSet::default(),
            notices: Vec::new(),
            chunk_size,
        }
    }

    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    /// The normalized address of the current view.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn query(&self) -> &QueryDescriptor {
        &self.query
    }

    pub fn page(&self) -> &PageState {
        &self.page
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// A handle for running [`FetchRequest`]s outside the controller.
    pub fn fetcher(&self) -> ListFetcher {
        self.fetcher.clone()
    }

    pub fn page_check_state(&self) -> PageCheckState {
        self.selection.page_check_state(&self.page.ids())
    }

    /// Header checkbox click for the rows currently shown.
    pub fn toggle_page_selection(&mut self) {
        let ids = self.page.ids();
        self.selection.toggle_page(&ids);
    }

    /// Moves to `address`. Returns the fetch to run when the view changed.
    pub fn navigate(&mut self, address: &str) -> Option<FetchRequest> {
        let query = address::decode(address);
        self.show(query)
    }

    /// Points the controller at `address` without loading its page, for work
    /// that only needs the view's filters.
    pub fn set_address(&mut self, address: &str) {
        self.query = address::decode(address);
        self.address = address::encode(&self.query);
    }

    /// Applies `update` to the current view. The new address is available
    /// from [`Self::address`] afterwards.
    pub fn update_query(&mut self, update: QueryUpdate) -> Option<FetchRequest> {
        let query = self.query.apply(&update);
        self.show(query)
    }

    fn show(&mut self, query: QueryDescriptor) -> Option<FetchRequest> {
        let address = address::encode(&query);
        if address == self.address {
            return None;
        }
        debug!(%address, "view changed");
        self.address = address;
        self.query = query;
        Some(self.request_fetch())
    }

    /// Starts a fetch of the current page, superseding any fetch in flight.
    pub fn request_fetch(&mut self) -> FetchRequest {
        let ticket = self.page.begin();
        FetchRequest {
            ticket,
            params: page_params(&self.unit_id, &self.query, self.session.operator_id()),
            cancel: self.context.child_token(),
        }
    }

    pub fn complete_fetch(&mut self, completion: FetchCompletion) -> Applied {
        let applied = self.page.complete(completion);
        if let Applied::Failed(err) = &applied {
            self.notices.push(Notice::error(format!("Could not load leads: {err}")));
        }
        applied
    }

    /// Fetches the current page and waits for it.
    pub async fn reload(&mut self) -> Applied {
        let request = self.request_fetch();
        let completion = self.fetcher.fetch(request).await;
        self.complete_fetch(completion)
    }

    /// Switches to another unit: in-flight work for the old unit is cancelled
    /// and discarded, the selection is cleared, and the view goes back to its
    /// first page.
    pub fn set_unit(&mut self, unit_id: impl Into<UnitId>) -> FetchRequest {
        self.context.cancel();
        self.context = self.session.cancellation().child_token();
        self.page.invalidate();
        self.selection.clear();
        self.unit_id = unit_id.into();
        self.query = self.query.with_page(0);
        self.address = address::encode(&self.query);
        info!(unit = %self.unit_id, "switched unit");
        self.request_fetch()
    }

    /// Ends the session. Everything in flight stops and its results are
    /// dropped.
    pub fn logout(&mut self) {
        self.session.logout();
        self.page.invalidate();
    }

    /// Replaces the selection with every lead matching the current view,
    /// across all pages. Returns the number of selected leads.
    pub async fn select_matching(&mut self, cancel: &CancellationToken) -> Result<usize, ExpandError> {
        let expander =
            MatchingSetExpander::new(self.store.clone(), self.chunk_size, self.context.clone());
        let result = expander
            .expand(&self.unit_id, &self.query, self.session.operator_id(), cancel)
            .await;
        match result {
            Ok(ids) => {
                let count = ids.len();
                self.selection.replace_with(ids);
                self.notices.push(Notice::info(format!("Selected {count} matching leads")));
                Ok(count)
            }
            Err(err) => {
                if let ExpandError::Chunk { .. } = &err {
                    self.notices.push(Notice::error(err.to_string()));
                }
                Err(err)
            }
        }
    }

    /// Patches one lead and reconciles the page without refetching.
    pub async fn update_lead(
        &mut self,
        id: &str,
        patch: &LeadPatch,
    ) -> Result<Reconciled, MutationError> {
        match self.mutations.update_field(id, patch).await {
            Ok(lead) => Ok(reconcile_inline(
                &mut self.page,
                lead,
                &self.query,
                self.session.operator_id(),
            )),
            Err(err) => {
                self.notices.push(Notice::error(format!("Update failed: {err}")));
                Err(err)
            }
        }
    }

    /// Applies `patch` to every selected lead. Returns the updated count.
    pub async fn bulk_update(&mut self, patch: &LeadPatch) -> Result<u64, MutationError> {
        let ids = self.selection.ids();
        match self.mutations.bulk_update(&ids, patch).await {
            Ok(response) => {
                self.selection.clear();
                self.notices
                    .push(Notice::info(format!("Updated {} leads", response.updated)));
                self.refresh_after_bulk().await;
                Ok(response.updated)
            }
            Err(err) => {
                self.notices.push(Notice::error(format!("Bulk update failed: {err}")));
                Err(err)
            }
        }
    }

    /// Deletes every selected lead. Returns the deleted count.
    pub async fn bulk_delete(&mut self) -> Result<u64, MutationError> {
        let ids = self.selection.ids();
        match self.mutations.bulk_delete(&ids).await {
            Ok(response) => {
                self.selection.clear();
                self.notices
                    .push(Notice::info(format!("Deleted {} leads", response.deleted)));
                self.refresh_after_bulk().await;
                Ok(response.deleted)
            }
            Err(err) => {
                self.notices.push(Notice::error(format!("Bulk delete failed: {err}")));
                Err(err)
            }
        }
    }

    /// The operator backed out of a bulk action.
    pub fn cancel_bulk(&mut self) {
        self.selection.clear();
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Refetches the current page; when it came back empty because the
    /// records it held are gone, steps back to the last page that has any.
    async fn refresh_after_bulk(&mut self) {
        if self.reload().await != Applied::Loaded {
            return;
        }
        let total = self.page.total();
        if self.page.items().is_empty() && total > 0 && self.query.page > 0 {
            let last = self.query.last_page(total);
            debug!(page = last, "current page emptied, moving to the last page");
            self.query = self.query.with_page(last);
            self.address = address::encode(&self.query);
            self.reload().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::fetcher::FetchOutcome;
    use crate::mock::MockCall;
    use crate::mock::MockRecordStore;
    use crate::mock::sample_leads;
    use crate::notice::Severity;
    use async_trait::async_trait;
    use leaddesk_protocol::BulkDeleteRequest;
    use leaddesk_protocol::BulkDeleteResponse;
    use leaddesk_protocol::BulkUpdateRequest;
    use leaddesk_protocol::BulkUpdateResponse;
    use leaddesk_protocol::FieldPatch;
    use leaddesk_protocol::Lead;
    use leaddesk_protocol::ListParams;
    use leaddesk_protocol::ListResponse;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::PoisonError;
    use tokio::sync::Notify;

    const OPERATOR: &str = "me";

    fn controller(store: &Arc<MockRecordStore>) -> LeadListController {
        LeadListController::new(store.clone(), SessionContext::new(OPERATOR, None), "unit", 100)
    }

    async fn go(controller: &mut LeadListController, update: QueryUpdate) -> Option<Applied> {
        let request = controller.update_query(update)?;
        let completion = controller.fetcher().fetch(request).await;
        Some(controller.complete_fetch(completion))
    }

    /// Holds list requests that search for a term until that term is opened.
    struct GatedStore {
        inner: MockRecordStore,
        gates: Mutex<HashMap<String, Arc<Notify>>>,
    }

    impl GatedStore {
        fn gate(&self, term: &str) -> Arc<Notify> {
            let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
            gates.entry(term.to_string()).or_default().clone()
        }

        fn open(&self, term: &str) {
            self.gate(term).notify_one();
        }
    }

    #[async_trait]
    impl RecordStore for GatedStore {
        async fn list(&self, params: &ListParams) -> Result<ListResponse, StoreError> {
            if let Some(term) = &params.search {
                self.gate(term).notified().await;
            }
            self.inner.list(params).await
        }

        async fn update(&self, id: &str, patch: &LeadPatch) -> Result<Lead, StoreError> {
            self.inner.update(id, patch).await
        }

        async fn bulk_update(
            &self,
            request: &BulkUpdateRequest,
        ) -> Result<BulkUpdateResponse, StoreError> {
            self.inner.bulk_update(request).await
        }

        async fn bulk_delete(
            &self,
            request: &BulkDeleteRequest,
        ) -> Result<BulkDeleteResponse, StoreError> {
            self.inner.bulk_delete(request).await
        }
    }

    #[tokio::test]
    async fn late_result_of_an_older_fetch_is_discarded() -> anyhow::Result<()> {
        let mut leads = sample_leads(3);
        leads[0].name = "alpha".to_string();
        leads[1].name = "beta one".to_string();
        leads[2].name = "beta two".to_string();
        let store = Arc::new(GatedStore {
            inner: MockRecordStore::new(leads),
            gates: Mutex::default(),
        });
        let mut controller =
            LeadListController::new(store.clone(), SessionContext::new(OPERATOR, None), "unit", 100);

        let fetch_a = controller
            .update_query(QueryUpdate::search("alpha"))
            .ok_or_else(|| anyhow::anyhow!("search should change the view"))?;
        let fetch_b = controller
            .update_query(QueryUpdate::search("beta"))
            .ok_or_else(|| anyhow::anyhow!("search should change the view"))?;
        let fetcher = controller.fetcher();
        let task_a = tokio::spawn({
            let fetcher = fetcher.clone();
            async move { fetcher.fetch(fetch_a).await }
        });
        let task_b = tokio::spawn(async move { fetcher.fetch(fetch_b).await });

        store.open("beta");
        let completion_b = task_b.await?;
        store.open("alpha");
        let completion_a = task_a.await?;

        assert_eq!(controller.complete_fetch(completion_b), Applied::Loaded);
        assert_eq!(controller.complete_fetch(completion_a), Applied::Stale);
        assert_eq!(controller.page().total(), 2);
        assert!(
            controller
                .page()
                .items()
                .iter()
                .all(|lead| lead.name.starts_with("beta"))
        );
        assert_eq!(controller.address(), "search=beta");
        Ok(())
    }

    #[test]
    fn navigate_normalizes_and_skips_unchanged_views() {
        let store = Arc::new(MockRecordStore::new(sample_leads(5)));
        let mut controller = controller(&store);

        let request = controller.navigate("?scope=mine&bogus=1&limit=25");
        assert!(request.is_some());
        assert_eq!(controller.address(), "scope=mine");
        assert_eq!(controller.query().page_size.get(), 20);

        assert!(controller.navigate("scope=mine").is_none());
    }

    #[tokio::test]
    async fn selection_persists_across_pages() -> anyhow::Result<()> {
        let store = Arc::new(MockRecordStore::new(sample_leads(45)));
        let mut controller = controller(&store);
        assert_eq!(controller.reload().await, Applied::Loaded);

        let first = controller.page().ids()[0].clone();
        controller.selection_mut().toggle(&first);
        assert_eq!(controller.page_check_state(), PageCheckState::Indeterminate);

        assert_eq!(go(&mut controller, QueryUpdate::page(1)).await, Some(Applied::Loaded));
        assert_eq!(controller.page_check_state(), PageCheckState::Unchecked);
        assert!(controller.selection().is_selected(&first));

        controller.toggle_page_selection();
        assert_eq!(controller.page_check_state(), PageCheckState::Checked);
        assert_eq!(controller.selection().len(), 21);
        Ok(())
    }

    #[tokio::test]
    async fn inline_update_leaving_the_scope_removes_the_row() -> anyhow::Result<()> {
        let store = Arc::new(MockRecordStore::new(sample_leads(30)));
        let mut controller = controller(&store);
        controller.reload().await;
        let target = controller.page().ids()[3].clone();

        let outcome = controller
            .update_lead(
                &target,
                &LeadPatch {
                    assigned_to: FieldPatch::Set(vec!["u7".to_string()]),
                    ..Default::default()
                },
            )
            .await?;

        assert_eq!(outcome, Reconciled::Removed);
        assert_eq!(controller.page().total(), 29);
        assert_eq!(controller.page().items().len(), 19);
        assert!(!controller.page().ids().contains(&target));
        assert_eq!(store.list_calls().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn inline_update_within_scope_replaces_the_row() -> anyhow::Result<()> {
        let store = Arc::new(MockRecordStore::new(sample_leads(3)));
        let mut controller = controller(&store);
        controller.reload().await;

        let outcome = controller
            .update_lead(
                "L001",
                &LeadPatch {
                    comment: FieldPatch::Set("call back".to_string()),
                    ..Default::default()
                },
            )
            .await?;

        assert_eq!(outcome, Reconciled::Replaced);
        let row = controller.page().items().iter().find(|lead| lead.id == "L001");
        assert_eq!(row.and_then(|lead| lead.comment.as_deref()), Some("call back"));
        assert_eq!(controller.page().total(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn bulk_update_clears_selection_and_refetches() -> anyhow::Result<()> {
        let mut leads = sample_leads(4);
        for lead in &mut leads {
            lead.status_id = Some("open".to_string());
        }
        let store = Arc::new(MockRecordStore::new(leads));
        let mut controller = controller(&store);
        controller.reload().await;
        controller.selection_mut().select_all(["L000", "L001"]);

        let updated = controller
            .bulk_update(&LeadPatch {
                status_id: FieldPatch::Clear,
                ..Default::default()
            })
            .await?;

        assert_eq!(updated, 2);
        assert!(controller.selection().is_empty());
        assert_eq!(store.list_calls().len(), 2);
        assert_eq!(store.lead("L000").and_then(|lead| lead.status_id), None);
        assert_eq!(
            store.lead("L003").and_then(|lead| lead.status_id),
            Some("open".to_string())
        );
        assert_eq!(
            controller.drain_notices(),
            vec![Notice::info("Updated 2 leads")]
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_bulk_mutation_leaves_state_untouched() {
        let store = Arc::new(MockRecordStore::new(sample_leads(3)));
        let mut controller = controller(&store);
        controller.reload().await;
        controller.selection_mut().select_all(["L000", "L002"]);
        store.fail_mutations(StoreError::Unauthorized {
            message: "read-only unit".to_string(),
        });

        let result = controller.bulk_delete().await;

        assert!(matches!(
            result,
            Err(MutationError::Store(StoreError::Unauthorized { .. }))
        ));
        assert_eq!(controller.selection().len(), 2);
        assert_eq!(controller.page().total(), 3);
        assert_eq!(store.list_calls().len(), 1);
        let notices = controller.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].severity, Severity::Error);
        assert!(controller.drain_notices().is_empty());
    }

    #[tokio::test]
    async fn deleting_the_last_page_steps_back() -> anyhow::Result<()> {
        let store = Arc::new(MockRecordStore::new(sample_leads(25)));
        let mut controller = controller(&store);
        assert_eq!(go(&mut controller, QueryUpdate::page(1)).await, Some(Applied::Loaded));
        assert_eq!(controller.page().items().len(), 5);
        controller.toggle_page_selection();

        assert_eq!(controller.bulk_delete().await?, 5);

        assert_eq!(controller.query().page, 0);
        assert_eq!(controller.address(), "");
        assert_eq!(controller.page().items().len(), 20);
        assert_eq!(controller.page().total(), 20);
        Ok(())
    }

    #[tokio::test]
    async fn empty_selection_is_reported() {
        let store = Arc::new(MockRecordStore::new(sample_leads(3)));
        let mut controller = controller(&store);

        let result = controller
            .bulk_update(&LeadPatch {
                tag_id: FieldPatch::Set("hot".to_string()),
                ..Default::default()
            })
            .await;

        assert_eq!(result, Err(MutationError::EmptySelection));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn select_matching_replaces_the_selection() -> anyhow::Result<()> {
        let store = Arc::new(MockRecordStore::new(sample_leads(250)));
        let mut controller = controller(&store);
        controller.selection_mut().toggle("not-a-lead");

        let count = controller.select_matching(&CancellationToken::new()).await?;

        assert_eq!(count, 250);
        assert_eq!(controller.selection().len(), 250);
        assert!(!controller.selection().is_selected("not-a-lead"));
        assert_eq!(store.list_calls().len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn failed_expansion_keeps_the_selection() {
        let store = Arc::new(MockRecordStore::new(sample_leads(250)));
        store.fail_lists_after(2, StoreError::Transport("reset".to_string()));
        let mut controller = controller(&store);
        controller.selection_mut().toggle("L000");

        let result = controller.select_matching(&CancellationToken::new()).await;

        assert!(matches!(result, Err(ExpandError::Chunk { collected: 200, .. })));
        assert_eq!(controller.selection().ids(), vec!["L000".to_string()]);
        assert_eq!(controller.drain_notices()[0].severity, Severity::Error);
    }

    #[tokio::test]
    async fn set_address_changes_the_view_without_fetching() -> anyhow::Result<()> {
        let mut leads = sample_leads(3);
        leads[1].assigned_to = vec![OPERATOR.to_string()];
        let store = Arc::new(MockRecordStore::new(leads));
        let mut controller = controller(&store);

        controller.set_address("?scope=mine&page=3");

        assert_eq!(controller.address(), "page=3&scope=mine");
        assert!(!controller.page().is_loading());
        assert!(store.calls().is_empty());
        assert_eq!(controller.select_matching(&CancellationToken::new()).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn expansion_cancelled_between_chunks_keeps_the_selection() {
        let store = Arc::new(MockRecordStore::new(sample_leads(250)));
        let cancel = CancellationToken::new();
        store.cancel_during_list(1, cancel.clone());
        let mut controller = controller(&store);
        controller.selection_mut().toggle("L042");

        let result = controller.select_matching(&cancel).await;

        assert_eq!(result, Err(ExpandError::Cancelled));
        assert_eq!(store.list_calls().len(), 1);
        assert_eq!(controller.selection().ids(), vec!["L042".to_string()]);
        assert!(controller.drain_notices().is_empty());
    }

    #[tokio::test]
    async fn unit_switch_discards_in_flight_fetches() {
        let store = Arc::new(MockRecordStore::new(sample_leads(3)));
        let mut controller = controller(&store);
        let stale = controller.request_fetch();
        controller.selection_mut().toggle("L000");

        let fresh = controller.set_unit("other");

        assert!(stale.cancel.is_cancelled());
        assert!(!fresh.cancel.is_cancelled());
        assert_eq!(fresh.params.unit_id, "other");
        assert!(controller.selection().is_empty());
        let completion = controller.fetcher().fetch(stale).await;
        assert_eq!(controller.complete_fetch(completion), Applied::Stale);
    }

    #[tokio::test]
    async fn logout_cancels_fetches() {
        let store = Arc::new(MockRecordStore::new(sample_leads(3)));
        let mut controller = controller(&store);
        let request = controller.request_fetch();

        controller.logout();

        let completion = controller.fetcher().fetch(request).await;
        assert!(matches!(completion.outcome, FetchOutcome::Cancelled));
        assert_eq!(controller.complete_fetch(completion), Applied::Stale);
        assert!(!controller.session().is_active());
        assert!(matches!(store.calls().as_slice(), [] | [MockCall::List(_)]));
    }
}
