//! Page fetching and the locally held page.
//!
//! Fetches are split in three steps so that a presentation loop can keep
//! several in flight: [`PageState::begin`] hands out a ticket,
//! [`ListFetcher::fetch`] runs the request, and [`PageState::complete`]
//! applies the result only if no newer fetch was started meanwhile.

use crate::error::StoreError;
use crate::store::RecordStore;
use leaddesk_async_utils::OrCancelExt;
use leaddesk_protocol::Lead;
use leaddesk_protocol::LeadId;
use leaddesk_protocol::ListParams;
use leaddesk_protocol::ListResponse;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

/// Monotonically increasing fetch token; only the latest one may apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(u64);

#[derive(Clone, Debug)]
#[must_use = "a started fetch leaves the page loading until it completes"]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub params: ListParams,
    pub cancel: CancellationToken,
}

#[derive(Debug)]
pub enum FetchOutcome {
    Loaded(ListResponse),
    Failed(StoreError),
    Cancelled,
}

#[derive(Debug)]
pub struct FetchCompletion {
    pub ticket: FetchTicket,
    pub outcome: FetchOutcome,
}

/// What [`PageState::complete`] did with a completion.
#[derive(Debug, PartialEq, Eq)]
pub enum Applied {
    Loaded,
    /// The page was emptied and the error should be shown to the operator.
    Failed(StoreError),
    /// A newer fetch was started; the result was dropped.
    Stale,
    Cancelled,
}

/// Issues one list request per [`FetchRequest`].
#[derive(Clone)]
pub struct ListFetcher {
    store: Arc<dyn RecordStore>,
}

impl ListFetcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn fetch(&self, request: FetchRequest) -> FetchCompletion {
        let FetchRequest {
            ticket,
            params,
            cancel,
        } = request;
        debug!(
            ticket = ticket.0,
            unit = %params.unit_id,
            skip = params.skip,
            limit = params.limit,
            "fetching leads"
        );
        let outcome = match self.store.list(&params).or_cancel(&cancel).await {
            Ok(Ok(response)) => FetchOutcome::Loaded(response),
            Ok(Err(err)) => FetchOutcome::Failed(err),
            Err(_) => FetchOutcome::Cancelled,
        };
        FetchCompletion { ticket, outcome }
    }
}

/// Result of reconciling a single updated record with the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciled {
    Replaced,
    Removed,
    NotOnPage,
}

/// The page currently held for display.
///
/// `loading` is independent from `items`: a refetch keeps the previous rows
/// visible until its result lands.
#[derive(Debug, Default)]
pub struct PageState {
    items: Vec<Lead>,
    total: u64,
    loading: bool,
    latest: u64,
}

impl PageState {
    pub fn items(&self) -> &[Lead] {
        &self.items
    }

    pub fn ids(&self) -> Vec<LeadId> {
        self.items.iter().map(|lead| lead.id.clone()).collect()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Starts a fetch, superseding every fetch started before.
    pub fn begin(&mut self) -> FetchTicket {
        self.latest += 1;
        self.loading = true;
        FetchTicket(self.latest)
    }

    /// Drops every in-flight fetch without starting a new one.
    pub fn invalidate(&mut self) {
        self.latest += 1;
        self.loading = false;
    }

    pub fn complete(&mut self, completion: FetchCompletion) -> Applied {
        if completion.ticket.0 != self.latest {
            debug!(
                ticket = completion.ticket.0,
                latest = self.latest,
                "discarding stale fetch result"
            );
            return Applied::Stale;
        }
        self.loading = false;
        match completion.outcome {
            FetchOutcome::Loaded(response) => {
                self.items = response.items;
                self.total = response.total;
                Applied::Loaded
            }
            FetchOutcome::Failed(err) => {
                warn!("fetching leads failed: {err}");
                self.items.clear();
                self.total = 0;
                Applied::Failed(err)
            }
            FetchOutcome::Cancelled => Applied::Cancelled,
        }
    }

    /// Replaces the page copy of `lead`, or removes it when it no longer
    /// belongs to the view.
    pub fn reconcile(&mut self, lead: Lead, keep: bool) -> Reconciled {
        let Some(index) = self.items.iter().position(|item| item.id == lead.id) else {
            return Reconciled::NotOnPage;
        };
        if keep {
            self.items[index] = lead;
            Reconciled::Replaced
        } else {
            self.items.remove(index);
            self.total = self.total.saturating_sub(1);
            Reconciled::Removed
        }
    }
}
