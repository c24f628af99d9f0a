//! "Select every lead matching the current filter" across all pages.
//!
//! Pages through the record store in fixed-size chunks and keeps only ids, so
//! memory stays bounded by the id count rather than full records. The total
//! reported by the first chunk is trusted for the rest of the walk; records
//! added or removed by someone else meanwhile may be missed.

use crate::error::ExpandError;
use crate::query::QueryDescriptor;
use crate::scope::list_params;
use crate::store::RecordStore;
use indexmap::IndexSet;
use leaddesk_async_utils::OrCancelExt;
use leaddesk_protocol::LeadId;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

pub const DEFAULT_CHUNK_SIZE: u32 = 100;

pub struct MatchingSetExpander {
    store: Arc<dyn RecordStore>,
    chunk_size: u32,
    /// Session or unit context; cancelled on logout and unit switches.
    context: CancellationToken,
}

impl MatchingSetExpander {
    pub fn new(store: Arc<dyn RecordStore>, chunk_size: u32, context: CancellationToken) -> Self {
        Self {
            store,
            chunk_size: chunk_size.max(1),
            context,
        }
    }

    /// Collects the ids of every lead matching `query`, in list order.
    ///
    /// `cancel` is the caller's own switch (for example a closed dialog). It is
    /// checked before every chunk and raced against every request. A failing
    /// chunk aborts the whole expansion.
    pub async fn expand(
        &self,
        unit_id: &str,
        query: &QueryDescriptor,
        operator: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<LeadId>, ExpandError> {
        let chunk = u64::from(self.chunk_size);
        let mut ids = IndexSet::new();
        let mut skip = 0;
        let mut reported_total = None;

        loop {
            if cancel.is_cancelled() || self.context.is_cancelled() {
                return Err(ExpandError::Cancelled);
            }
            let params = list_params(unit_id, query, operator, skip, chunk);
            debug!(skip, limit = chunk, "expanding matching set");
            let response = match self
                .store
                .list(&params)
                .or_cancel(cancel)
                .or_cancel(&self.context)
                .await
            {
                Ok(Ok(Ok(response))) => response,
                Ok(Ok(Err(source))) => {
                    warn!("matching set chunk at offset {skip} failed: {source}");
                    return Err(ExpandError::Chunk {
                        collected: ids.len(),
                        skip,
                        source,
                    });
                }
                Ok(Err(_)) | Err(_) => return Err(ExpandError::Cancelled),
            };

            let total = *reported_total.get_or_insert(response.total);
            let received = response.items.len() as u64;
            ids.extend(response.items.into_iter().map(|lead| lead.id));
            skip += received;

            if received < chunk || skip >= total {
                break;
            }
        }

        debug!(count = ids.len(), "matching set expanded");
        Ok(ids.into_iter().collect())
    }
}
