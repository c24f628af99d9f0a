use crate::error::StoreError;
use async_trait::async_trait;
use leaddesk_protocol::BulkDeleteRequest;
use leaddesk_protocol::BulkDeleteResponse;
use leaddesk_protocol::BulkUpdateRequest;
use leaddesk_protocol::BulkUpdateResponse;
use leaddesk_protocol::Lead;
use leaddesk_protocol::LeadPatch;
use leaddesk_protocol::ListParams;
use leaddesk_protocol::ListResponse;

/// The remote record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// `GET /records`
    async fn list(&self, params: &ListParams) -> Result<ListResponse, StoreError>;

    /// `PATCH /records/:id`
    async fn update(&self, id: &str, patch: &LeadPatch) -> Result<Lead, StoreError>;

    /// `PATCH /records/bulk`
    async fn bulk_update(
        &self,
        request: &BulkUpdateRequest,
    ) -> Result<BulkUpdateResponse, StoreError>;

    /// `POST /records/bulk-delete`
    async fn bulk_delete(
        &self,
        request: &BulkDeleteRequest,
    ) -> Result<BulkDeleteResponse, StoreError>;
}
