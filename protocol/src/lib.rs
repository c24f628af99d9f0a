//! Wire and data types shared between the list engine, the HTTP record store
//! client, and the command line front end.

pub mod date;
pub mod lead;
pub mod list;
pub mod patch;

pub use lead::Lead;
pub use lead::LeadId;
pub use lead::StatusId;
pub use lead::TagId;
pub use lead::UnitId;
pub use lead::UserId;
pub use list::ListParams;
pub use list::ListResponse;
pub use list::Scope;
pub use list::SortKey;
pub use list::SortOrder;
pub use patch::BulkDeleteRequest;
pub use patch::BulkDeleteResponse;
pub use patch::BulkUpdateRequest;
pub use patch::BulkUpdateResponse;
pub use patch::FieldPatch;
pub use patch::LeadPatch;
