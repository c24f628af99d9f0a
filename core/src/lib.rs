//! List query and bulk-mutation engine for the lead browser.
//!
//! The engine owns the filter/sort/pagination/scope state of a lead list,
//! keeps it in sync with a shareable address string, fetches pages from a
//! [`RecordStore`], expands "select everything matching" across all pages, and
//! reconciles the locally held page after inline and bulk mutations.
//!
//! ```text
//! address ──decode──> QueryDescriptor ──scope──> ListParams ──> RecordStore
//!    ^                     │                                        │
//!    └──────encode─────────┘            PageState <── FetchCompletion
//! ```

pub mod address;
pub mod config;
pub mod controller;
pub mod error;
pub mod expander;
pub mod fetcher;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod mutation;
pub mod notice;
pub mod query;
pub mod scope;
pub mod selection;
pub mod session;
pub mod store;
pub mod views;

pub use address::decode;
pub use address::encode;
pub use address::merge;
pub use config::ConfigError;
pub use config::LeaddeskConfig;
pub use config::find_leaddesk_home;
pub use controller::LeadListController;
pub use error::ExpandError;
pub use error::MutationError;
pub use error::QueryError;
pub use error::StoreError;
pub use expander::MatchingSetExpander;
pub use fetcher::Applied;
pub use fetcher::FetchCompletion;
pub use fetcher::FetchOutcome;
pub use fetcher::FetchRequest;
pub use fetcher::FetchTicket;
pub use fetcher::ListFetcher;
pub use fetcher::PageState;
pub use fetcher::Reconciled;
pub use mutation::MutationCoordinator;
pub use notice::Notice;
pub use notice::Severity;
pub use query::QueryDescriptor;
pub use query::QueryUpdate;
pub use scope::AssigneeConstraint;
pub use scope::belongs_to_scope;
pub use selection::PageCheckState;
pub use selection::SelectionSet;
pub use session::SessionContext;
pub use store::RecordStore;
pub use views::SavedViews;
