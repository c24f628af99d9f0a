use thiserror::Error;

/// Failures reported by a [`crate::RecordStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("could not reach the record store: {0}")]
    Transport(String),

    #[error("request rejected: {message}")]
    Validation { message: String },

    #[error("not allowed: {message}")]
    Unauthorized { message: String },

    #[error("record store returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected record store response: {0}")]
    Decode(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown query key '{0}'")]
    UnknownKey(String),

    #[error("invalid value '{value}' for '{key}'")]
    InvalidValue { key: String, value: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    /// A chunk request failed; nothing collected so far is usable.
    #[error("selecting all matching leads failed after {collected} ids at offset {skip}: {source}")]
    Chunk {
        collected: usize,
        skip: u64,
        #[source]
        source: StoreError,
    },

    #[error("selecting all matching leads was cancelled")]
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid patch: {0}")]
    InvalidPatch(String),

    #[error("no leads selected")]
    EmptySelection,
}

