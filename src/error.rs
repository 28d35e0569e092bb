//! Error taxonomy.
//!
//! The scoring core itself never fails; these types cover the boundary
//! (input validation) and the collaborators (storage, match source).
//! A failure here is always distinguishable from a legitimately low score.

use std::time::Duration;

use thiserror::Error;

/// Boundary validation failure for a match submitted for rating.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("match source not configured: {0}")]
    NotConfigured(String),

    #[error("upstream rate limited, retry after {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("upstream returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("upstream unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure of one ingest run; wraps whichever collaborator failed.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
