// src/ingest/types.rs
use chrono::{DateTime, Utc};

use crate::error::FetchError;
use crate::rating::MatchInput;

/// Status string the upstream uses for completed matches.
pub const STATUS_FINISHED: &str = "FINISHED";

/// A match as delivered by a source, ready to be rated and stored.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FinishedMatch {
    pub external_id: String, // upstream match id
    pub date: DateTime<Utc>,
    pub status: String,      // e.g. "FINISHED", "POSTPONED"
    pub competition: String, // e.g. "Premier League"
    pub input: MatchInput,
}

impl FinishedMatch {
    pub fn is_finished(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_FINISHED)
    }
}

#[async_trait::async_trait]
pub trait MatchSource: Send + Sync {
    /// Recently completed matches. May include other statuses; callers filter.
    async fn fetch_finished(&self) -> Result<Vec<FinishedMatch>, FetchError>;
    fn name(&self) -> &'static str;
}
