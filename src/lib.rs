// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod competition;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod rating;
pub mod scoring;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::engine::{compute_rating, RawMatchInput};
pub use crate::rating::{
    Category, GoalEvent, LegendTier, MatchInput, MatchSummary, RatingBreakdown, RatingResult, Team,
};
pub use crate::store::{MatchStore, StoredMatch};
