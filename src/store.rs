//! store.rs: rated matches, persisted as one JSON document.
//!
//! Writes are serialized behind a mutex and land on disk via
//! write-to-temp-then-rename. Saving is idempotent on the external match id.
//!
//! Read boundary: records written before breakdowns were stored carry an
//! all-zero breakdown. Those are recomputed from their stored goals on the way
//! out (see [`hydrate`]); the scoring engine itself knows nothing about this.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use metrics::gauge;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::competition::CompetitionAliases;
use crate::engine::compute_rating;
use crate::error::StoreError;
use crate::ingest::types::FinishedMatch;
use crate::rating::{GoalEvent, MatchInput, RatingResult};

/// One persisted match, in the shape the read API returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMatch {
    pub id: u64,
    pub external_id: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub date: DateTime<Utc>,
    pub status: String,
    pub competition: String,
    #[serde(default)]
    pub goals: Vec<GoalEvent>,
    #[serde(default)]
    pub rating: Option<RatingResult>,
}

impl StoredMatch {
    pub fn to_input(&self) -> MatchInput {
        MatchInput {
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
            home_score: self.home_score,
            away_score: self.away_score,
            goals: self.goals.clone(),
        }
    }

    fn score(&self) -> u32 {
        self.rating.as_ref().map(|r| r.total_score).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub id: u64,
    /// False when the external id was already known and nothing was written.
    pub created: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreData {
    #[serde(default = "first_id")]
    next_id: u64,
    #[serde(default)]
    matches: Vec<StoredMatch>,
}

fn first_id() -> u64 {
    1
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            next_id: first_id(),
            matches: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct MatchStore {
    inner: Mutex<StoreData>,
    path: Option<PathBuf>,
    aliases: CompetitionAliases,
}

impl MatchStore {
    /// Open (or lazily create) a store backed by `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = if path.exists() {
            let s = fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            if s.trim().is_empty() {
                StoreData::default()
            } else {
                serde_json::from_str(&s)?
            }
        } else {
            StoreData::default()
        };
        info!(path = %path.display(), matches = data.matches.len(), "match store opened");
        gauge!("store_matches").set(data.matches.len() as f64);

        Ok(Self {
            inner: Mutex::new(data),
            path: Some(path),
            aliases: CompetitionAliases::default_seed(),
        })
    }

    /// Store without a backing file (tests, ephemeral runs).
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(StoreData::default()),
            path: None,
            aliases: CompetitionAliases::default_seed(),
        }
    }

    pub fn with_aliases(mut self, aliases: CompetitionAliases) -> Self {
        self.aliases = aliases;
        self
    }

    /// Save a rated match. A known external id is a no-op returning the stored id.
    ///
    /// Blocking: with a backing file this writes and fsyncs while holding the
    /// store lock. Callers on a runtime worker should expect a short stall.
    pub fn save(&self, m: &FinishedMatch, rating: &RatingResult) -> Result<SaveOutcome, StoreError> {
        let mut data = self.inner.lock().expect("store mutex poisoned");

        if let Some(existing) = data.matches.iter().find(|s| s.external_id == m.external_id) {
            debug!(external_id = %m.external_id, id = existing.id, "match already stored");
            return Ok(SaveOutcome {
                id: existing.id,
                created: false,
            });
        }

        let id = data.next_id;
        data.matches.push(StoredMatch {
            id,
            external_id: m.external_id.clone(),
            home_team: m.input.home_team.clone(),
            away_team: m.input.away_team.clone(),
            home_score: m.input.home_score,
            away_score: m.input.away_score,
            date: m.date,
            status: m.status.clone(),
            competition: m.competition.clone(),
            goals: m.input.goals.clone(),
            rating: Some(rating.clone()),
        });
        data.next_id += 1;

        if let Some(path) = &self.path {
            if let Err(e) = write_atomic(path, &data) {
                // Keep memory and disk in agreement.
                data.matches.pop();
                data.next_id -= 1;
                return Err(e);
            }
        }

        gauge!("store_matches").set(data.matches.len() as f64);
        info!(
            external_id = %m.external_id,
            id,
            total_score = rating.total_score,
            "match stored"
        );
        Ok(SaveOutcome { id, created: true })
    }

    /// All matches, newest first.
    pub fn all(&self) -> Vec<StoredMatch> {
        let mut out = self.snapshot();
        sort_by_date_desc(&mut out);
        out
    }

    /// Matches whose competition contains the (alias-resolved) filter, newest first.
    pub fn by_competition(&self, filter: &str) -> Vec<StoredMatch> {
        let mut out: Vec<StoredMatch> = self
            .snapshot()
            .into_iter()
            .filter(|m| self.aliases.matches(&m.competition, filter))
            .collect();
        sort_by_date_desc(&mut out);
        out
    }

    /// Rated matches by `totalScore` descending; ties go to the newer match.
    pub fn top_rated(&self, n: usize) -> Vec<StoredMatch> {
        let mut out: Vec<StoredMatch> = self
            .snapshot()
            .into_iter()
            .filter(|m| m.rating.is_some())
            .collect();
        sort_by_score_desc(&mut out);
        out.truncate(n);
        out
    }

    pub fn get(&self, id: u64) -> Option<StoredMatch> {
        let data = self.inner.lock().expect("store mutex poisoned");
        data.matches.iter().find(|m| m.id == id).cloned().map(hydrate)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("store mutex poisoned").matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<StoredMatch> {
        let data = self.inner.lock().expect("store mutex poisoned");
        data.matches.iter().cloned().map(hydrate).collect()
    }
}

pub fn sort_by_date_desc(v: &mut [StoredMatch]) {
    v.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
}

pub fn sort_by_score_desc(v: &mut [StoredMatch]) {
    v.sort_by(|a, b| {
        b.score()
            .cmp(&a.score())
            .then(b.date.cmp(&a.date))
            .then(b.id.cmp(&a.id))
    });
}

/// Recompute a legacy zeroed breakdown from the stored goals.
///
/// A genuine 0-0 also has a zero breakdown; it is left untouched since
/// recomputing it would give the same result.
pub fn hydrate(mut m: StoredMatch) -> StoredMatch {
    let stale = m
        .rating
        .as_ref()
        .is_some_and(|r| r.breakdown.is_zero() && m.home_score.saturating_add(m.away_score) > 0);
    if stale {
        debug!(external_id = %m.external_id, "recomputing zeroed breakdown");
        m.rating = Some(compute_rating(&m.to_input()));
    }
    m
}

fn write_atomic(path: &Path, data: &StoreData) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let json = serde_json::to_string_pretty(data)?;
    let tmp = path.with_extension("json.tmp");
    let res = write_then_rename(&tmp, path, json.as_bytes());
    if res.is_err() {
        // Never leave a half-written temp file next to the store.
        let _ = fs::remove_file(&tmp);
    }
    res
}

fn write_then_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut f = fs::File::create(tmp).map_err(|e| io_err(tmp, e))?;
    f.write_all(bytes).map_err(|e| io_err(tmp, e))?;
    f.sync_all().map_err(|e| io_err(tmp, e))?;
    drop(f);
    fs::rename(tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

fn io_err(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}
