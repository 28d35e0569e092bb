// src/ingest/mod.rs
pub mod football_data;
pub mod rate_limit;
pub mod scheduler;
pub mod types;

use crate::engine::compute_rating;
use crate::error::SyncError;
use crate::ingest::types::{FinishedMatch, MatchSource};
use crate::store::MatchStore;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(describe_metrics);
}

fn describe_metrics() {
    describe_counter!(
        "ingest_matches_fetched_total",
        "Matches parsed from the source."
    );
    describe_counter!(
        "ingest_matches_saved_total",
        "Rated matches newly written to the store."
    );
    describe_counter!(
        "ingest_duplicates_total",
        "Matches skipped because their external id was already stored."
    );
    describe_counter!(
        "ingest_unfinished_total",
        "Matches dropped because they were not FINISHED."
    );
    describe_counter!(
        "ingest_provider_errors_total",
        "Source fetch/parse errors."
    );
    describe_counter!(
        "ingest_rate_limited_total",
        "Upstream calls rejected with HTTP 429."
    );
    describe_histogram!("ingest_parse_ms", "Source parse time in milliseconds.");
    describe_gauge!(
        "ingest_pipeline_last_run_ts",
        "Unix ts when the ingest pipeline last ran."
    );
    describe_counter!(
        "ingest_runs_total",
        "Scheduled sync ticks started."
    );
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub fetched: usize,
    pub skipped_unfinished: usize,
    pub created: usize,
    pub duplicates: usize,
}

/// Keep only finished matches. Returns (kept, dropped_count).
pub fn finished_only(raw: Vec<FinishedMatch>) -> (Vec<FinishedMatch>, usize) {
    let total = raw.len();
    let kept: Vec<FinishedMatch> = raw.into_iter().filter(|m| m.is_finished()).collect();
    let dropped = total - kept.len();
    (kept, dropped)
}

/// Fetch once from `source`, rate every finished match and save it.
///
/// Fetch failures abort the run before anything is written. A store failure
/// aborts mid-run; matches saved before it stay saved.
pub async fn sync_once(source: &dyn MatchSource, store: &MatchStore) -> Result<SyncReport, SyncError> {
    ensure_metrics_described();

    let raw = match source.fetch_finished().await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(target: "ingest", error = %e, provider = source.name(), "provider error");
            counter!("ingest_provider_errors_total").increment(1);
            return Err(e.into());
        }
    };

    let fetched = raw.len();
    let (finished, skipped_unfinished) = finished_only(raw);

    let mut report = SyncReport {
        fetched,
        skipped_unfinished,
        ..SyncReport::default()
    };

    for m in &finished {
        let rating = compute_rating(&m.input);
        if store.save(m, &rating)?.created {
            report.created += 1;
        } else {
            report.duplicates += 1;
        }
    }

    // Telemetry
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    counter!("ingest_matches_saved_total").increment(report.created as u64);
    counter!("ingest_duplicates_total").increment(report.duplicates as u64);
    counter!("ingest_unfinished_total").increment(report.skipped_unfinished as u64);
    gauge!("ingest_pipeline_last_run_ts").set(now as f64);

    tracing::info!(
        target: "ingest",
        provider = source.name(),
        fetched = report.fetched,
        created = report.created,
        duplicates = report.duplicates,
        skipped = report.skipped_unfinished,
        "sync finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
    use std::sync::Mutex;
    use crate::error::FetchError;
    use crate::rating::MatchInput;
    use chrono::{TimeZone, Utc};

    fn fm(ext: &str, status: &str) -> FinishedMatch {
        FinishedMatch {
            external_id: ext.into(),
            date: Utc.with_ymd_and_hms(2025, 4, 1, 20, 0, 0).unwrap(),
            status: status.into(),
            competition: "Serie A".into(),
            input: MatchInput::new("Inter", "Milan", 2, 2),
        }
    }

    struct StaticSource(Vec<FinishedMatch>);

    #[async_trait::async_trait]
    impl MatchSource for StaticSource {
        async fn fetch_finished(&self) -> Result<Vec<FinishedMatch>, FetchError> {
            Ok(self.0.clone())
        }
        fn name(&self) -> &'static str {
            "static"
        }
    }

    struct FailingSource;

    #[async_trait::async_trait]
    impl MatchSource for FailingSource {
        async fn fetch_finished(&self) -> Result<Vec<FinishedMatch>, FetchError> {
            Err(FetchError::Upstream {
                status: 503,
                message: "down".into(),
            })
        }
        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[test]
    fn finished_filter_is_case_insensitive() {
        let (kept, dropped) = finished_only(vec![
            fm("1", "FINISHED"),
            fm("2", "finished"),
            fm("3", "IN_PLAY"),
        ]);
        assert_eq!(kept.len(), 2);
        assert_eq!(dropped, 1);
    }

    #[tokio::test]
    async fn second_sync_only_finds_duplicates() {
        let src = StaticSource(vec![fm("1", "FINISHED"), fm("2", "POSTPONED"), fm("3", "FINISHED")]);
        let store = MatchStore::in_memory();

        let first = sync_once(&src, &store).await.unwrap();
        assert_eq!(
            first,
            SyncReport {
                fetched: 3,
                skipped_unfinished: 1,
                created: 2,
                duplicates: 0
            }
        );

        let second = sync_once(&src, &store).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.duplicates, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn fetch_failure_is_not_an_empty_sync() {
        let store = MatchStore::in_memory();
        let err = sync_once(&FailingSource, &store).await.unwrap_err();
        assert!(matches!(err, SyncError::Fetch(FetchError::Upstream { status: 503, .. })));
        assert!(store.is_empty());
    }

    /// Records the names passed to `describe_*`; everything else is a no-op.
    #[derive(Default)]
    struct DescribedNames(Mutex<Vec<String>>);

    impl DescribedNames {
        fn push(&self, key: KeyName) {
            self.0.lock().unwrap().push(key.as_str().to_string());
        }
    }

    impl Recorder for DescribedNames {
        fn describe_counter(&self, key: KeyName, _: Option<Unit>, _: SharedString) {
            self.push(key);
        }
        fn describe_gauge(&self, key: KeyName, _: Option<Unit>, _: SharedString) {
            self.push(key);
        }
        fn describe_histogram(&self, key: KeyName, _: Option<Unit>, _: SharedString) {
            self.push(key);
        }
        fn register_counter(&self, _: &Key, _: &Metadata<'_>) -> Counter {
            Counter::noop()
        }
        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }
        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    #[test]
    fn every_ingest_series_is_described() {
        let rec = DescribedNames::default();
        metrics::with_local_recorder(&rec, describe_metrics);

        let names = rec.0.lock().unwrap().clone();
        for series in [
            "ingest_matches_fetched_total",
            "ingest_matches_saved_total",
            "ingest_duplicates_total",
            "ingest_unfinished_total",
            "ingest_provider_errors_total",
            "ingest_rate_limited_total",
            "ingest_runs_total",
            "ingest_parse_ms",
            "ingest_pipeline_last_run_ts",
        ] {
            assert!(names.iter().any(|n| n == series), "'{series}' not described");
        }
    }
}
