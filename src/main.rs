//! Watchability Service: Binary Entrypoint
//! Boots the Axum HTTP server, wiring config, store, match source and routes.

use std::sync::Arc;

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use football_watchability::config::AppConfig;
use football_watchability::ingest::football_data::FootballDataProvider;
use football_watchability::ingest::rate_limit::RateLimiter;
use football_watchability::ingest::scheduler::{spawn_sync_scheduler, SyncSchedulerCfg};
use football_watchability::ingest::types::MatchSource;
use football_watchability::metrics::Metrics;
use football_watchability::{create_router, AppState, MatchStore};

/// Compact tracing logs; `RUST_LOG` overrides the default filter.
/// A subscriber installed by the runtime wins, hence `try_init`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("football_watchability=info,ingest=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_default().context("loading app config")?;
    let store = Arc::new(MatchStore::open(&cfg.data_path).context("opening match store")?);

    let mut state = AppState::new(store.clone());
    if cfg.has_api_key() {
        let limiter = Arc::new(RateLimiter::new(
            cfg.rate_limit.max_calls,
            cfg.rate_limit.window(),
        ));
        let provider = FootballDataProvider::from_config(cfg.football_data.clone(), limiter)
            .context("building football-data client")?;
        let source: Arc<dyn MatchSource> = Arc::new(provider);
        state = state.with_source(source.clone());

        if cfg.sync.enabled {
            spawn_sync_scheduler(
                SyncSchedulerCfg {
                    interval_secs: cfg.sync.interval_secs,
                },
                source,
                store.clone(),
            );
            tracing::info!(interval_secs = cfg.sync.interval_secs, "sync scheduler started");
        }
    } else {
        tracing::warn!("no football-data api key; /api/sync disabled");
    }

    let mut router = create_router(state);
    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    tracing::info!(matches = store.len(), "watchability service ready");
    Ok(router.into())
}
