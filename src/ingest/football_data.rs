//! football-data.org v4 client.
//!
//! Two modes: `Http` calls the live API (one request per competition, each
//! gated by the shared [`RateLimiter`]); `Fixture` parses a stored response
//! body and is what the tests use.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Deserialize;

use crate::config::FootballDataConfig;
use crate::error::FetchError;
use crate::ingest::rate_limit::RateLimiter;
use crate::ingest::types::{FinishedMatch, MatchSource};
use crate::rating::{GoalEvent, MatchInput, Team};

/// Upstream error bodies are clipped to this many characters.
const UPSTREAM_MESSAGE_CHARS: usize = 200;

/// Seconds to back off when a 429 carries no usable reset header.
const DEFAULT_RETRY_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct MatchesResponse {
    #[serde(default)]
    matches: Vec<ApiMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiMatch {
    id: u64,
    utc_date: DateTime<Utc>,
    status: String,
    competition: Option<ApiNamed>,
    home_team: ApiTeam,
    away_team: ApiTeam,
    score: ApiScore,
    #[serde(default)]
    goals: Vec<ApiGoal>,
}

#[derive(Debug, Deserialize)]
struct ApiNamed {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTeam {
    id: Option<u64>,
    name: Option<String>,
    short_name: Option<String>,
}

impl ApiTeam {
    fn display_name(&self) -> String {
        self.short_name
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiScore {
    full_time: Option<ApiScoreLine>,
}

#[derive(Debug, Deserialize)]
struct ApiScoreLine {
    home: Option<u32>,
    away: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGoal {
    minute: Option<u32>,
    injury_time: Option<u32>,
    #[serde(rename = "type")]
    kind: Option<String>,
    team: ApiTeam,
    scorer: Option<ApiNamed>,
}

impl ApiMatch {
    /// `None` when the upstream has no full-time score to rate.
    fn into_finished(self) -> Option<FinishedMatch> {
        let ft = self.score.full_time?;
        let (home_score, away_score) = (ft.home?, ft.away?);

        let mut goals = Vec::with_capacity(self.goals.len());
        for g in self.goals {
            let Some(team) = side_of(&g.team, &self.home_team, &self.away_team) else {
                tracing::warn!(
                    target: "ingest",
                    match_id = self.id,
                    "goal with unknown team dropped"
                );
                continue;
            };
            goals.push(GoalEvent {
                team,
                minute: g.minute.unwrap_or(0).saturating_add(g.injury_time.unwrap_or(0)),
                scorer: g.scorer.and_then(|s| s.name),
                kind: g.kind,
            });
        }

        Some(FinishedMatch {
            external_id: self.id.to_string(),
            date: self.utc_date,
            status: self.status,
            competition: self
                .competition
                .and_then(|c| c.name)
                .unwrap_or_default(),
            input: MatchInput {
                home_team: self.home_team.display_name(),
                away_team: self.away_team.display_name(),
                home_score,
                away_score,
                goals,
            },
        })
    }
}

fn side_of(scorer: &ApiTeam, home: &ApiTeam, away: &ApiTeam) -> Option<Team> {
    if let (Some(id), Some(h), Some(a)) = (scorer.id, home.id, away.id) {
        if id == h {
            return Some(Team::Home);
        }
        if id == a {
            return Some(Team::Away);
        }
        return None;
    }
    let name = scorer.name.as_deref()?;
    if home.name.as_deref() == Some(name) {
        Some(Team::Home)
    } else if away.name.as_deref() == Some(name) {
        Some(Team::Away)
    } else {
        None
    }
}

/// Parse a `/matches` response body.
pub fn parse_matches(body: &str) -> Result<Vec<FinishedMatch>, FetchError> {
    let t0 = std::time::Instant::now();
    let resp: MatchesResponse = serde_json::from_str(body)?;
    let out: Vec<FinishedMatch> = resp
        .matches
        .into_iter()
        .filter_map(ApiMatch::into_finished)
        .collect();

    histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("ingest_matches_fetched_total").increment(out.len() as u64);
    Ok(out)
}

pub struct FootballDataProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        client: reqwest::Client,
        cfg: FootballDataConfig,
        limiter: Arc<RateLimiter>,
    },
}

impl FootballDataProvider {
    pub fn from_fixture(body: &str) -> Self {
        Self {
            mode: Mode::Fixture(body.to_string()),
        }
    }

    pub fn from_config(cfg: FootballDataConfig, limiter: Arc<RateLimiter>) -> Result<Self, FetchError> {
        if cfg.api_key.trim().is_empty() {
            return Err(FetchError::NotConfigured(
                "football-data api key is empty (set FOOTBALL_DATA_API_KEY)".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .user_agent(concat!("football-watchability/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            mode: Mode::Http {
                client,
                cfg,
                limiter,
            },
        })
    }

    async fn fetch_competition(
        client: &reqwest::Client,
        cfg: &FootballDataConfig,
        limiter: &RateLimiter,
        code: &str,
    ) -> Result<Vec<FinishedMatch>, FetchError> {
        limiter.acquire().await;

        let to = Utc::now().date_naive();
        let from = to - chrono::Duration::days(cfg.lookback_days as i64);
        let url = format!(
            "{}/competitions/{}/matches",
            cfg.base_url.trim_end_matches('/'),
            code
        );

        let resp = client
            .get(&url)
            .header("X-Auth-Token", &cfg.api_key)
            .query(&[
                ("status", "FINISHED".to_string()),
                ("dateFrom", from.format("%Y-%m-%d").to_string()),
                ("dateTo", to.format("%Y-%m-%d").to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("X-RequestCounter-Reset")
                .or_else(|| resp.headers().get(reqwest::header::RETRY_AFTER))
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_SECS);
            counter!("ingest_rate_limited_total").increment(1);
            return Err(FetchError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message: String = body.chars().take(UPSTREAM_MESSAGE_CHARS).collect();
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        parse_matches(&body)
    }
}

#[async_trait]
impl MatchSource for FootballDataProvider {
    async fn fetch_finished(&self) -> Result<Vec<FinishedMatch>, FetchError> {
        match &self.mode {
            Mode::Fixture(body) => parse_matches(body),
            Mode::Http {
                client,
                cfg,
                limiter,
            } => {
                let mut out = Vec::new();
                for code in &cfg.competitions {
                    match Self::fetch_competition(client, cfg, limiter, code).await {
                        Ok(mut v) => out.append(&mut v),
                        Err(e) => {
                            tracing::warn!(
                                target: "ingest",
                                error = %e,
                                competition = %code,
                                "football-data fetch failed"
                            );
                            counter!("ingest_provider_errors_total").increment(1);
                            return Err(e);
                        }
                    }
                }
                Ok(out)
            }
        }
    }

    fn name(&self) -> &'static str {
        "football-data"
    }
}
