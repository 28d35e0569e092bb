// src/config/mod.rs
//! Application configuration.
//!
//! Load order:
//! 1) $WATCHABILITY_CONFIG_PATH (must exist if set)
//! 2) config/app.toml
//! 3) built-in defaults
//!
//! then env overrides (`FOOTBALL_DATA_API_KEY`, `WATCHABILITY_DATA_PATH`,
//! `WATCHABILITY_SYNC`), then sanitization.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

pub const ENV_CONFIG_PATH: &str = "WATCHABILITY_CONFIG_PATH";
pub const ENV_DATA_PATH: &str = "WATCHABILITY_DATA_PATH";
pub const ENV_SYNC: &str = "WATCHABILITY_SYNC";
pub const ENV_API_KEY: &str = "FOOTBALL_DATA_API_KEY";

const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub football_data: FootballDataConfig,
    pub rate_limit: RateLimitConfig,
    pub sync: SyncConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/matches.json"),
            football_data: FootballDataConfig::default(),
            rate_limit: RateLimitConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootballDataConfig {
    pub base_url: String,
    /// Literal key, or "ENV" to read `FOOTBALL_DATA_API_KEY`.
    pub api_key: String,
    /// Competition codes, e.g. "PL", "CL".
    pub competitions: Vec<String>,
    pub lookback_days: u32,
}

impl Default for FootballDataConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.football-data.org/v4".to_string(),
            api_key: "ENV".to_string(),
            competitions: vec!["PL".to_string(), "CL".to_string()],
            lookback_days: 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_calls: usize,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: 10,
            window_secs: 60,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 3600,
        }
    }
}

impl AppConfig {
    /// Parse a TOML file, then apply env overrides and sanitize.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: AppConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg.finish())
    }

    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        Ok(Self::default().finish())
    }

    fn finish(mut self) -> Self {
        self.apply_env_overrides();
        self.sanitize();
        self
    }

    fn apply_env_overrides(&mut self) {
        let env_key = env::var(ENV_API_KEY).ok().filter(|k| !k.trim().is_empty());
        if let Some(k) = env_key {
            self.football_data.api_key = k;
        } else if self.football_data.api_key.trim().eq_ignore_ascii_case("env") {
            // Still unresolved: treat as "no key".
            self.football_data.api_key.clear();
        }

        if let Ok(p) = env::var(ENV_DATA_PATH) {
            if !p.trim().is_empty() {
                self.data_path = PathBuf::from(p.trim());
            }
        }

        if let Ok(v) = env::var(ENV_SYNC) {
            self.sync.enabled = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    fn sanitize(&mut self) {
        let defaults = AppConfig::default();
        if self.rate_limit.max_calls == 0 {
            self.rate_limit.max_calls = defaults.rate_limit.max_calls;
        }
        if self.rate_limit.window_secs == 0 {
            self.rate_limit.window_secs = defaults.rate_limit.window_secs;
        }
        if self.sync.interval_secs == 0 {
            self.sync.interval_secs = defaults.sync.interval_secs;
        }
        if self.football_data.lookback_days == 0 {
            self.football_data.lookback_days = defaults.football_data.lookback_days;
        }

        let mut seen = std::collections::BTreeSet::new();
        self.football_data.competitions = self
            .football_data
            .competitions
            .iter()
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty() && seen.insert(c.clone()))
            .collect();
    }

    pub fn has_api_key(&self) -> bool {
        !self.football_data.api_key.trim().is_empty()
    }
}
