// src/config.rs
//! Typed access to `config/shopper.toml`.
//!
//! The file is read once at startup and the resulting [`ShopperConfig`] is
//! passed by reference to whatever needs it. Getters never fail: a missing or
//! mistyped key yields the caller's fallback and a warning.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use toml::{Table, Value};
use tracing::{debug, warn};

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "config/shopper.toml";
pub const ENV_CONFIG_PATH: &str = "SHOPPER_CONFIG_PATH";

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
pub const DEFAULT_INTERVAL_MINUTES: i64 = 60;
/// One week.
pub const MAX_INTERVAL_MINUTES: i64 = 7 * 24 * 60;
pub const MAX_TIMEOUT_SECONDS: f64 = 600.0;
pub const MAX_DELAY_SECONDS: f64 = 3600.0;

#[derive(Debug, Clone, Default)]
pub struct ShopperConfig {
    table: Table,
}

impl ShopperConfig {
    /// Load from an explicit path. Absence and parse errors are fatal for the caller.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Missing {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(target: "config", path = %path.display(), "configuration loaded");
        Ok(cfg)
    }

    /// `$SHOPPER_CONFIG_PATH`, falling back to `config/shopper.toml`.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&Self::default_path())
    }

    pub fn default_path() -> PathBuf {
        std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        let table: Table = toml::from_str(s)?;
        Ok(Self { table })
    }

    fn lookup(&self, section: &str, key: &str) -> Option<&Value> {
        self.table.get(section)?.as_table()?.get(key)
    }

    /// String value from an arbitrary section.
    pub fn string(&self, section: &str, key: &str, fallback: &str) -> String {
        match self.lookup(section, key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Integer(i)) => i.to_string(),
            Some(Value::Float(f)) => f.to_string(),
            Some(Value::Boolean(b)) => b.to_string(),
            Some(other) => {
                warn!(target: "config", section, key, value = %other, "setting is not a scalar; using fallback");
                fallback.to_string()
            }
            None => {
                warn!(target: "config", section, key, fallback, "setting not found; using fallback");
                fallback.to_string()
            }
        }
    }

    pub fn general(&self, key: &str, fallback: &str) -> String {
        self.string("general", key, fallback)
    }

    pub fn scraping(&self, key: &str, fallback: &str) -> String {
        self.string("scraping", key, fallback)
    }

    pub fn int(&self, section: &str, key: &str, fallback: i64) -> i64 {
        let parsed = match self.lookup(section, key) {
            Some(Value::Integer(i)) => Some(*i),
            Some(Value::Float(f)) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed.unwrap_or_else(|| {
            warn!(target: "config", section, key, fallback, "integer setting missing or invalid; using fallback");
            fallback
        })
    }

    pub fn float(&self, section: &str, key: &str, fallback: f64) -> f64 {
        let parsed = match self.lookup(section, key) {
            Some(Value::Float(f)) => Some(*f),
            Some(Value::Integer(i)) => Some(*i as f64),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(v) if v.is_finite() => v,
            _ => {
                warn!(target: "config", section, key, fallback, "float setting missing or invalid; using fallback");
                fallback
            }
        }
    }

    /// `[api_keys]` lookup; an environment variable named after the upper-cased
    /// key takes precedence. Missing keys are normal (adapters scrape instead).
    pub fn api_key(&self, key: &str, fallback: Option<&str>) -> Option<String> {
        if let Ok(v) = std::env::var(key.to_ascii_uppercase()) {
            if !v.trim().is_empty() {
                return Some(v);
            }
        }
        match self.lookup("api_keys", key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            _ => {
                debug!(target: "config", key, "api key not configured");
                fallback.map(str::to_string)
            }
        }
    }

    /// `[platforms] enabled` as either an array or a newline/comma separated
    /// string. Blank entries and `;` comments are dropped.
    pub fn enabled_platforms(&self) -> Vec<String> {
        let raw: Vec<String> = match self.lookup("platforms", "enabled") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(s)) => s
                .split(|c| c == '\n' || c == ',')
                .map(str::to_string)
                .collect(),
            _ => {
                warn!(target: "config", "[platforms] enabled not found; no platforms enabled");
                Vec::new()
            }
        };
        raw.into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty() && !p.starts_with(';'))
            .collect()
    }

    /// Interval between cycles; values below one minute fall back to 60,
    /// values above a week are capped at a week.
    pub fn schedule_interval(&self) -> Duration {
        let mut minutes = self.int(
            "general",
            "schedule_interval_minutes",
            DEFAULT_INTERVAL_MINUTES,
        );
        if minutes < 1 {
            warn!(target: "config", minutes, "invalid schedule interval; using 60 minutes");
            minutes = DEFAULT_INTERVAL_MINUTES;
        } else if minutes > MAX_INTERVAL_MINUTES {
            warn!(target: "config", minutes, max = MAX_INTERVAL_MINUTES, "schedule interval too long; capping");
            minutes = MAX_INTERVAL_MINUTES;
        }
        Duration::from_secs(minutes.unsigned_abs() * 60)
    }

    /// `[filters] min_title_relevance`, clamped to 0..=100. Zero disables it.
    pub fn min_title_relevance(&self) -> u8 {
        match self.lookup("filters", "min_title_relevance") {
            None => 0,
            Some(_) => self.int("filters", "min_title_relevance", 0).clamp(0, 100) as u8,
        }
    }

    /// Optional JSON report path; empty means disabled.
    pub fn output_file(&self) -> Option<PathBuf> {
        match self.lookup("general", "output_file") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(PathBuf::from(s.trim())),
            _ => None,
        }
    }
}

/// Request hygiene shared by every adapter session.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout: Duration,
    pub delay: Duration,
    /// `[api_keys] ebay_app_id`; search does not need it.
    pub ebay_app_id: Option<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            timeout: Duration::from_secs(10),
            delay: Duration::from_secs(2),
            ebay_app_id: None,
        }
    }
}

/// Clamp a configured number of seconds into `min..=max`.
fn bounded_secs(key: &str, secs: f64, min: f64, max: f64) -> Duration {
    if secs > max {
        warn!(target: "config", key, secs, max, "setting too large; capping");
    }
    Duration::from_secs_f64(secs.clamp(min, max))
}

impl FetchSettings {
    pub fn from_config(cfg: &ShopperConfig) -> Self {
        let d = Self::default();
        let timeout = cfg.float("scraping", "request_timeout_seconds", d.timeout.as_secs_f64());
        let delay = cfg.float(
            "scraping",
            "delay_between_requests_seconds",
            d.delay.as_secs_f64(),
        );
        Self {
            user_agent: cfg.scraping("user_agent", &d.user_agent),
            accept_language: cfg.scraping("accept_language", &d.accept_language),
            timeout: bounded_secs("request_timeout_seconds", timeout, 1.0, MAX_TIMEOUT_SECONDS),
            delay: bounded_secs("delay_between_requests_seconds", delay, 0.0, MAX_DELAY_SECONDS),
            ebay_app_id: cfg.api_key("ebay_app_id", None),
        }
    }
}
