//! Simulator configuration from environment variables and TOML files.
//!
//! All values come from `WORKSHOP_*` environment variables with sensible
//! defaults. Invalid values fall back to defaults without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `WORKSHOP_TIME_UNIT_MS` | 1000 | Wall-clock length of one service unit |
//! | `WORKSHOP_SEED` | unset | Jitter seed (unset = OS entropy) |
//! | `WORKSHOP_JITTER` | true | Apply +/-1 unit jitter to service times |
//! | `WORKSHOP_IDLE_BACKOFF_MS` | 10 | Max idle wait of a pipeline worker |
//! | `WORKSHOP_DEADLINE_SECS` | unset | Optional limit on each run |
//! | `WORKSHOP_LOG_FORMAT` | pretty | `pretty` or `json` |
//! | `WORKSHOP_LOG_LEVEL` | info | Tracing filter directive |

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scheduler::SchedulerConfig;
use crate::simulation::Scenario;
use crate::telemetry::{LogConfig, LogFormat};
use crate::timing::{FixedClock, JitterClock, ServiceClock};

pub const DEFAULT_TIME_UNIT_MS: u64 = 1000;
pub const DEFAULT_IDLE_BACKOFF_MS: u64 = 10;
/// Floor for the idle backoff so idle workers never spin.
const MIN_IDLE_BACKOFF_MS: u64 = 1;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// All simulator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkshopConfig {
    pub time_unit_ms: u64,
    pub seed: Option<u64>,
    pub jitter: bool,
    pub idle_backoff_ms: u64,
    pub deadline_secs: Option<u64>,
    pub log: LogConfig,
    /// Scenarios to run; empty means the canonical set.
    pub scenarios: Vec<Scenario>,
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            time_unit_ms: DEFAULT_TIME_UNIT_MS,
            seed: None,
            jitter: true,
            idle_backoff_ms: DEFAULT_IDLE_BACKOFF_MS,
            deadline_secs: None,
            log: LogConfig::default(),
            scenarios: Vec::new(),
        }
    }
}

impl WorkshopConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text)?;
        config.normalize();
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Override fields with any `WORKSHOP_*` variables that are set and valid.
    pub fn with_env_overrides(mut self) -> Self {
        self.time_unit_ms = parse_u64("WORKSHOP_TIME_UNIT_MS", self.time_unit_ms);
        self.seed = parse_opt_u64("WORKSHOP_SEED").or(self.seed);
        self.jitter = parse_bool("WORKSHOP_JITTER", self.jitter);
        self.idle_backoff_ms = parse_u64("WORKSHOP_IDLE_BACKOFF_MS", self.idle_backoff_ms);
        self.deadline_secs = parse_opt_u64("WORKSHOP_DEADLINE_SECS").or(self.deadline_secs);
        if let Some(format) = std::env::var("WORKSHOP_LOG_FORMAT")
            .ok()
            .and_then(|v| v.parse::<LogFormat>().ok())
        {
            self.log.format = format;
        }
        if let Ok(level) = std::env::var("WORKSHOP_LOG_LEVEL") {
            if !level.trim().is_empty() {
                self.log.level = level;
            }
        }
        self.normalize();
        self
    }

    fn normalize(&mut self) {
        self.time_unit_ms = self.time_unit_ms.max(1);
        self.idle_backoff_ms = self.idle_backoff_ms.max(MIN_IDLE_BACKOFF_MS);
    }

    pub fn time_unit(&self) -> Duration {
        Duration::from_millis(self.time_unit_ms)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            idle_backoff: Duration::from_millis(self.idle_backoff_ms),
            deadline: self.deadline(),
        }
    }

    /// Service clock described by this configuration.
    pub fn build_clock(&self) -> Arc<dyn ServiceClock> {
        let unit = self.time_unit();
        match (self.jitter, self.seed) {
            (false, _) => Arc::new(FixedClock::new(unit)),
            (true, Some(seed)) => Arc::new(JitterClock::seeded(unit, seed)),
            (true, None) => Arc::new(JitterClock::new(unit)),
        }
    }

    /// Configured scenarios, or the canonical set when none are given.
    pub fn scenarios(&self) -> Vec<Scenario> {
        if self.scenarios.is_empty() {
            Scenario::CANONICAL.to_vec()
        } else {
            self.scenarios.clone()
        }
    }

    /// Human-readable warnings about suspicious settings.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for s in &self.scenarios {
            if s.slots == 0 || s.servers == 0 {
                warnings.push(format!("scenario {s} has a zero-capacity stage and will be rejected"));
            }
        }
        if let Some(deadline) = self.deadline() {
            // Slowest path: four mechanical stages at +1 jitter each.
            let slowest = self.time_unit() * (6 * 4);
            if deadline < slowest {
                warnings.push(format!(
                    "deadline {}s is shorter than one vehicle's slowest path ({}s)",
                    deadline.as_secs(),
                    slowest.as_secs_f64()
                ));
            }
        }
        warnings
    }

    /// `KEY=value` lines for the effective configuration.
    pub fn effective_lines(&self) -> Vec<String> {
        let opt = |v: Option<u64>| v.map_or_else(|| "unset".to_string(), |v| v.to_string());
        vec![
            format!("WORKSHOP_TIME_UNIT_MS={}", self.time_unit_ms),
            format!("WORKSHOP_SEED={}", opt(self.seed)),
            format!("WORKSHOP_JITTER={}", self.jitter),
            format!("WORKSHOP_IDLE_BACKOFF_MS={}", self.idle_backoff_ms),
            format!("WORKSHOP_DEADLINE_SECS={}", opt(self.deadline_secs)),
            format!(
                "WORKSHOP_LOG_FORMAT={}",
                match self.log.format {
                    LogFormat::Json => "json",
                    LogFormat::Pretty => "pretty",
                }
            ),
            format!("WORKSHOP_LOG_LEVEL={}", self.log.level),
        ]
    }
}

/// Load configuration from the environment on top of the defaults.
pub fn load() -> WorkshopConfig {
    WorkshopConfig::default().with_env_overrides()
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse an optional `u64` env var; missing or invalid is `None`.
fn parse_opt_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<u64>().ok())
}

/// Parse a boolean env var (`true/false/1/0/yes/no`).
fn parse_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
