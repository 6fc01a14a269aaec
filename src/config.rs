//! Layered settings.
//!
//! Defaults, then an optional TOML file, then `PORTFOLIO_PULSE_*`
//! environment variables. Nested keys use a double underscore, e.g.
//! `PORTFOLIO_PULSE_RETRY__MAX_ATTEMPTS=3`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::board::ElementId;
use crate::data::SERIES_CAPACITY;
use crate::source::StreamOptions;
use crate::supervisor::{RetryPolicy, SupervisorSettings};

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_NAME: &str = "portfolio-pulse";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "PORTFOLIO_PULSE";

/// Upper bound for the heartbeat period.
pub const MAX_HEARTBEAT_SECS: u64 = 86_400;

/// Upper bound for any retry delay or stream timeout.
pub const MAX_DELAY_MS: u64 = 3_600_000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub stream: StreamSettings,
    pub retry: RetryPolicy,
    pub heartbeat: HeartbeatSettings,
    pub series: SeriesSettings,
    pub board: BoardSettings,
    pub logging: LoggingSettings,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Event-stream endpoint.
    pub url: String,
    pub connect_timeout_ms: u64,
    /// How long to wait for response headers.
    pub response_timeout_ms: u64,
    /// Longest silence on an open stream before it counts as failed.
    pub idle_timeout_ms: u64,
    /// Bearer token. Usually supplied as `PORTFOLIO_PULSE_STREAM__TOKEN`.
    pub token: Option<String>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000/api/portfolio/stream".to_string(),
            connect_timeout_ms: 5_000,
            response_timeout_ms: 10_000,
            idle_timeout_ms: 30_000,
            token: None,
        }
    }
}

impl fmt::Debug for StreamSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSettings")
            .field("url", &self.url)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("response_timeout_ms", &self.response_timeout_ms)
            .field("idle_timeout_ms", &self.idle_timeout_ms)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl StreamSettings {
    pub fn options(&self) -> StreamOptions {
        StreamOptions {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            response_timeout: Duration::from_millis(self.response_timeout_ms),
            idle_timeout: Duration::from_millis(self.idle_timeout_ms),
            token: self.token.clone().filter(|token| !token.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeartbeatSettings {
    pub interval_secs: u64,
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

impl HeartbeatSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeriesSettings {
    pub capacity: usize,
}

impl Default for SeriesSettings {
    fn default() -> Self {
        Self {
            capacity: SERIES_CAPACITY,
        }
    }
}

/// Which display elements are mounted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    pub elements: Vec<ElementId>,
    pub chart: bool,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            elements: ElementId::ALL.to_vec(),
            chart: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Log file. The TUI owns the terminal, so without one nothing is logged.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file: None,
        }
    }
}

impl Settings {
    /// Load settings from `path` (required if given) or from
    /// `portfolio-pulse.toml` in the working directory (optional), then
    /// apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("board.elements")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the supervisor and sink cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.stream.url.is_empty(), "stream.url must not be empty");
        for (name, ms) in [
            ("stream.connect_timeout_ms", self.stream.connect_timeout_ms),
            ("stream.response_timeout_ms", self.stream.response_timeout_ms),
            ("stream.idle_timeout_ms", self.stream.idle_timeout_ms),
        ] {
            ensure!(
                ms > 0 && ms <= MAX_DELAY_MS,
                "{} must be between 1 and {} ({})",
                name,
                MAX_DELAY_MS,
                ms
            );
        }
        ensure!(self.retry.max_attempts > 0, "retry.max_attempts must be at least 1");
        ensure!(self.retry.initial_delay_ms > 0, "retry.initial_delay_ms must be positive");
        ensure!(
            self.retry.max_delay_ms <= MAX_DELAY_MS,
            "retry.max_delay_ms must be at most {} ({})",
            MAX_DELAY_MS,
            self.retry.max_delay_ms
        );
        ensure!(
            self.retry.initial_delay_ms <= self.retry.max_delay_ms,
            "retry.initial_delay_ms ({}) exceeds retry.max_delay_ms ({})",
            self.retry.initial_delay_ms,
            self.retry.max_delay_ms
        );
        ensure!(self.heartbeat.interval_secs > 0, "heartbeat.interval_secs must be positive");
        ensure!(
            self.heartbeat.interval_secs <= MAX_HEARTBEAT_SECS,
            "heartbeat.interval_secs must be at most {} ({})",
            MAX_HEARTBEAT_SECS,
            self.heartbeat.interval_secs
        );
        ensure!(self.series.capacity > 0, "series.capacity must be at least 1");
        Ok(())
    }

    pub fn supervisor(&self) -> SupervisorSettings {
        SupervisorSettings {
            retry: self.retry,
            heartbeat_interval: self.heartbeat.interval(),
        }
    }
}
