//! Tracing subscriber setup.

use std::fs::OpenOptions;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingSettings;

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Append to the configured file.
    File,
    /// Write to stderr.
    Stderr,
    /// Drop everything.
    Disabled,
}

/// Pick a target. A configured file wins; otherwise only headless runs log,
/// to stderr, since the TUI owns the terminal.
pub fn target(settings: &LoggingSettings, headless: bool) -> LogTarget {
    if settings.file.is_some() {
        LogTarget::File
    } else if headless {
        LogTarget::Stderr
    } else {
        LogTarget::Disabled
    }
}

fn filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level))
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init(settings: &LoggingSettings, headless: bool) -> Result<()> {
    match (target(settings, headless), settings.file.as_deref()) {
        (LogTarget::File, Some(path)) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            fmt()
                .with_env_filter(filter(settings))
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        (LogTarget::Stderr, _) => {
            fmt()
                .with_env_filter(filter(settings))
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_target_selection() {
        let mut settings = LoggingSettings::default();
        assert_eq!(target(&settings, false), LogTarget::Disabled);
        assert_eq!(target(&settings, true), LogTarget::Stderr);

        settings.file = Some(PathBuf::from("pulse.log"));
        assert_eq!(target(&settings, false), LogTarget::File);
        assert_eq!(target(&settings, true), LogTarget::File);
    }

    #[test]
    fn test_unwritable_log_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LoggingSettings {
            level: "debug".into(),
            file: Some(dir.path().join("missing").join("pulse.log")),
        };
        assert!(init(&settings, false).is_err());
    }
}
