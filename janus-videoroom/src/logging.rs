//! Log subscriber installation
//!
//! Adapter events carry `handle` and `correlation` fields; inside a running
//! [`crate::PluginSession`] they also sit in a `plugin_session` span naming
//! the publisher handle, which the JSON layout records on every line.

use crate::config::{LogFormat, LoggingConfig};
use anyhow::Context as _;
use std::fs::OpenOptions;
use std::str::FromStr;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Install the global subscriber described by `config`.
///
/// `RUST_LOG` takes precedence over the configured levels when set. Fails if
/// a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let directives = filter_directives(config)?;
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&directives))?;
    let writer = make_writer(config.file_path.as_deref())?;

    let layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_line_number(true)
            .with_file(false)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()?;
    Ok(())
}

/// `<default_level>,janus_videoroom=<level>`
pub fn filter_directives(config: &LoggingConfig) -> anyhow::Result<String> {
    let own = parse_level(&config.level)?;
    let others = parse_level(&config.default_level)?;
    Ok(format!(
        "{},{CRATE_TARGET}={}",
        others.as_str().to_ascii_lowercase(),
        own.as_str().to_ascii_lowercase()
    ))
}

fn parse_level(level: &str) -> anyhow::Result<Level> {
    Level::from_str(level).map_err(|_| anyhow::anyhow!("Invalid log level: {level}"))
}

fn make_writer(file_path: Option<&str>) -> anyhow::Result<BoxMakeWriter> {
    let Some(path) = file_path else {
        return Ok(BoxMakeWriter::new(std::io::stdout));
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {path}"))?;
    Ok(BoxMakeWriter::new(Arc::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_scopes_adapter_level() {
        let config = LoggingConfig {
            level: "DEBUG".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(
            filter_directives(&config).unwrap(),
            "warn,janus_videoroom=debug"
        );
    }

    #[test]
    fn test_invalid_levels_are_rejected() {
        let loud = LoggingConfig {
            level: "loud".to_string(),
            ..LoggingConfig::default()
        };
        assert!(filter_directives(&loud).is_err());

        let quiet = LoggingConfig {
            default_level: "hush".to_string(),
            ..LoggingConfig::default()
        };
        assert!(init_logging(&quiet).is_err());
    }

    #[test]
    fn test_unwritable_log_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = make_writer(dir.path().to_str()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to open log file"));
    }
}
