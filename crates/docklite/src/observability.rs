//! Logging setup for the docklite binary. Only events from docklite's own
//! crates are shown unless `RUST_LOG` says otherwise.
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use tracing::Level;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Crates whose events pass the default filter
const LOG_TARGETS: [&str; 2] = ["docklite", "libdocklite"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            unknown => bail!("unknown log format: {}", unknown),
        }
    }
}

/// Debug builds log everything docklite does, release builds only errors.
#[cfg(debug_assertions)]
const DEFAULT_LOG_LEVEL: Level = Level::DEBUG;
#[cfg(not(debug_assertions))]
const DEFAULT_LOG_LEVEL: Level = Level::ERROR;

fn detect_log_level(input: Option<&str>, is_debug: bool) -> Result<Level> {
    // `log-level` wins over `debug` when both are given
    match input {
        Some(level) => Ok(Level::from_str(level)?),
        None if is_debug => Ok(Level::DEBUG),
        None => Ok(DEFAULT_LOG_LEVEL),
    }
}

/// `RUST_LOG` replaces the filter entirely; otherwise `level` applies to
/// docklite's crates and everything else stays quiet.
fn filter_directives(level: Level, rust_log: Option<&str>) -> String {
    match rust_log {
        Some(directives) if !directives.trim().is_empty() => directives.to_owned(),
        _ => {
            let level = level.to_string().to_ascii_lowercase();
            LOG_TARGETS
                .iter()
                .map(|target| format!("{target}={level}"))
                .collect::<Vec<_>>()
                .join(",")
        }
    }
}

#[derive(Debug, Default)]
pub struct ObservabilityConfig {
    pub log_debug_flag: bool,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub log_format: Option<String>,
}

impl From<&crate::Opts> for ObservabilityConfig {
    fn from(opts: &crate::Opts) -> Self {
        Self {
            log_debug_flag: opts.global.debug,
            log_level: opts.global.log_level.to_owned(),
            log_file: opts.global.log.to_owned(),
            log_format: opts.global.log_format.to_owned(),
        }
    }
}

pub fn init<T>(config: T) -> Result<()>
where
    T: Into<ObservabilityConfig>,
{
    let config = config.into();
    let level = detect_log_level(config.log_level.as_deref(), config.log_debug_flag)
        .context("failed to parse log level")?;
    let directives = filter_directives(level, std::env::var("RUST_LOG").ok().as_deref());
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter {directives:?}"))?;
    let log_format = config
        .log_format
        .as_deref()
        .map_or(Ok(LogFormat::Text), LogFormat::from_str)
        .context("failed to detect log format")?;

    let writer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            BoxMakeWriter::new(std::sync::Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };
    let ansi = config.log_file.is_none();

    let (text, json) = match log_format {
        LogFormat::Text => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(ansi)
                    .with_writer(writer),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_span_list(false)
                    .with_writer(writer),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logger: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_log_level() {
        for (input, expected) in [
            ("error", Level::ERROR),
            ("warn", Level::WARN),
            ("info", Level::INFO),
            ("debug", Level::DEBUG),
            ("trace", Level::TRACE),
        ] {
            assert_eq!(detect_log_level(Some(input), false).unwrap(), expected);
        }
        assert_eq!(detect_log_level(None, true).unwrap(), Level::DEBUG);
        assert_eq!(detect_log_level(Some("warn"), true).unwrap(), Level::WARN);
        assert_eq!(detect_log_level(None, false).unwrap(), DEFAULT_LOG_LEVEL);
        assert!(detect_log_level(Some("invalid"), false).is_err());
    }

    #[test]
    fn test_log_format() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_filter_scoped_to_docklite() {
        assert_eq!(
            filter_directives(Level::INFO, None),
            "docklite=info,libdocklite=info"
        );
        assert_eq!(
            filter_directives(Level::DEBUG, Some(" ")),
            "docklite=debug,libdocklite=debug"
        );
        assert_eq!(
            filter_directives(Level::ERROR, Some("libdocklite::container=trace")),
            "libdocklite::container=trace"
        );
        assert!(EnvFilter::try_new(filter_directives(Level::WARN, None)).is_ok());
    }

    #[test]
    fn test_init_with_bad_level() {
        let config = ObservabilityConfig {
            log_level: Some("loud".to_owned()),
            ..Default::default()
        };
        assert!(init(config).is_err());
    }
}
