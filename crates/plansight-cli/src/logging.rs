//! Logging setup for the plansight binary
//!
//! Console output goes to stderr so reports on stdout stay machine-readable. A JSON
//! log file with daily rotation can be enabled for bug reports.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Where log events go and how much of them to keep
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory for the rotating JSON log; file logging is off when unset
    pub log_dir: Option<PathBuf>,
    /// Human-readable events on stderr
    pub console: bool,
    /// Source file and line on console events
    pub source_location: bool,
    /// Filter directives used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            console: true,
            source_location: false,
            filter: "warn,plansight=info,plansight_analyzer=info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Everything at debug level, with source locations
    pub fn verbose() -> Self {
        Self {
            source_location: true,
            filter: "debug".to_string(),
            ..Self::default()
        }
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.filter))
    }
}

/// Installs the global subscriber.
///
/// Keep the returned guard alive until exit; dropping it flushes the file writer.
pub fn init(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let console = config.console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(config.source_location)
            .with_line_number(config.source_location)
            .with_filter(config.env_filter())
    });

    let (file, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "plansight.log"));
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_writer(writer)
                .with_filter(config.env_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()?;

    tracing::debug!(log_dir = ?config.log_dir, console = config.console, "logging ready");
    Ok(guard)
}

/// Default directory for JSON log files
pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_default()
        .join("plansight")
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_console_only() {
        let config = LoggingConfig::default();
        assert!(config.console);
        assert!(config.log_dir.is_none());
        assert!(!config.source_location);
    }

    #[test]
    fn test_verbose_config() {
        let config = LoggingConfig::verbose().with_log_dir("/tmp/plansight-logs");
        assert_eq!(config.filter, "debug");
        assert!(config.source_location);
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/plansight-logs")));
    }

    #[test]
    fn test_log_directory() {
        assert!(log_directory().ends_with("plansight/logs"));
    }
}
