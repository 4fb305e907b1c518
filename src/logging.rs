//! Structured logging configuration using tracing

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::FmtSubscriber;

/// Log level configuration
#[derive(Debug, Clone, Copy)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => LogLevel::Error,
            "warn" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => LogLevel::Info, // Default
        }
    }
}

/// Log format configuration
#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            // The primary consumer is a developer terminal
            format: LogFormat::Pretty,
        }
    }
}

/// Initialize logging with the given configuration
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let level: Level = config.level.into();

    match config.format {
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .json()
                .with_max_level(level)
                .with_span_events(FmtSpan::CLOSE) // Only log on span close
                .with_writer(std::io::stderr) // Write to stderr, no buffering
                .finish();

            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Pretty => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(std::io::stderr)
                .finish();

            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}
