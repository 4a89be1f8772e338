/*!
 * Logging Module
 * Subscriber setup: rolling log files plus console output
 */
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Logging settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub production: bool,
    /// Level for this crate when `RUST_LOG` is not set.
    pub level: String,
    pub dir: String,
}

impl LogSettings {
    pub fn from_env() -> Self {
        let production = std::env::var("ENVIRONMENT").is_ok_and(|env| env == "production");
        Self {
            level: std::env::var("LOG_LEVEL")
                .unwrap_or_else(|_| if production { "info" } else { "debug" }.to_string()),
            dir: std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            production,
        }
    }

    fn filter(&self) -> String {
        format!(
            "ningrat_backend={},tower_http=info,axum=info,sqlx=warn,aws_config=warn,aws_sdk_s3=warn",
            self.level
        )
    }
}

/// Initialize the logging system.
///
/// Writes `app.log` (everything) and `error.log` (JSON, errors only) under
/// the log directory, rotated daily, plus the console. Production output is
/// JSON throughout. The returned guards flush the background writers on
/// drop; hold them for the lifetime of the process.
pub fn init() -> Vec<WorkerGuard> {
    let settings = LogSettings::from_env();

    std::fs::create_dir_all(&settings.dir).ok();

    let (file_writer, file_guard) = non_blocking(rolling::daily(&settings.dir, "app.log"));
    let (error_writer, error_guard) = non_blocking(rolling::daily(&settings.dir, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.filter()));

    let error_layer = fmt::layer()
        .json()
        .with_writer(error_writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(LevelFilter::ERROR);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(error_layer);

    if settings.production {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(file_writer)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(fmt::layer().json().with_writer(console_writer).with_target(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(file_writer)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false),
            )
            .with(fmt::layer().with_writer(console_writer).pretty())
            .init();
    }

    tracing::info!(
        production = settings.production,
        dir = %settings.dir,
        "logging initialized"
    );

    vec![file_guard, error_guard, console_guard]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_targets_this_crate() {
        let settings = LogSettings {
            production: false,
            level: "debug".to_string(),
            dir: "logs".to_string(),
        };
        let filter = settings.filter();
        assert!(filter.starts_with("ningrat_backend=debug"));
        assert!(EnvFilter::try_new(filter).is_ok());
    }

    #[test]
    fn test_from_env_has_a_level_and_dir() {
        let settings = LogSettings::from_env();
        assert!(!settings.level.is_empty());
        assert!(!settings.dir.is_empty());
    }
}
