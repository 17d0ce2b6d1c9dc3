use std::io::Write;
use std::str::FromStr;

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

static LOGGER: StderrLogger = StderrLogger;

/// Environment variable overriding the default level, e.g. `KMEANS_LOG=debug`.
pub const LOG_ENV: &str = "KMEANS_LOG";

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(&Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(), record);
        let _ = writeln!(std::io::stderr().lock(), "{}", line);
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn format_line(timestamp: &str, record: &Record) -> String {
    format!("{} {:<5} {} - {}", timestamp, record.level(), record.target(), record.args())
}

fn level_from_env(default: LevelFilter) -> LevelFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|value| LevelFilter::from_str(value.trim()).ok())
        .unwrap_or(default)
}

/// Installs the process-wide logger. `KMEANS_LOG` takes precedence over `default`.
pub fn init_logger(default: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level_from_env(default));
    Ok(())
}
