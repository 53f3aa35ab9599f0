//! Logging infrastructure for tidemix

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{DebugConfig, LogLevel};

/// Log targets owned by tidemix; everything else stays at `warn`
const TARGETS: &[&str] = &["tidemix", "tm_core", "tm_audio", "mixer", "pool", "device"];

fn level_name(log_level: LogLevel) -> Option<&'static str> {
    match log_level {
        LogLevel::Off => None,
        LogLevel::Error => Some("error"),
        LogLevel::Warn => Some("warn"),
        LogLevel::Info => Some("info"),
        LogLevel::Debug => Some("debug"),
        LogLevel::Trace => Some("trace"),
    }
}

/// Filter directives raising the tidemix targets to `level`
fn directives(level: &str) -> String {
    TARGETS
        .iter()
        .fold(String::from("warn"), |mut out, target| {
            out.push_str(&format!(",{target}={level}"));
            out
        })
}

/// `RUST_LOG` when set, otherwise the tidemix targets at `level`
fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(level)))
}

/// Initialize the logging system based on configuration
pub fn init(debug: &DebugConfig) {
    let Some(level) = level_name(debug.log_level) else {
        return;
    };

    let file_layer = if debug.log_to_file {
        match std::fs::File::create(&debug.log_path) {
            Ok(file) => Some(fmt::layer().with_writer(file).with_ansi(false)),
            Err(e) => {
                eprintln!("Cannot open log file {}: {}", debug.log_path.display(), e);
                None
            }
        }
    } else {
        None
    };

    let _ = tracing_subscriber::registry()
        .with(filter(level))
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(file_layer)
        .try_init();
}

/// Initialize logging at `info` for the tidemix targets (tests and quick starts)
pub fn init_default() {
    let _ = tracing_subscriber::registry()
        .with(filter("info"))
        .with(fmt::layer())
        .try_init();
}

// Convenience macros for component-specific logging

/// Log a mixer trace message
#[macro_export]
macro_rules! mixer_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "mixer", $($arg)*)
    };
}

/// Log a mixer debug message
#[macro_export]
macro_rules! mixer_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "mixer", $($arg)*)
    };
}

/// Log a frame pool trace message
#[macro_export]
macro_rules! pool_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "pool", $($arg)*)
    };
}

/// Log a device backend debug message
#[macro_export]
macro_rules! device_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "device", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(level_name(LogLevel::Off), None);
        assert_eq!(level_name(LogLevel::Warn), Some("warn"));
        assert_eq!(level_name(LogLevel::Trace), Some("trace"));
    }

    #[test]
    fn test_directives_cover_tidemix_targets() {
        let directives = directives("debug");
        assert!(directives.starts_with("warn,"));
        for target in TARGETS {
            assert!(directives.contains(&format!("{target}=debug")));
        }
        assert!(directives.parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn test_init_is_repeatable() {
        init_default();
        init(&DebugConfig::default());
    }
}
