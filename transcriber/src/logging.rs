use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::errors::AppError;

/// How diagnostics are emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    /// Filter used when `RUST_LOG` is not set, e.g. `info` or `vlm_pipeline=debug`.
    pub level: String,
    /// Emit one JSON object per event.
    pub json: bool,
    /// Append to this file instead of writing to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

/// Builds the filter: `RUST_LOG` wins, then `level`.
///
/// # Errors
///
/// Returns `AppError::Logging` if `level` is not a valid directive.
pub fn env_filter(level: &str) -> Result<EnvFilter, AppError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| AppError::Logging(format!("invalid log level {level:?}: {e}")))
}

/// Installs the global subscriber. Stdout stays reserved for results.
///
/// # Errors
///
/// Fails on an invalid filter, an unwritable log file, or a second call.
pub fn init(options: &LogOptions) -> Result<(), AppError> {
    let filter = env_filter(&options.level)?;

    let (writer, ansi) = match &options.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(writer);

    let installed = if options.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| AppError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(matches!(
            env_filter("vlm_pipeline=loud"),
            Err(AppError::Logging(_))
        ));
        assert!(env_filter("debug").is_ok());
    }
}
