//! Logging setup
//!
//! CLI mode logs to stderr. The TUI owns the terminal, so it logs to
//! `<cache dir>/mflix/mflix.log` instead.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where log lines go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File,
}

/// Default filter when RUST_LOG is unset
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "mflix=debug"
    } else {
        "mflix=info"
    }
}

/// Log file used by the TUI
pub fn log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|p| p.join("mflix").join("mflix.log"))
}

/// Install the global subscriber. Returns the log file path in file mode.
pub fn init(target: LogTarget, verbose: bool) -> Result<Option<PathBuf>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let registry = tracing_subscriber::registry().with(env_filter);

    match target {
        LogTarget::Stderr => {
            registry
                .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
                .try_init()?;
            Ok(None)
        }
        LogTarget::File => {
            let path = log_path().ok_or_else(|| anyhow::anyhow!("Could not determine cache dir"))?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
                .try_init()?;
            Ok(Some(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "mflix=info");
        assert_eq!(default_directive(true), "mflix=debug");
        assert!(EnvFilter::try_new(default_directive(true)).is_ok());
    }

    #[test]
    fn test_log_path_under_cache_dir() {
        if let Some(path) = log_path() {
            assert!(path.ends_with("mflix/mflix.log"));
        }
    }
}
