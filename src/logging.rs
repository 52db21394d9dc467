use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Declarative logging settings, read from an optional JSON side file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directives, same syntax as `RUST_LOG`.
    pub filter: String,
    /// Log file target; stdout when absent.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: None,
        }
    }
}

/// Read a `LogConfig` from a JSON file. Pure: no subscriber is touched.
pub fn load_config(path: &Path) -> Result<LogConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read log config {}", path.display()))?;
    let config = serde_json::from_str(&raw)
        .with_context(|| format!("invalid log config {}", path.display()))?;
    Ok(config)
}

/// Install the process-wide subscriber. `RUST_LOG`, when set, overrides
/// the configured filter.
pub fn init(config: &LogConfig) -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(env) if !env.trim().is_empty() => EnvFilter::try_new(env),
        _ => EnvFilter::try_new(&config.filter),
    }
    .context("invalid log filter directives")?;

    match &config.file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    Ok(())
}
