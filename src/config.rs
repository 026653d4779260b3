//! Layered configuration for the CLI binary: built-in defaults, overridden
//! by an optional TOML file, overridden by explicit CLI flags.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ProxtrieError;

fn default_result_count() -> usize {
    5
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub dictionary_path: Option<PathBuf>,
    pub penalty_path: Option<PathBuf>,
    /// `None` defers to [`std::thread::available_parallelism`].
    pub threads: Option<usize>,
    pub result_count: usize,
    pub pruning: bool,
    pub stats: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            dictionary_path: None,
            penalty_path: None,
            threads: None,
            result_count: default_result_count(),
            pruning: true,
            stats: false,
        }
    }
}

impl EngineConfig {
    /// Loads a TOML config file and layers it on top of [`Default`]; a
    /// missing field in the file keeps the default.
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, ProxtrieError> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| ProxtrieError::Config(e.to_string()))
    }

    pub fn resolved_threads(&self) -> usize {
        self.threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_pruning_enabled() {
        let config = EngineConfig::default();
        assert!(config.pruning);
        assert_eq!(config.result_count, 5);
    }

    #[test]
    fn resolved_threads_falls_back_to_available_parallelism() {
        let config = EngineConfig::default();
        assert!(config.resolved_threads() >= 1);
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: EngineConfig = toml::from_str("result_count = 10\n").unwrap();
        assert_eq!(config.result_count, 10);
        assert!(config.pruning);
    }
}
