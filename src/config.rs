use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ml::ForestParams;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind the prediction service on
    pub host: String,
    /// Port to bind the prediction service on
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Artifact written by `train` and read by `serve`
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    /// CSV with header `systolic,diastolic,spo2,temperature,disease`
    pub dataset_path: PathBuf,
    /// Fraction of rows held out for evaluation (e.g., 0.2 = 20%)
    pub test_size: f64,
    /// Seed for both the split and the forest
    pub seed: u64,
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum tree depth (unbounded when unset)
    #[serde(default)]
    pub max_depth: Option<usize>,
    /// Minimum rows a node needs before it may be split
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
}

fn default_min_samples_split() -> usize {
    2
}

impl TrainingConfig {
    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features: None,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily-rolling log files (console only when unset)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("model.path", "model.json")?
            .set_default("training.dataset_path", "vitals_dataset.csv")?
            .set_default("training.test_size", 0.2)?
            .set_default("training.seed", 42)?
            .set_default("training.n_trees", 500)?
            .set_default("training.min_samples_split", 2)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("ORCHID_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (ORCHID_SERVER__PORT, etc.)
            .add_source(
                Environment::with_prefix("ORCHID")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.host.trim().is_empty() {
            errors.push("server.host must not be empty".to_string());
        }

        if !(self.training.test_size > 0.0 && self.training.test_size < 1.0) {
            errors.push(format!(
                "training.test_size must be between 0 and 1 (got {})",
                self.training.test_size
            ));
        }

        if self.training.n_trees == 0 {
            errors.push("training.n_trees must be positive".to_string());
        }

        if self.training.min_samples_split < 2 {
            errors.push("training.min_samples_split must be at least 2".to_string());
        }

        if self.training.max_depth == Some(0) {
            errors.push("training.max_depth must be positive when set".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_any_files() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_from(dir.path()).unwrap();

        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.model.path, PathBuf::from("model.json"));
        assert_eq!(cfg.training.n_trees, 500);
        assert_eq!(cfg.training.seed, 42);
        assert!((cfg.training.test_size - 0.2).abs() < 1e-12);
        assert_eq!(cfg.training.max_depth, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn default_toml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[server]\nport = 8123\n\n[training]\nn_trees = 25\nmax_depth = 6\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(cfg.server.port, 8123);
        assert_eq!(cfg.training.n_trees, 25);
        assert_eq!(cfg.training.max_depth, Some(6));

        let params = cfg.training.forest_params();
        assert_eq!(params.n_trees, 25);
        assert_eq!(params.max_depth, Some(6));
    }

    #[test]
    fn validate_collects_every_violation() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = AppConfig::load_from(dir.path()).unwrap();
        cfg.training.test_size = 1.0;
        cfg.training.n_trees = 0;
        cfg.training.min_samples_split = 1;

        let errors = cfg.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
