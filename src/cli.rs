use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::config::AppConfig;
use crate::error::Result;
use crate::model::VitalsModel;
use crate::server::{self, AppState};
use crate::training::{run_training, TrainingOptions};
use crate::vitals::VitalsSample;

#[derive(Parser)]
#[command(name = "orchid")]
#[command(author = "Orchid Team")]
#[command(version = "0.1.0")]
#[command(about = "Vital-sign disease classifier: train a forest, serve predictions", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory (default.toml, then $ORCHID_ENV)
    #[arg(short, long, default_value = "config")]
    pub config: PathBuf,

    /// Model artifact path
    #[arg(short, long)]
    pub model: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the classifier from a CSV dataset and save the artifact
    Train {
        /// Dataset CSV (header: systolic,diastolic,spo2,temperature,disease)
        #[arg(short, long)]
        dataset: Option<PathBuf>,
        /// Number of trees
        #[arg(long)]
        trees: Option<usize>,
        /// Seed for the split and the forest
        #[arg(long)]
        seed: Option<u64>,
        /// Held-out fraction (e.g., 0.2 = 20%)
        #[arg(long)]
        test_size: Option<f64>,
        /// Maximum tree depth
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Serve the prediction form over HTTP
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,
        /// Bind port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Predict one sample with the saved artifact
    Predict {
        #[arg(long)]
        systolic: f64,
        #[arg(long)]
        diastolic: f64,
        #[arg(long)]
        spo2: f64,
        #[arg(long)]
        temperature: f64,
    },
}

impl Cli {
    /// Flags win over files and environment.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(model) = &self.model {
            config.model.path = model.clone();
        }
        match &self.command {
            Commands::Train {
                dataset,
                trees,
                seed,
                test_size,
                max_depth,
            } => {
                if let Some(dataset) = dataset {
                    config.training.dataset_path = dataset.clone();
                }
                if let Some(trees) = trees {
                    config.training.n_trees = *trees;
                }
                if let Some(seed) = seed {
                    config.training.seed = *seed;
                }
                if let Some(test_size) = test_size {
                    config.training.test_size = *test_size;
                }
                if max_depth.is_some() {
                    config.training.max_depth = *max_depth;
                }
            }
            Commands::Serve { host, port } => {
                if let Some(host) = host {
                    config.server.host = host.clone();
                }
                if let Some(port) = port {
                    config.server.port = *port;
                }
            }
            Commands::Predict { .. } => {}
        }
    }
}

pub fn train(config: &AppConfig) -> Result<()> {
    let report = run_training(&TrainingOptions::from_config(config))?;
    println!(
        "✅ Model trained with accuracy: {:.2}%",
        report.accuracy * 100.0
    );
    println!("🔁 Model saved as {}", report.model_path.display());
    Ok(())
}

pub async fn serve(config: &AppConfig) -> Result<()> {
    // Fatal before binding: no artifact, no service.
    let model = VitalsModel::load(&config.model.path)?;
    info!(
        path = %config.model.path.display(),
        classes = ?model.classes(),
        trained_at = %model.metadata.trained_at,
        "Loaded model artifact"
    );
    server::run_server(&config.server, AppState::new(model)).await
}

pub fn predict(config: &AppConfig, sample: VitalsSample) -> Result<()> {
    let model = VitalsModel::load(&config.model.path)?;
    let label = model.predict(&sample)?;
    println!("🩺 Predicted Disease: {label}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        let dir = tempfile::tempdir().unwrap();
        AppConfig::load_from(dir.path()).unwrap()
    }

    #[test]
    fn train_flags_override_config() {
        let cli = Cli::parse_from([
            "orchid", "--model", "out.json", "train", "--dataset", "data.csv", "--trees", "50",
            "--seed", "7", "--max-depth", "4",
        ]);
        let mut config = base_config();
        cli.apply_overrides(&mut config);

        assert_eq!(config.model.path, PathBuf::from("out.json"));
        assert_eq!(config.training.dataset_path, PathBuf::from("data.csv"));
        assert_eq!(config.training.n_trees, 50);
        assert_eq!(config.training.seed, 7);
        assert_eq!(config.training.max_depth, Some(4));
        assert!((config.training.test_size - 0.2).abs() < 1e-12);
    }

    #[test]
    fn serve_flags_override_config() {
        let cli = Cli::parse_from(["orchid", "serve", "--port", "9090"]);
        let mut config = base_config();
        cli.apply_overrides(&mut config);

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
    }
}
