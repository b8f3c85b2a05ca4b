//! Offline training run: load → split → fit → evaluate → save.
//!
//! Every failure is fatal for the run; fix the input and run again.

use chrono::Utc;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::config::AppConfig;
use crate::error::{OrchidError, Result};
use crate::ml::{accuracy, train_test_split, ForestParams, RandomForest};
use crate::model::{ModelMetadata, VitalsModel};
use crate::vitals::load_dataset;

#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub test_size: f64,
    pub params: ForestParams,
}

impl TrainingOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            dataset_path: config.training.dataset_path.clone(),
            model_path: config.model.path.clone(),
            test_size: config.training.test_size,
            params: config.training.forest_params(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub n_train: usize,
    pub n_test: usize,
    /// Held-out accuracy in [0, 1]
    pub accuracy: f64,
    pub classes: Vec<String>,
    pub model_path: PathBuf,
}

pub fn run_training(options: &TrainingOptions) -> Result<TrainingReport> {
    let started = Instant::now();
    let dataset = load_dataset(&options.dataset_path)?;

    let split = train_test_split(dataset.len(), options.test_size, options.params.seed)?;
    let train = dataset.subset(&split.train);
    let test = dataset.subset(&split.test);
    info!(
        train_rows = train.len(),
        test_rows = test.len(),
        seed = options.params.seed,
        "Split dataset"
    );

    let forest = RandomForest::fit(&train.rows, &train.labels, &options.params)?;
    info!(
        trees = forest.trees.len(),
        classes = forest.classes.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Fitted forest"
    );

    let predicted = test
        .rows
        .iter()
        .map(|row| forest.predict(row))
        .collect::<Result<Vec<&str>>>()?;
    let score = accuracy(&predicted, &test.labels)?;
    info!(accuracy = score, "Evaluated on held-out rows");

    let classes = forest.classes.clone();
    let model = VitalsModel::new(
        forest,
        ModelMetadata {
            trained_at: Utc::now(),
            n_train: train.len(),
            n_test: test.len(),
            accuracy: score,
            n_trees: options.params.n_trees,
            seed: options.params.seed,
        },
    );
    model.save(&options.model_path).map_err(|e| {
        OrchidError::Training(format!(
            "failed to write {}: {}",
            options.model_path.display(),
            e
        ))
    })?;
    info!(path = %options.model_path.display(), "Saved model artifact");

    Ok(TrainingReport {
        n_train: train.len(),
        n_test: test.len(),
        accuracy: score,
        classes,
        model_path: options.model_path.clone(),
    })
}
