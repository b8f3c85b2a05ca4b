//! Model artifact: a fitted forest plus the feature order it was trained on.
//!
//! Stored as JSON. Loading refuses artifacts whose feature list differs from
//! `FEATURE_COLUMNS`, so a reordered schema fails at startup instead of
//! silently mispredicting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{OrchidError, PredictError, Result};
use crate::ml::RandomForest;
use crate::vitals::{VitalsSample, FEATURE_COLUMNS};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub trained_at: DateTime<Utc>,
    pub n_train: usize,
    pub n_test: usize,
    pub accuracy: f64,
    pub n_trees: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsModel {
    pub format_version: u32,
    pub features: Vec<String>,
    pub forest: RandomForest,
    pub metadata: ModelMetadata,
}

impl VitalsModel {
    pub fn new(forest: RandomForest, metadata: ModelMetadata) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            features: FEATURE_COLUMNS.iter().map(|f| f.to_string()).collect(),
            forest,
            metadata,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            OrchidError::Model(format!("failed to open {}: {}", path.display(), e))
        })?;
        let model: Self = serde_json::from_reader(BufReader::new(file))?;
        model.validate().map_err(OrchidError::Model)?;
        Ok(model)
    }

    /// Write the artifact, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.format_version != FORMAT_VERSION {
            return Err(format!(
                "unsupported format_version {} (expected {FORMAT_VERSION})",
                self.format_version
            ));
        }
        if self.features.iter().map(String::as_str).ne(FEATURE_COLUMNS) {
            return Err(format!(
                "feature order {:?} does not match {:?}",
                self.features, FEATURE_COLUMNS
            ));
        }
        if self.forest.n_features != FEATURE_COLUMNS.len() {
            return Err(format!(
                "forest expects {} features, schema has {}",
                self.forest.n_features,
                FEATURE_COLUMNS.len()
            ));
        }
        self.forest.validate()
    }

    pub fn classes(&self) -> &[String] {
        &self.forest.classes
    }

    pub fn predict(&self, sample: &VitalsSample) -> std::result::Result<String, PredictError> {
        self.forest
            .predict(&sample.to_features())
            .map(str::to_string)
            .map_err(|e| PredictError::InferenceFailure(e.to_string()))
    }
}
