//! Bagged forest of CART trees with soft voting.
//!
//! Training is deterministic for a fixed seed: every tree draws its bootstrap
//! sample and feature subsets from its own `StdRng`, seeded from a master
//! generator in tree order.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tree::{DecisionTree, TreeLimits};
use crate::error::{OrchidError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    #[serde(default)]
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features tried per split; `floor(sqrt(n_features))` when unset.
    #[serde(default)]
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 500,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            seed: 42,
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.n_trees == 0 {
            return Err("n_trees must be > 0".to_string());
        }
        if self.min_samples_split < 2 {
            return Err("min_samples_split must be >= 2".to_string());
        }
        if self.max_depth == Some(0) {
            return Err("max_depth must be > 0 when set".to_string());
        }
        if self.max_features == Some(0) {
            return Err("max_features must be > 0 when set".to_string());
        }
        Ok(())
    }

    fn resolved_max_features(&self, n_features: usize) -> usize {
        self.max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().floor() as usize)
            .clamp(1, n_features)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    /// Sorted unique training labels; leaf distributions index into this.
    pub classes: Vec<String>,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn fit(rows: &[Vec<f64>], labels: &[String], params: &ForestParams) -> Result<Self> {
        params.validate().map_err(OrchidError::Validation)?;

        if rows.is_empty() {
            return Err(OrchidError::Training("no training rows".to_string()));
        }
        if rows.len() != labels.len() {
            return Err(OrchidError::Training(format!(
                "row count {} != label count {}",
                rows.len(),
                labels.len()
            )));
        }
        let n_features = rows[0].len();
        if n_features == 0 {
            return Err(OrchidError::Training("rows have no features".to_string()));
        }
        if let Some(idx) = rows.iter().position(|r| r.len() != n_features) {
            return Err(OrchidError::Training(format!(
                "row {idx} has {} features, expected {n_features}",
                rows[idx].len()
            )));
        }
        if rows.iter().flatten().any(|v| !v.is_finite()) {
            return Err(OrchidError::Training(
                "training rows contain non-finite values".to_string(),
            ));
        }

        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();
        let targets: Vec<usize> = labels
            .iter()
            .map(|l| classes.binary_search(l).unwrap_or_default())
            .collect();

        let limits = TreeLimits {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            max_features: params.resolved_max_features(n_features),
        };

        let n = rows.len();
        let mut master = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees);
        for t in 0..params.n_trees {
            let mut rng = StdRng::seed_from_u64(master.gen());
            let mut sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let tree = DecisionTree::fit(rows, &targets, classes.len(), &mut sample, limits, &mut rng);
            debug!(tree = t, nodes = tree.nodes.len(), leaves = tree.n_leaves(), "grew tree");
            trees.push(tree);
        }

        Ok(Self {
            n_features,
            classes,
            trees,
        })
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.n_features == 0 {
            return Err("n_features must be > 0".to_string());
        }
        if self.classes.is_empty() {
            return Err("classes must not be empty".to_string());
        }
        if self.trees.is_empty() {
            return Err("trees must not be empty".to_string());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|e| format!("tree[{idx}]: {e}"))?;
        }
        Ok(())
    }

    /// Mean of the leaf distributions over all trees.
    pub fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>> {
        if x.len() != self.n_features {
            return Err(OrchidError::Validation(format!(
                "RandomForest input dim mismatch: got {}, expected {}",
                x.len(),
                self.n_features
            )));
        }
        if let Some(i) = x.iter().position(|v| !v.is_finite()) {
            return Err(OrchidError::Validation(format!(
                "input feature {i} is not finite"
            )));
        }

        let mut proba = vec![0.0_f64; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.leaf_distribution(x)) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        for p in &mut proba {
            *p /= n_trees;
        }
        Ok(proba)
    }

    /// Most probable label; ties go to the earliest class.
    pub fn predict(&self, x: &[f64]) -> Result<&str> {
        let proba = self.predict_proba(x)?;
        let mut best = 0;
        for (i, p) in proba.iter().enumerate().skip(1) {
            if *p > proba[best] {
                best = i;
            }
        }
        Ok(self.classes[best].as_str())
    }
}
