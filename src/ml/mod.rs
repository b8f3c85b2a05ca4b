//! Lightweight ML utilities: a seeded random forest and the helpers needed to
//! train and score it.
//!
//! Pure Rust and CPU-only; the fitted forest serializes with serde so the
//! trainer and the prediction service share one JSON artifact.

pub mod forest;
pub mod metrics;
pub mod split;
pub mod tree;

pub use forest::{ForestParams, RandomForest};
pub use metrics::accuracy;
pub use split::{train_test_split, Split};
pub use tree::{DecisionTree, Node};
