//! CART classification tree (CPU-only).
//!
//! Nodes are stored in a flat vector; the root is node 0 and children always
//! have larger indices than their parent, so a walk can never loop.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class probabilities, indexed like the forest's class list
        distribution: Vec<f64>,
    },
}

/// Growth limits shared by every tree in a forest.
#[derive(Debug, Clone, Copy)]
pub struct TreeLimits {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<Node>,
}

struct Builder<'a> {
    rows: &'a [Vec<f64>],
    targets: &'a [usize],
    n_classes: usize,
    limits: TreeLimits,
    nodes: Vec<Node>,
}

struct Candidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    /// Grow a tree over `sample` (row indices, duplicates allowed).
    ///
    /// `targets[i]` is the class index of `rows[i]`.
    pub fn fit(
        rows: &[Vec<f64>],
        targets: &[usize],
        n_classes: usize,
        sample: &mut [usize],
        limits: TreeLimits,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = Builder {
            rows,
            targets,
            n_classes,
            limits,
            nodes: Vec::new(),
        };
        builder.grow(sample, 0, rng);
        Self {
            nodes: builder.nodes,
        }
    }

    /// Class distribution of the leaf `x` lands in.
    pub fn leaf_distribution(&self, x: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
                Node::Leaf { distribution } => return distribution,
            }
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!("node[{idx}] feature {feature} out of range"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node[{idx}] threshold is not finite"));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node[{idx}] child {child} out of range"));
                        }
                    }
                }
                Node::Leaf { distribution } => {
                    if distribution.len() != n_classes {
                        return Err(format!(
                            "node[{idx}] distribution len {} != class count {n_classes}",
                            distribution.len()
                        ));
                    }
                    if distribution.iter().any(|p| !p.is_finite() || *p < 0.0) {
                        return Err(format!("node[{idx}] distribution has invalid values"));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Builder<'_> {
    fn grow(&mut self, sample: &mut [usize], depth: usize, rng: &mut StdRng) -> usize {
        let counts = self.class_counts(sample);
        let node_id = self.nodes.len();

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.limits.max_depth.is_some_and(|max| depth >= max);
        if pure || depth_reached || sample.len() < self.limits.min_samples_split {
            self.nodes.push(leaf(&counts, sample.len()));
            return node_id;
        }

        let Some(split) = self.best_split(sample, rng) else {
            self.nodes.push(leaf(&counts, sample.len()));
            return node_id;
        };

        // Reserve the slot; children are pushed after it.
        self.nodes.push(Node::Leaf {
            distribution: Vec::new(),
        });

        let rows = self.rows;
        let mid = partition(sample, |i| rows[i][split.feature] <= split.threshold);
        let (left_sample, right_sample) = sample.split_at_mut(mid);
        let left = self.grow(left_sample, depth + 1, rng);
        let right = self.grow(right_sample, depth + 1, rng);

        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    fn class_counts(&self, sample: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in sample {
            counts[self.targets[i]] += 1;
        }
        counts
    }

    fn best_split(&self, sample: &[usize], rng: &mut StdRng) -> Option<Candidate> {
        let n_features = self.rows.first().map(|r| r.len()).unwrap_or(0);
        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(rng);
        let wanted = self.limits.max_features.clamp(1, n_features.max(1));

        // Features that cannot split this node do not count towards `wanted`.
        let mut best: Option<Candidate> = None;
        let mut splittable = 0;
        for feature in features {
            if splittable == wanted {
                break;
            }
            if let Some(candidate) = self.best_threshold(sample, feature) {
                splittable += 1;
                if best
                    .as_ref()
                    .map_or(true, |b| candidate.impurity < b.impurity)
                {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    /// Lowest weighted Gini over all midpoints of `feature` within `sample`.
    fn best_threshold(&self, sample: &[usize], feature: usize) -> Option<Candidate> {
        let mut column: Vec<(f64, usize)> = sample
            .iter()
            .map(|&i| (self.rows[i][feature], self.targets[i]))
            .collect();
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = column.len();
        if n < 2 {
            return None;
        }
        let mut right = vec![0usize; self.n_classes];
        for &(_, class) in &column {
            right[class] += 1;
        }
        let mut left = vec![0usize; self.n_classes];

        let mut best: Option<Candidate> = None;
        for i in 0..n - 1 {
            let (value, class) = column[i];
            left[class] += 1;
            right[class] -= 1;

            let next = column[i + 1].0;
            if value >= next {
                continue;
            }

            let n_left = i + 1;
            let n_right = n - n_left;
            let impurity = (n_left as f64 * gini(&left, n_left)
                + n_right as f64 * gini(&right, n_right))
                / n as f64;

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let mut threshold = value + (next - value) / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best = Some(Candidate {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
        best
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

fn leaf(counts: &[usize], total: usize) -> Node {
    let total = total.max(1) as f64;
    Node::Leaf {
        distribution: counts.iter().map(|&c| c as f64 / total).collect(),
    }
}

/// Move entries satisfying `pred` to the front, returning how many there are.
fn partition(sample: &mut [usize], pred: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0;
    for i in 0..sample.len() {
        if pred(sample[i]) {
            sample.swap(mid, i);
            mid += 1;
        }
    }
    mid
}
