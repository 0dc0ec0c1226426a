//! Gradient-boosted regression trees
//!
//! Second-order boosting on squared error in the XGBoost style:
//! - Leaf weights `w* = -G / (H + lambda)`
//! - Split gain `0.5 * [GL²/(HL+λ) + GR²/(HR+λ) - G²/(H+λ)] - γ`
//! - Row subsampling per tree and column subsampling per tree, driven by a
//!   seeded generator so fits are reproducible

use crate::{MathError, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Booster hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    /// Fraction of rows drawn for each tree
    pub subsample: f64,
    /// Fraction of feature columns drawn for each tree
    pub colsample_bytree: f64,
    /// Minimum hessian sum in a child
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// Minimum gain to make a split
    pub gamma: f64,
    pub seed: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: 3,
            learning_rate: 0.05,
            subsample: 0.8,
            colsample_bytree: 0.8,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            gamma: 0.0,
            seed: 42,
        }
    }
}

impl BoostingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(MathError::InvalidInput(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0) {
            return Err(MathError::InvalidInput(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        for (name, ratio) in [
            ("subsample", self.subsample),
            ("colsample_bytree", self.colsample_bytree),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(MathError::InvalidInput(format!(
                    "{} must lie in (0, 1], got {}",
                    name, ratio
                )));
            }
        }
        if self.reg_lambda < 0.0 || self.min_child_weight < 0.0 || self.gamma < 0.0 {
            return Err(MathError::InvalidInput(
                "reg_lambda, min_child_weight and gamma must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        weight: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, sample: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { weight } => *weight,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] <= *threshold {
                    left.predict(sample)
                } else {
                    right.predict(sample)
                }
            }
        }
    }

    fn count_splits(&self, counts: &mut [f64]) {
        if let TreeNode::Split {
            feature,
            left,
            right,
            ..
        } = self
        {
            counts[*feature] += 1.0;
            left.count_splits(counts);
            right.count_splits(counts);
        }
    }
}

/// Everything the recursive tree builder needs, borrowed once
struct TreeContext<'a> {
    x: ArrayView2<'a, f64>,
    grad: &'a [f64],
    hess: &'a [f64],
    features: &'a [usize],
    config: &'a BoostingConfig,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl TreeContext<'_> {
    fn build(&self, rows: &[usize], depth: usize) -> TreeNode {
        let g: f64 = rows.iter().map(|&i| self.grad[i]).sum();
        let h: f64 = rows.iter().map(|&i| self.hess[i]).sum();
        let weight = -g / (h + self.config.reg_lambda);

        if depth >= self.config.max_depth || rows.len() < 2 || h < self.config.min_child_weight {
            return TreeNode::Leaf { weight };
        }

        let best = self
            .features
            .iter()
            .filter_map(|&f| self.best_split(rows, f, g, h))
            .max_by(|a, b| a.gain.partial_cmp(&b.gain).unwrap_or(Ordering::Equal));

        match best {
            Some(split) if split.gain > self.config.gamma => {
                let (left, right): (Vec<usize>, Vec<usize>) = rows
                    .iter()
                    .partition(|&&i| self.x[[i, split.feature]] <= split.threshold);
                if left.is_empty() || right.is_empty() {
                    return TreeNode::Leaf { weight };
                }
                TreeNode::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: Box::new(self.build(&left, depth + 1)),
                    right: Box::new(self.build(&right, depth + 1)),
                }
            }
            _ => TreeNode::Leaf { weight },
        }
    }

    /// Exact greedy search over the sorted values of one feature
    fn best_split(&self, rows: &[usize], feature: usize, g: f64, h: f64) -> Option<SplitCandidate> {
        let mut sorted = rows.to_vec();
        sorted.sort_by(|&a, &b| {
            self.x[[a, feature]]
                .partial_cmp(&self.x[[b, feature]])
                .unwrap_or(Ordering::Equal)
        });

        let lambda = self.config.reg_lambda;
        let parent = g * g / (h + lambda);
        let mut g_left = 0.0;
        let mut h_left = 0.0;
        let mut best: Option<SplitCandidate> = None;

        for pos in 0..sorted.len() - 1 {
            let idx = sorted[pos];
            g_left += self.grad[idx];
            h_left += self.hess[idx];

            let value = self.x[[idx, feature]];
            let next = self.x[[sorted[pos + 1], feature]];
            if (next - value).abs() < 1e-12 {
                continue;
            }

            let g_right = g - g_left;
            let h_right = h - h_left;
            if h_left < self.config.min_child_weight || h_right < self.config.min_child_weight {
                continue;
            }

            let gain = 0.5
                * (g_left * g_left / (h_left + lambda) + g_right * g_right / (h_right + lambda)
                    - parent);
            if best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: (value + next) / 2.0,
                    gain,
                });
            }
        }
        best
    }
}

/// Fitted ensemble of regression trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    config: BoostingConfig,
    base_score: f64,
    trees: Vec<TreeNode>,
    n_features: usize,
}

impl GradientBoostedTrees {
    /// Fit the ensemble on rows of `x` against targets `y`
    pub fn fit(x: ArrayView2<f64>, y: ArrayView1<f64>, config: &BoostingConfig) -> Result<Self> {
        config.validate()?;
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples == 0 || n_features == 0 {
            return Err(MathError::InsufficientData(format!(
                "Cannot fit on a {}x{} feature table",
                n_samples, n_features
            )));
        }
        if y.len() != n_samples {
            return Err(MathError::InvalidInput(format!(
                "Target length ({}) doesn't match feature rows ({})",
                y.len(),
                n_samples
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Feature table contains non-finite values".to_string(),
            ));
        }

        let base_score = y.sum() / n_samples as f64;
        let mut preds = Array1::from_elem(n_samples, base_score);
        let hess = vec![1.0; n_samples];
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut trees = Vec::with_capacity(config.n_estimators);

        for _ in 0..config.n_estimators {
            let grad: Vec<f64> = preds.iter().zip(y.iter()).map(|(p, t)| p - t).collect();
            let rows = subsample(&mut rng, n_samples, config.subsample);
            let features = subsample(&mut rng, n_features, config.colsample_bytree);

            let context = TreeContext {
                x: x.view(),
                grad: &grad,
                hess: &hess,
                features: &features,
                config,
            };
            let mut tree = context.build(&rows, 0);
            shrink(&mut tree, config.learning_rate);

            for (i, row) in x.rows().into_iter().enumerate() {
                preds[i] += tree.predict(&row.to_vec());
            }
            trees.push(tree);
        }

        tracing::debug!(
            trees = trees.len(),
            samples = n_samples,
            features = n_features,
            "boosted ensemble fitted"
        );

        Ok(Self {
            config: *config,
            base_score,
            trees,
            n_features,
        })
    }

    /// Predict a single feature row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(MathError::InvalidInput(format!(
                "Expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        Ok(self.base_score + self.trees.iter().map(|t| t.predict(row)).sum::<f64>())
    }

    /// Predict every row of `x`
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        x.rows()
            .into_iter()
            .map(|row| self.predict_row(&row.to_vec()))
            .collect::<Result<Vec<f64>>>()
            .map(Array1::from_vec)
    }

    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    /// Share of splits made on each feature
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_features];
        for tree in &self.trees {
            tree.count_splits(&mut counts);
        }
        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            counts.iter_mut().for_each(|c| *c /= total);
        }
        counts
    }
}

fn shrink(node: &mut TreeNode, rate: f64) {
    match node {
        TreeNode::Leaf { weight } => *weight *= rate,
        TreeNode::Split { left, right, .. } => {
            shrink(left, rate);
            shrink(right, rate);
        }
    }
}

fn subsample(rng: &mut StdRng, n: usize, ratio: f64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    if ratio >= 1.0 {
        return indices;
    }
    let k = (((n as f64) * ratio).round() as usize).clamp(1, n);
    indices.shuffle(rng);
    indices.truncate(k);
    indices.sort_unstable();
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn regression_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((80, 2), |(i, j)| (i as f64 * 0.1) + j as f64 * (i % 7) as f64);
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|r| r[0] * 2.0 + r[1] * 0.5 + 1.0)
            .collect();
        (x, y)
    }

    #[test]
    fn test_fits_smooth_target() {
        let (x, y) = regression_data();
        let model = GradientBoostedTrees::fit(x.view(), y.view(), &BoostingConfig::default()).unwrap();
        let preds = model.predict(x.view()).unwrap();

        let mean = y.mean().unwrap();
        let ss_res: f64 = preds.iter().zip(y.iter()).map(|(p, t)| (p - t).powi(2)).sum();
        let ss_tot: f64 = y.iter().map(|t| (t - mean).powi(2)).sum();
        assert!(1.0 - ss_res / ss_tot > 0.9);
        assert_eq!(model.n_trees(), 200);
    }

    #[test]
    fn test_constant_target_predicts_constant() {
        let x = Array2::from_shape_fn((30, 3), |(i, j)| (i + j) as f64);
        let y = Array1::from_elem(30, 10.0);
        let model = GradientBoostedTrees::fit(x.view(), y.view(), &BoostingConfig::default()).unwrap();
        assert_relative_eq!(model.predict_row(&[1.0, 2.0, 3.0]).unwrap(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_seed_makes_fit_reproducible() {
        let (x, y) = regression_data();
        let config = BoostingConfig {
            n_estimators: 40,
            ..BoostingConfig::default()
        };
        let a = GradientBoostedTrees::fit(x.view(), y.view(), &config).unwrap();
        let b = GradientBoostedTrees::fit(x.view(), y.view(), &config).unwrap();
        assert_eq!(a.predict(x.view()).unwrap(), b.predict(x.view()).unwrap());
    }

    #[test]
    fn test_row_width_is_checked() {
        let (x, y) = regression_data();
        let config = BoostingConfig {
            n_estimators: 5,
            ..BoostingConfig::default()
        };
        let model = GradientBoostedTrees::fit(x.view(), y.view(), &config).unwrap();
        assert!(model.predict_row(&[1.0]).is_err());
    }

    #[test]
    fn test_invalid_config() {
        let config = BoostingConfig {
            subsample: 0.0,
            ..BoostingConfig::default()
        };
        assert!(config.validate().is_err());

        let config = BoostingConfig {
            n_estimators: 0,
            ..BoostingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_feature_importances_sum_to_one() {
        let (x, y) = regression_data();
        let model = GradientBoostedTrees::fit(x.view(), y.view(), &BoostingConfig::default()).unwrap();
        let importances = model.feature_importances();
        assert_eq!(importances.len(), 2);
        assert_relative_eq!(importances.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }
}
