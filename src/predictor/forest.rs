//! Regression capability used by the grade predictor. The default
//! implementation is smartcore's seeded random forest.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor as ForestModel, RandomForestRegressorParameters,
};
use smartcore::error::Failed;
use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{GpaError, Result};

/// Anything that can be fitted to a feature matrix and a target vector.
pub trait Regressor {
    type Model: FittedRegressor;

    fn fit(&self, features: &[Vec<f64>], targets: &[f64]) -> Result<Self::Model>;
}

pub trait FittedRegressor {
    fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>>;

    fn predict(&self, row: &[f64]) -> Result<f64> {
        self.predict_rows(&[row.to_vec()])?
            .first()
            .copied()
            .ok_or_else(|| GpaError::Model("regressor returned no prediction".to_string()))
    }

    /// One non-negative score per input feature.
    fn feature_importances(&self) -> Vec<f64>;
}

#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    pub n_estimators: usize,
    pub seed: u64,
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            seed: 42,
        }
    }
}

impl Regressor for RandomForestRegressor {
    type Model = RandomForest;

    fn fit(&self, features: &[Vec<f64>], targets: &[f64]) -> Result<RandomForest> {
        if features.is_empty() || features.len() != targets.len() {
            return Err(GpaError::InvalidComputation(format!(
                "cannot fit {} feature rows against {} targets",
                features.len(),
                targets.len()
            )));
        }
        let width = features[0].len();
        if width == 0 || features.iter().any(|row| row.len() != width) {
            return Err(GpaError::InvalidComputation(
                "feature rows have inconsistent widths".to_string(),
            ));
        }

        let n_trees = self
            .n_estimators
            .max(1)
            .try_into()
            .map_err(|_| GpaError::InvalidComputation("too many trees".to_string()))?;
        let parameters = RandomForestRegressorParameters::default()
            .with_n_trees(n_trees)
            .with_m(width)
            .with_seed(self.seed);

        let x = DenseMatrix::from_2d_vec(&features.to_vec());
        let model = ForestModel::fit(&x, &targets.to_vec(), parameters).map_err(model_error)?;

        let mut forest = RandomForest {
            model,
            importances: Vec::new(),
        };
        forest.importances = permutation_importances(&forest, features, targets, self.seed)?;
        Ok(forest)
    }
}

pub struct RandomForest {
    model: ForestModel<f64, f64, DenseMatrix<f64>, Vec<f64>>,
    importances: Vec<f64>,
}

impl FittedRegressor for RandomForest {
    fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let x = DenseMatrix::from_2d_vec(&rows.to_vec());
        self.model.predict(&x).map_err(model_error)
    }

    fn feature_importances(&self) -> Vec<f64> {
        self.importances.clone()
    }
}

fn model_error(err: Failed) -> GpaError {
    GpaError::Model(err.to_string())
}

/// Increase in mean squared error on the training rows when one column is
/// shuffled, clipped at zero and normalized to sum to one. All zeros when no
/// column changes the predictions.
fn permutation_importances(
    model: &impl FittedRegressor,
    features: &[Vec<f64>],
    targets: &[f64],
    seed: u64,
) -> Result<Vec<f64>> {
    let width = features.first().map_or(0, Vec::len);
    let baseline = mean_squared_error(targets, &model.predict_rows(features)?);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut importances = Vec::with_capacity(width);
    for column in 0..width {
        let mut shuffled: Vec<f64> = features.iter().map(|row| row[column]).collect();
        shuffled.shuffle(&mut rng);

        let permuted: Vec<Vec<f64>> = features
            .iter()
            .zip(&shuffled)
            .map(|(row, &value)| {
                let mut row = row.clone();
                row[column] = value;
                row
            })
            .collect();
        let error = mean_squared_error(targets, &model.predict_rows(&permuted)?);
        importances.push((error - baseline).max(0.0));
    }

    normalize(&mut importances);
    Ok(importances)
}

fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    mean(actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)))
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn normalize(values: &mut [f64]) {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        values.iter_mut().for_each(|v| *v /= total);
    }
}

/// Coefficient of determination. Undefined (None) for fewer than two samples.
/// A constant target scores 1.0 when matched exactly and 0.0 otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.len() < 2 || actual.len() != predicted.len() {
        return None;
    }

    let mean_actual = mean(actual.iter().copied());
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();

    if ss_tot == 0.0 {
        return Some(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Some(1.0 - ss_res / ss_tot)
}
