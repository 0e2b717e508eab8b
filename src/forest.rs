//! Random forest models, z-score scaling and the seeded holdout split, backed
//! by smartcore. Callers work in plain row vectors; conversion to
//! `DenseMatrix` happens here.

use smartcore::api::{Transformer, UnsupervisedEstimator};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::error::Failed;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::model_selection::train_test_split;
use smartcore::preprocessing::numerical::{StandardScaler, StandardScalerParameters};

use crate::error::ForecastError;

pub const DEFAULT_TREES: usize = 50;
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub seed: u64,
    pub max_depth: Option<u16>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: DEFAULT_TREES,
            seed: DEFAULT_SEED,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

fn model_error(err: Failed) -> ForecastError {
    ForecastError::Model(err.to_string())
}

fn dense(rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>, ForecastError> {
    DenseMatrix::from_2d_vec(&rows.to_vec()).map_err(model_error)
}

fn rows_of(matrix: &DenseMatrix<f64>) -> Vec<Vec<f64>> {
    let (n, width) = matrix.shape();
    (0..n)
        .map(|i| (0..width).map(|j| *matrix.get((i, j))).collect())
        .collect()
}

pub const MAX_TEST_FRACTION: f64 = 0.9;

/// Seeded shuffle split of `0..n` into (train, test) row indices. The test
/// side holds `floor(n * fraction)` rows; when that is zero every row trains.
pub fn holdout_split(
    n: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), ForecastError> {
    let fraction = test_fraction.clamp(0.0, MAX_TEST_FRACTION) as f32;
    if ((n as f32) * fraction) as usize == 0 {
        return Ok(((0..n).collect(), Vec::new()));
    }
    let index: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64]).collect();
    let ids: Vec<u32> = (0..n as u32).collect();
    let (_, _, train, test) = train_test_split(&dense(&index)?, &ids, fraction, true, Some(seed));
    let widen = |v: Vec<u32>| v.into_iter().map(|i| i as usize).collect::<Vec<_>>();
    Ok((widen(train), widen(test)))
}

/// Per-column z-score. Outputs that come back non-finite (constant columns)
/// read as 0.
pub struct Scaler {
    inner: StandardScaler<f64>,
}

impl Scaler {
    pub fn fit(x: &[Vec<f64>]) -> Result<Self, ForecastError> {
        let inner = StandardScaler::<f64>::fit(&dense(x)?, StandardScalerParameters::default())
            .map_err(model_error)?;
        Ok(Self { inner })
    }

    pub fn transform(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ForecastError> {
        if x.is_empty() {
            return Ok(Vec::new());
        }
        let scaled = self.inner.transform(&dense(x)?).map_err(model_error)?;
        Ok(rows_of(&scaled)
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|v| if v.is_finite() { v } else { 0.0 })
                    .collect()
            })
            .collect())
    }
}

/// Forest over any ordered label type. Labels are coded by their sorted
/// position, so [`Self::classes`] lines up with the probability columns.
pub struct ForestClassifier<L> {
    classes: Vec<L>,
    model: RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>,
}

impl<L: Ord + Clone> ForestClassifier<L> {
    pub fn fit(x: &[Vec<f64>], y: &[L], params: ForestParams) -> Result<Self, ForecastError> {
        let mut classes = y.to_vec();
        classes.sort();
        classes.dedup();
        let codes: Vec<i32> = y
            .iter()
            .map(|label| classes.binary_search(label).map_or(0, |i| i as i32))
            .collect();

        let mut parameters = RandomForestClassifierParameters::default();
        parameters.n_trees = params.n_trees.max(1) as _;
        parameters.max_depth = params.max_depth;
        parameters.min_samples_split = params.min_samples_split;
        parameters.min_samples_leaf = params.min_samples_leaf;
        parameters.seed = params.seed;
        let model =
            RandomForestClassifier::fit(&dense(x)?, &codes, parameters).map_err(model_error)?;
        Ok(Self { classes, model })
    }

    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    /// Mean tree class distribution per row, aligned with [`Self::classes`].
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ForecastError> {
        if x.is_empty() {
            return Ok(Vec::new());
        }
        let proba = self.model.predict_proba(&dense(x)?).map_err(model_error)?;
        Ok(rows_of(&proba))
    }

    /// Most probable class per row; ties go to the smaller class.
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<L>, ForecastError> {
        self.predict_proba(x)?
            .into_iter()
            .map(|row| {
                let mut best: Option<(usize, f64)> = None;
                for (idx, p) in row.iter().enumerate() {
                    if best.is_none_or(|(_, b)| *p > b) {
                        best = Some((idx, *p));
                    }
                }
                best.and_then(|(idx, _)| self.classes.get(idx).cloned())
                    .ok_or_else(|| ForecastError::Model("classifier has no classes".into()))
            })
            .collect()
    }
}

/// Regression forest. Every feature is a split candidate.
pub struct ForestRegressor {
    model: RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
}

impl ForestRegressor {
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: ForestParams) -> Result<Self, ForecastError> {
        let width = x.first().map_or(1, Vec::len).max(1);
        let mut parameters = RandomForestRegressorParameters::default();
        parameters.n_trees = params.n_trees.max(1) as _;
        parameters.m = Some(width);
        parameters.max_depth = params.max_depth;
        parameters.min_samples_split = params.min_samples_split;
        parameters.min_samples_leaf = params.min_samples_leaf;
        parameters.seed = params.seed;
        let model =
            RandomForestRegressor::fit(&dense(x)?, &y.to_vec(), parameters).map_err(model_error)?;
        Ok(Self { model })
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>, ForecastError> {
        if x.is_empty() {
            return Ok(Vec::new());
        }
        self.model.predict(&dense(x)?).map_err(model_error)
    }
}

#[cfg(test)]
mod tests {
    use super::{ForestClassifier, ForestParams, ForestRegressor, Scaler, holdout_split};

    fn params() -> ForestParams {
        ForestParams {
            n_trees: 15,
            ..ForestParams::default()
        }
    }

    #[test]
    fn split_is_seeded_and_partitions_rows() {
        let (train, test) = holdout_split(10, 0.3, 42).expect("split");
        assert_eq!(test.len(), 3);
        assert!(!train.is_empty());
        let again = holdout_split(10, 0.3, 42).expect("split");
        assert_eq!((train.clone(), test.clone()), again);
        let mut all: Vec<usize> = train.into_iter().chain(test).collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
        assert_eq!(holdout_split(1, 0.3, 42).expect("split").0, vec![0]);
        let (train, test) = holdout_split(2, 0.3, 42).expect("split");
        assert_eq!((train.len(), test.len()), (2, 0));
    }

    #[test]
    fn scaler_centers_and_keeps_constant_columns_finite() {
        let x = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        let scaler = Scaler::fit(&x).expect("fit");
        let out = scaler.transform(&x).expect("transform");
        assert!((out[0][0] + out[1][0]).abs() < 1e-9);
        assert!(out[0][0] < 0.0 && out[1][0] > 0.0);
        assert!(out.iter().all(|row| row[1].is_finite()));
    }

    #[test]
    fn classifier_separates_and_reports_sorted_classes() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let y: Vec<String> = (0..40)
            .map(|i| if i < 20 { "low" } else { "high" }.to_string())
            .collect();
        let model = ForestClassifier::fit(&x, &y, params()).expect("fit");
        assert_eq!(model.classes(), ["high".to_string(), "low".to_string()]);
        let predicted = model
            .predict(&[vec![2.0, 0.0], vec![37.0, 1.0]])
            .expect("predict");
        assert_eq!(predicted, vec!["low".to_string(), "high".to_string()]);
        let p = model.predict_proba(&[vec![5.0, 2.0]]).expect("proba");
        assert!((p[0].iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fits_are_reproducible() {
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64, ((i * 7) % 5) as f64]).collect();
        let y: Vec<f64> = (0..30).map(|i| (i as f64) * 0.5 + ((i * 7) % 5) as f64).collect();
        let a = ForestRegressor::fit(&x, &y, params()).expect("fit");
        let b = ForestRegressor::fit(&x, &y, params()).expect("fit");
        assert_eq!(a.predict(&x).expect("a"), b.predict(&x).expect("b"));
        let out = a.predict(&[vec![1.0, 2.0], vec![28.0, 1.0]]).expect("predict");
        assert!(out[1] > out[0]);
    }
}
