//! Grade prediction from course history.

mod features;
mod forest;

pub use features::{
    inference_features, split_train_test, training_features, FeatureLayout, MeanImputer,
    RawFeatures, SubjectEncoder, DEFAULT_LEVEL, NUMERIC_FEATURES,
};
pub use forest::{r2_score, FittedRegressor, RandomForest, RandomForestRegressor, Regressor};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{GpaError, Result};
use crate::models::{Grade, GradeTable};

/// Smallest table the predictor will train on.
pub const MIN_TRAINING_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorSettings {
    pub min_training_rows: usize,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for PredictorSettings {
    fn default() -> Self {
        Self {
            min_training_rows: MIN_TRAINING_ROWS,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainReport {
    pub trained: bool,
    pub train_score: Option<f64>,
    pub test_score: Option<f64>,
}

impl TrainReport {
    fn insufficient() -> Self {
        Self {
            trained: false,
            train_score: None,
            test_score: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    /// Nearest letter on the grade scale.
    pub grade: Grade,
    /// Raw regressor output.
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

struct TrainedModel<M> {
    layout: FeatureLayout,
    model: M,
}

/// Untrained until `train` succeeds; a later successful `train` replaces
/// the fitted model, a failed one leaves it in place.
pub struct GradePredictor<R: Regressor = RandomForestRegressor> {
    regressor: R,
    settings: PredictorSettings,
    trained: Option<TrainedModel<R::Model>>,
}

impl Default for GradePredictor {
    fn default() -> Self {
        Self::new(RandomForestRegressor::default(), PredictorSettings::default())
    }
}

impl<R: Regressor> GradePredictor<R> {
    pub fn new(regressor: R, settings: PredictorSettings) -> Self {
        Self {
            regressor,
            settings,
            trained: None,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.trained.is_some()
    }

    pub fn settings(&self) -> &PredictorSettings {
        &self.settings
    }

    pub fn train(&mut self, table: &GradeTable) -> Result<TrainReport> {
        if table.len() < self.settings.min_training_rows {
            info!(
                rows = table.len(),
                required = self.settings.min_training_rows,
                "not enough courses to train"
            );
            return Ok(TrainReport::insufficient());
        }

        let raw: Vec<RawFeatures> = table.records().iter().map(training_features).collect();
        let layout = FeatureLayout::fit(&raw);
        let samples: Vec<(Vec<f64>, f64)> = raw
            .iter()
            .zip(table.records())
            .map(|(features, record)| (layout.vectorize(features), record.grade_points()))
            .collect();
        debug!(
            width = layout.width(),
            subjects = layout.encoder.categories().len(),
            "built feature matrix"
        );

        let (train, test) =
            split_train_test(samples, self.settings.test_fraction, self.settings.seed);
        let (train_x, train_y): (Vec<Vec<f64>>, Vec<f64>) = train.into_iter().unzip();
        let (test_x, test_y): (Vec<Vec<f64>>, Vec<f64>) = test.into_iter().unzip();

        let model = self.regressor.fit(&train_x, &train_y)?;
        let train_score = r2_score(&train_y, &model.predict_rows(&train_x)?);
        let test_score = r2_score(&test_y, &model.predict_rows(&test_x)?);

        info!(
            rows = table.len(),
            train_rows = train_y.len(),
            test_rows = test_y.len(),
            ?train_score,
            ?test_score,
            "grade model trained"
        );
        self.trained = Some(TrainedModel { layout, model });

        Ok(TrainReport {
            trained: true,
            train_score,
            test_score,
        })
    }

    pub fn predict(&self, semester: &str, course_code: &str, credits: u32) -> Result<Prediction> {
        let trained = self.trained.as_ref().ok_or(GpaError::NotTrained)?;
        let raw = inference_features(semester, course_code, credits)?;
        let points = trained.model.predict(&trained.layout.vectorize(&raw))?;

        Ok(Prediction {
            grade: Grade::nearest(points),
            points,
        })
    }

    /// Features ranked by importance, or None before training.
    pub fn feature_importance(&self) -> Option<Vec<FeatureImportance>> {
        let trained = self.trained.as_ref()?;
        let names = trained.layout.feature_names();
        let importances = trained.model.feature_importances();
        if names.len() != importances.len() {
            warn!(
                names = names.len(),
                importances = importances.len(),
                "feature name count differs from importance count; truncating"
            );
        }

        let mut ranked: Vec<FeatureImportance> = names
            .into_iter()
            .zip(importances)
            .map(|(feature, importance)| FeatureImportance {
                feature,
                importance,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Some(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{record, sample_table};

    fn predictor() -> GradePredictor {
        GradePredictor::default()
    }

    #[test]
    fn four_rows_do_not_train() {
        let table = GradeTable::from_records(sample_table().records()[..4].to_vec());
        let mut predictor = predictor();

        let report = predictor.train(&table).unwrap();
        assert_eq!(report, TrainReport::insufficient());
        assert!(!predictor.is_trained());
    }

    #[test]
    fn predicting_before_training_fails() {
        let predictor = predictor();
        assert!(matches!(
            predictor.predict("Semester 2025", "CS501", 3),
            Err(GpaError::NotTrained)
        ));
        assert!(predictor.feature_importance().is_none());
    }

    #[test]
    fn trains_and_scores_both_splits() {
        let mut predictor = predictor();
        let report = predictor.train(&sample_table()).unwrap();

        assert!(report.trained);
        assert!(report.train_score.is_some());
        assert!(report.test_score.is_some());
        assert!(predictor.is_trained());
    }

    #[test]
    fn training_is_reproducible() {
        let mut a = predictor();
        let mut b = predictor();
        assert_eq!(
            a.train(&sample_table()).unwrap(),
            b.train(&sample_table()).unwrap()
        );
    }

    #[test]
    fn prediction_snaps_to_scale() {
        let mut predictor = predictor();
        predictor.train(&sample_table()).unwrap();

        let prediction = predictor.predict("Semester 2025", "CS501", 3).unwrap();
        assert_eq!(prediction.grade, Grade::nearest(prediction.points));
        assert!((0.0..=4.0).contains(&prediction.points));

        // Subjects never seen in training still predict.
        assert!(predictor.predict("Semester 2025", "ART101", 2).is_ok());
    }

    #[test]
    fn prediction_requires_four_digit_year() {
        let mut predictor = predictor();
        predictor.train(&sample_table()).unwrap();

        for semester in ["Semester 1.1", "Semester 25", "2025x", ""] {
            assert!(matches!(
                predictor.predict(semester, "CS501", 3),
                Err(GpaError::InvalidSemester(_))
            ));
        }
    }

    #[test]
    fn importance_covers_every_feature() {
        let mut predictor = predictor();
        predictor.train(&sample_table()).unwrap();

        let ranked = predictor.feature_importance().unwrap();
        // Credits, Semester_Num, Course_Level, then CS, MATH and PHY.
        assert_eq!(ranked.len(), 6);
        assert!(ranked.windows(2).all(|w| w[0].importance >= w[1].importance));
        assert!(ranked.iter().any(|f| f.feature == "Subject_MATH"));
    }

    #[test]
    fn failed_retrain_keeps_previous_model() {
        let mut predictor = predictor();
        predictor.train(&sample_table()).unwrap();

        let tiny = GradeTable::from_records(vec![record("Semester 2024", "CS101", 3, Grade::A)]);
        assert!(!predictor.train(&tiny).unwrap().trained);
        assert!(predictor.is_trained());
    }

    /// Regressor that predicts a constant and reports fixed importances.
    struct FixedImportances(Vec<f64>);

    struct FixedModel(Vec<f64>);

    impl Regressor for FixedImportances {
        type Model = FixedModel;

        fn fit(&self, _features: &[Vec<f64>], _targets: &[f64]) -> Result<FixedModel> {
            Ok(FixedModel(self.0.clone()))
        }
    }

    impl FittedRegressor for FixedModel {
        fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
            Ok(vec![3.0; rows.len()])
        }

        fn feature_importances(&self) -> Vec<f64> {
            self.0.clone()
        }
    }

    fn trained_with(importances: Vec<f64>) -> GradePredictor<FixedImportances> {
        let mut predictor =
            GradePredictor::new(FixedImportances(importances), PredictorSettings::default());
        assert!(predictor.train(&sample_table()).unwrap().trained);
        predictor
    }

    #[test]
    fn custom_regressor_plugs_in() {
        let predictor = trained_with(vec![0.0; 6]);
        let prediction = predictor.predict("Semester 2025", "CS501", 3).unwrap();
        assert_eq!(prediction.grade, Grade::B);
        assert_eq!(prediction.points, 3.0);
    }

    #[test]
    fn fewer_importances_than_features_truncates_names() {
        let predictor = trained_with(vec![0.1, 0.5, 0.4]);
        let ranked = predictor.feature_importance().unwrap();

        let names: Vec<&str> = ranked.iter().map(|f| f.feature.as_str()).collect();
        assert_eq!(names, ["Semester_Num", "Course_Level", "Credits"]);
        assert!(ranked.windows(2).all(|w| w[0].importance >= w[1].importance));
    }

    #[test]
    fn more_importances_than_features_drops_extras() {
        let predictor = trained_with(vec![0.1, 0.2, 0.05, 0.15, 0.2, 0.1, 0.9, 0.8]);
        let ranked = predictor.feature_importance().unwrap();

        assert_eq!(ranked.len(), 6);
        assert_eq!(ranked[0].importance, 0.2);
        assert!(ranked.iter().all(|f| f.importance < 0.8));
        assert!(ranked.windows(2).all(|w| w[0].importance >= w[1].importance));
    }

    #[test]
    fn constant_grades_predict_that_grade() {
        let table = GradeTable::from_records(
            (0..6)
                .map(|i| record("Semester 2022", &format!("CS{}01", i + 1), 3, Grade::B))
                .collect(),
        );
        let mut predictor = predictor();
        let report = predictor.train(&table).unwrap();
        assert_eq!(report.train_score, Some(1.0));

        let prediction = predictor.predict("Semester 2023", "CS701", 3).unwrap();
        assert_eq!(prediction.grade, Grade::B);
        assert_eq!(prediction.points, 3.0);
    }
}
