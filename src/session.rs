//! Per-user working state: the course table plus its grade predictor.
//! A session lives as long as the caller keeps it; nothing is persisted
//! except through an explicit CSV export.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::gpa::{self, GoalAssessment, GpaSummary};
use crate::models::{CourseRecord, Grade, GradeTable, NewCourse};
use crate::predictor::{
    FeatureImportance, GradePredictor, Prediction, PredictorSettings, RandomForestRegressor,
    TrainReport,
};
use crate::store;

pub struct Session {
    pub table: GradeTable,
    pub predictor: GradePredictor,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(GradeTable::new(), GradePredictor::default())
    }
}

impl Session {
    pub fn new(table: GradeTable, predictor: GradePredictor) -> Self {
        Self { table, predictor }
    }

    pub fn with_settings(settings: PredictorSettings, n_estimators: usize) -> Self {
        Self::new(GradeTable::new(), configured_predictor(settings, n_estimators))
    }

    /// Restores a session from a CSV blob produced by [`Session::to_csv`],
    /// with a default predictor.
    pub fn from_csv(blob: &str) -> Result<Self> {
        Self::from_csv_with(blob, GradePredictor::default())
    }

    /// Restores a session from a CSV blob around an already configured predictor.
    pub fn from_csv_with(blob: &str, predictor: GradePredictor) -> Result<Self> {
        let records = store::read_courses(blob.as_bytes())?;
        Ok(Self::new(GradeTable::from_records(records), predictor))
    }

    pub fn load_csv(&mut self, blob: &str) -> Result<usize> {
        let records = store::read_courses(blob.as_bytes())?;
        let loaded = records.len();
        self.table.extend(records);
        Ok(loaded)
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut buffer = Vec::new();
        store::write_courses(&mut buffer, self.table.records())?;
        String::from_utf8(buffer)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
    }

    pub fn add_course(&mut self, course: NewCourse) -> Result<&CourseRecord> {
        self.table.add(course)
    }

    pub fn delete_course(&mut self, position: usize) -> Result<CourseRecord> {
        self.table.delete(position)
    }

    pub fn set_grade(&mut self, position: usize, grade: Grade) -> Result<Grade> {
        self.table.set_grade(position, grade)
    }

    pub fn gpa(&self) -> f64 {
        gpa::calculate_gpa(self.table.records())
    }

    pub fn summary(&self) -> GpaSummary {
        gpa::summarize(&self.table)
    }

    pub fn simulate(&self, overrides: &BTreeMap<usize, Grade>) -> Result<f64> {
        gpa::simulate_gpa(self.table.records(), overrides)
    }

    /// Goal check against the session's current GPA and credit load.
    pub fn assess_goal(&self, target_gpa: f64, remaining_credits: f64) -> Result<GoalAssessment> {
        gpa::assess_goal(
            self.gpa(),
            self.table.total_credits() as f64,
            target_gpa,
            remaining_credits,
        )
    }

    pub fn train(&mut self) -> Result<TrainReport> {
        self.predictor.train(&self.table)
    }

    pub fn predict(&self, semester: &str, course_code: &str, credits: u32) -> Result<Prediction> {
        self.predictor.predict(semester, course_code, credits)
    }

    pub fn feature_importance(&self) -> Option<Vec<FeatureImportance>> {
        self.predictor.feature_importance()
    }
}

/// Forest-backed predictor using the seed from `settings`.
pub fn configured_predictor(settings: PredictorSettings, n_estimators: usize) -> GradePredictor {
    let regressor = RandomForestRegressor {
        n_estimators,
        seed: settings.seed,
    };
    GradePredictor::new(regressor, settings)
}
