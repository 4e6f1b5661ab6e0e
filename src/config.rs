//! Runtime settings

use serde::Deserialize;

use crate::predictor::{PredictorSettings, MIN_TRAINING_ROWS};

/// Settings read from `GPA_INSIGHT_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Seed for the train/test shuffle and the forest's bootstrap samples
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Trees in the random forest
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,

    /// Courses required before the predictor will train
    #[serde(default = "default_min_training_rows")]
    pub min_training_rows: usize,

    /// Share of courses held out for the test score
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,

    /// Credits assumed still to come when planning a GPA goal
    #[serde(default = "default_remaining_credits")]
    pub remaining_credits: f64,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,
}

fn default_seed() -> u64 {
    42
}

fn default_n_estimators() -> usize {
    100
}

fn default_min_training_rows() -> usize {
    MIN_TRAINING_ROWS
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_remaining_credits() -> f64 {
    30.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            n_estimators: default_n_estimators(),
            min_training_rows: default_min_training_rows(),
            test_fraction: default_test_fraction(),
            remaining_credits: default_remaining_credits(),
            log_json: false,
        }
    }
}

impl Settings {
    /// Load settings from the environment, keeping defaults for anything unset.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_source(config::Environment::with_prefix("GPA_INSIGHT").try_parsing(true))
    }

    fn from_source<S>(source: S) -> anyhow::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder().add_source(source).build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn predictor(&self) -> PredictorSettings {
        PredictorSettings {
            min_training_rows: self.min_training_rows,
            test_fraction: self.test_fraction,
            seed: self.seed,
        }
    }
}
