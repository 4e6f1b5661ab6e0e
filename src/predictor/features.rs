//! Feature engineering for grade prediction.
//!
//! Each course becomes `[credits, semester year, course level]` followed by a
//! one-hot block over the subjects seen during training. Missing numeric
//! values are filled with the training column mean.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::Result;
use crate::models::CourseRecord;
use crate::parse::{embedded_year, first_digit, subject_letters, trailing_year};

pub const NUMERIC_FEATURES: [&str; 3] = ["Credits", "Semester_Num", "Course_Level"];

/// Level used when a course code has no readable level digit.
pub const DEFAULT_LEVEL: f64 = 1.0;

/// Features for one course before imputation and encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeatures {
    pub numeric: [Option<f64>; 3],
    pub subject: Option<String>,
}

/// Imported codes are stored as written, so subject and level are scanned
/// for rather than parsed.
pub fn training_features(record: &CourseRecord) -> RawFeatures {
    let level = first_digit(&record.course_code)
        .map(f64::from)
        .unwrap_or(DEFAULT_LEVEL);

    RawFeatures {
        numeric: [
            Some(record.credits as f64),
            embedded_year(&record.semester).map(f64::from),
            Some(level),
        ],
        subject: subject_letters(&record.course_code),
    }
}

/// Features for a course being predicted. The semester must end in a
/// four-digit year; the subject is the first three characters of the code
/// and the level is the fourth character when it is a digit.
pub fn inference_features(semester: &str, course_code: &str, credits: u32) -> Result<RawFeatures> {
    let year = trailing_year(semester)?;
    let subject: String = course_code.chars().take(3).collect();
    let level = course_code
        .chars()
        .nth(3)
        .and_then(|c| c.to_digit(10))
        .map(f64::from)
        .unwrap_or(DEFAULT_LEVEL);

    Ok(RawFeatures {
        numeric: [Some(credits as f64), Some(year as f64), Some(level)],
        subject: Some(subject),
    })
}

/// One-hot encoder over the sorted set of subjects seen in training.
/// Subjects outside that set encode to all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectEncoder {
    categories: Vec<String>,
}

impl SubjectEncoder {
    pub fn fit<'a>(subjects: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        let categories: BTreeSet<&str> = subjects.into_iter().flatten().collect();
        Self {
            categories: categories.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn encode(&self, subject: Option<&str>) -> Vec<f64> {
        self.categories
            .iter()
            .map(|c| if Some(c.as_str()) == subject { 1.0 } else { 0.0 })
            .collect()
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("Subject_{c}"))
            .collect()
    }
}

/// Column-mean imputation for the numeric block. A column with no observed
/// values is filled with 0.0 so the feature layout never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanImputer {
    means: [f64; 3],
}

impl MeanImputer {
    pub fn fit(rows: &[RawFeatures]) -> Self {
        let mut means = [0.0; 3];
        for (column, mean) in means.iter_mut().enumerate() {
            let observed: Vec<f64> = rows.iter().filter_map(|r| r.numeric[column]).collect();
            if !observed.is_empty() {
                *mean = observed.iter().sum::<f64>() / observed.len() as f64;
            }
        }
        Self { means }
    }

    pub fn means(&self) -> &[f64; 3] {
        &self.means
    }

    pub fn transform(&self, numeric: &[Option<f64>; 3]) -> [f64; 3] {
        let mut filled = [0.0; 3];
        for (column, value) in numeric.iter().enumerate() {
            filled[column] = value.unwrap_or(self.means[column]);
        }
        filled
    }
}

/// Imputation and encoding fitted on a training table, applied the same way
/// at inference time.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLayout {
    pub imputer: MeanImputer,
    pub encoder: SubjectEncoder,
}

impl FeatureLayout {
    pub fn fit(rows: &[RawFeatures]) -> Self {
        Self {
            imputer: MeanImputer::fit(rows),
            encoder: SubjectEncoder::fit(rows.iter().map(|r| r.subject.as_deref())),
        }
    }

    pub fn vectorize(&self, raw: &RawFeatures) -> Vec<f64> {
        let mut row = self.imputer.transform(&raw.numeric).to_vec();
        row.extend(self.encoder.encode(raw.subject.as_deref()));
        row
    }

    pub fn feature_names(&self) -> Vec<String> {
        NUMERIC_FEATURES
            .iter()
            .map(|name| name.to_string())
            .chain(self.encoder.feature_names())
            .collect()
    }

    pub fn width(&self) -> usize {
        NUMERIC_FEATURES.len() + self.encoder.categories().len()
    }
}

/// Seeded shuffle followed by a train/test split. The test side gets
/// `ceil(len * test_fraction)` samples, capped so training keeps at least one.
pub fn split_train_test<T>(mut samples: Vec<T>, test_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total = samples.len();
    let test_len = ((total as f64) * test_fraction.clamp(0.0, 1.0)).ceil() as usize;
    let test_len = test_len.min(total.saturating_sub(1));
    let test = samples.split_off(total - test_len);

    tracing::debug!(train = samples.len(), test = test.len(), "split training data");
    (samples, test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Grade;
    use crate::testing::record;

    #[test]
    fn training_features_from_record() {
        let raw = training_features(&record("Semester 2023", "CS301", 3, Grade::A));
        assert_eq!(raw.numeric, [Some(3.0), Some(2023.0), Some(3.0)]);
        assert_eq!(raw.subject.as_deref(), Some("CS"));
    }

    #[test]
    fn term_tags_leave_year_missing() {
        let raw = training_features(&record("Semester 2.1", "cs301", 4, Grade::B));
        assert_eq!(raw.numeric, [Some(4.0), None, Some(3.0)]);
        assert_eq!(raw.subject, None);
    }

    #[test]
    fn imported_codes_with_separators_keep_subject_and_level() {
        let raw = training_features(&record("Semester 2023", "CS 301", 3, Grade::A));
        assert_eq!(raw.subject.as_deref(), Some("CS"));
        assert_eq!(raw.numeric[2], Some(3.0));

        let raw = training_features(&record("Semester 2023", "MATH-201", 4, Grade::B));
        assert_eq!(raw.subject.as_deref(), Some("MATH"));
        assert_eq!(raw.numeric[2], Some(2.0));

        let raw = training_features(&record("Semester 2023", "CSE", 3, Grade::B));
        assert_eq!(raw.subject.as_deref(), Some("CSE"));
        assert_eq!(raw.numeric[2], Some(DEFAULT_LEVEL));
    }

    #[test]
    fn inference_uses_fixed_character_positions() {
        let raw = inference_features("Semester 2025", "MATH201", 4).unwrap();
        assert_eq!(raw.subject.as_deref(), Some("MAT"));
        assert_eq!(raw.numeric, [Some(4.0), Some(2025.0), Some(DEFAULT_LEVEL)]);

        let raw = inference_features("Semester 2025", "CSE2", 3).unwrap();
        assert_eq!(raw.numeric[2], Some(2.0));

        assert!(inference_features("Semester 1.1", "CS101", 3).is_err());
    }

    #[test]
    fn encoder_sorts_categories_and_zeroes_unknowns() {
        let encoder = SubjectEncoder::fit([Some("PHY"), Some("CS"), None, Some("CS")]);
        assert_eq!(encoder.categories(), ["CS".to_string(), "PHY".to_string()]);
        assert_eq!(encoder.encode(Some("PHY")), vec![0.0, 1.0]);
        assert_eq!(encoder.encode(Some("ART")), vec![0.0, 0.0]);
        assert_eq!(encoder.feature_names(), vec!["Subject_CS", "Subject_PHY"]);
    }

    #[test]
    fn imputer_fills_with_column_mean() {
        let rows = vec![
            RawFeatures { numeric: [Some(3.0), Some(2020.0), Some(1.0)], subject: None },
            RawFeatures { numeric: [Some(4.0), None, Some(2.0)], subject: None },
            RawFeatures { numeric: [Some(2.0), Some(2022.0), Some(3.0)], subject: None },
        ];
        let imputer = MeanImputer::fit(&rows);
        assert_eq!(imputer.transform(&rows[1].numeric), [4.0, 2021.0, 2.0]);
    }

    #[test]
    fn empty_column_imputes_zero() {
        let rows = vec![RawFeatures { numeric: [Some(3.0), None, Some(1.0)], subject: None }];
        assert_eq!(MeanImputer::fit(&rows).means(), &[3.0, 0.0, 1.0]);
    }

    #[test]
    fn layout_names_match_width() {
        let rows = vec![
            training_features(&record("Semester 2023", "CS301", 3, Grade::A)),
            training_features(&record("Semester 2024", "BIO101", 3, Grade::B)),
        ];
        let layout = FeatureLayout::fit(&rows);
        assert_eq!(layout.feature_names().len(), layout.width());
        assert_eq!(layout.vectorize(&rows[0]).len(), layout.width());
    }

    #[test]
    fn split_sizes_and_reproducibility() {
        let (train, test) = split_train_test((0..10).collect::<Vec<_>>(), 0.2, 42);
        assert_eq!((train.len(), test.len()), (8, 2));

        let (train_again, test_again) = split_train_test((0..10).collect::<Vec<_>>(), 0.2, 42);
        assert_eq!(train, train_again);
        assert_eq!(test, test_again);

        let (train, test) = split_train_test((0..5).collect::<Vec<_>>(), 0.2, 7);
        assert_eq!((train.len(), test.len()), (4, 1));

        let (train, test) = split_train_test(vec![1], 0.5, 7);
        assert_eq!((train.len(), test.len()), (1, 0));
    }
}
