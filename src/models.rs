use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{GpaError, Result};
use crate::parse::{CourseCode, SemesterTag};

pub const MIN_CREDITS: u32 = 1;
pub const MAX_CREDITS: u32 = 6;

/// Top of the grade-point scale.
pub const SCALE_CEILING: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Grade {
    APlus,
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    DMinus,
    F,
}

impl Grade {
    /// Declaration order, best to worst.
    pub const ALL: [Grade; 13] = [
        Grade::APlus,
        Grade::A,
        Grade::AMinus,
        Grade::BPlus,
        Grade::B,
        Grade::BMinus,
        Grade::CPlus,
        Grade::C,
        Grade::CMinus,
        Grade::DPlus,
        Grade::D,
        Grade::DMinus,
        Grade::F,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::DMinus => "D-",
            Grade::F => "F",
        }
    }

    pub fn points(self) -> f64 {
        match self {
            Grade::APlus | Grade::A => 4.0,
            Grade::AMinus => 3.7,
            Grade::BPlus => 3.3,
            Grade::B => 3.0,
            Grade::BMinus => 2.7,
            Grade::CPlus => 2.3,
            Grade::C => 2.0,
            Grade::CMinus => 1.7,
            Grade::DPlus => 1.3,
            Grade::D => 1.0,
            Grade::DMinus => 0.7,
            Grade::F => 0.0,
        }
    }

    /// Nearest grade to a continuous point value. Ties keep the
    /// earliest-declared letter, so 4.0 maps to A+.
    pub fn nearest(points: f64) -> Grade {
        let mut best = Grade::ALL[0];
        let mut best_distance = (points - best.points()).abs();
        for grade in Grade::ALL.iter().skip(1) {
            let distance = (points - grade.points()).abs();
            if distance < best_distance {
                best = *grade;
                best_distance = distance;
            }
        }
        best
    }
}

/// Grade-point lookup by label. Labels outside the scale count as failing.
pub fn grade_points(label: &str) -> f64 {
    label.parse::<Grade>().map(Grade::points).unwrap_or(0.0)
}

impl FromStr for Grade {
    type Err = GpaError;

    fn from_str(s: &str) -> Result<Self> {
        let label = s.trim();
        Grade::ALL
            .iter()
            .copied()
            .find(|grade| grade.label() == label)
            .ok_or_else(|| GpaError::UnknownGrade(s.to_string()))
    }
}

impl TryFrom<String> for Grade {
    type Error = GpaError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Grade> for String {
    fn from(grade: Grade) -> Self {
        grade.label().to_string()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseRecord {
    pub semester: String,
    pub course_code: String,
    pub course_name: String,
    pub credits: u32,
    pub grade: Grade,
    pub created_at: NaiveDateTime,
}

impl CourseRecord {
    pub fn grade_points(&self) -> f64 {
        self.grade.points()
    }

    /// Credit-weighted points this course contributes to the GPA numerator.
    pub fn weighted_points(&self) -> f64 {
        self.credits as f64 * self.grade.points()
    }
}

/// User input for a new course, before validation.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub semester: String,
    pub course_code: String,
    pub course_name: String,
    pub credits: u32,
    pub grade: Grade,
}

pub fn validate_credits(credits: i64) -> Result<u32> {
    if (MIN_CREDITS as i64..=MAX_CREDITS as i64).contains(&credits) {
        Ok(credits as u32)
    } else {
        Err(GpaError::InvalidCredits(credits))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradeTable {
    records: Vec<CourseRecord>,
}

impl GradeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<CourseRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CourseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&CourseRecord> {
        self.records.get(position)
    }

    pub fn total_credits(&self) -> u32 {
        self.records.iter().map(|r| r.credits).sum()
    }

    /// Distinct semester tags in first-seen order.
    pub fn semesters(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.semester.as_str()) {
                seen.push(&record.semester);
            }
        }
        seen
    }

    pub fn add(&mut self, course: NewCourse) -> Result<&CourseRecord> {
        let semester = required(&course.semester, "semester")?;
        let course_code = required(&course.course_code, "course code")?;
        let course_name = required(&course.course_name, "course name")?;
        SemesterTag::parse(semester)?;
        CourseCode::parse(course_code)?;
        let credits = validate_credits(course.credits as i64)?;

        self.records.push(CourseRecord {
            semester: semester.to_string(),
            course_code: course_code.to_string(),
            course_name: course_name.to_string(),
            credits,
            grade: course.grade,
            created_at: Local::now().naive_local(),
        });
        Ok(&self.records[self.records.len() - 1])
    }

    pub fn delete(&mut self, position: usize) -> Result<CourseRecord> {
        self.check_position(position)?;
        Ok(self.records.remove(position))
    }

    /// Replaces a stored grade and returns the previous one.
    pub fn set_grade(&mut self, position: usize, grade: Grade) -> Result<Grade> {
        self.check_position(position)?;
        Ok(std::mem::replace(&mut self.records[position].grade, grade))
    }

    pub fn extend(&mut self, records: Vec<CourseRecord>) {
        self.records.extend(records);
    }

    fn check_position(&self, position: usize) -> Result<()> {
        if position < self.records.len() {
            Ok(())
        } else {
            Err(GpaError::PositionOutOfRange {
                position,
                len: self.records.len(),
            })
        }
    }
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(GpaError::MissingField(field))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::course;

    #[test]
    fn grade_labels_round_trip() {
        for grade in Grade::ALL {
            assert_eq!(grade.label().parse::<Grade>().unwrap(), grade);
        }
        assert!(matches!("E".parse::<Grade>(), Err(GpaError::UnknownGrade(_))));
    }

    #[test]
    fn scale_is_non_increasing() {
        for pair in Grade::ALL.windows(2) {
            assert!(pair[0].points() >= pair[1].points());
        }
        assert_eq!(Grade::APlus.points(), Grade::A.points());
    }

    #[test]
    fn unmapped_labels_count_as_failing() {
        assert_eq!(grade_points("B+"), 3.3);
        assert_eq!(grade_points("P"), 0.0);
    }

    #[test]
    fn nearest_prefers_earliest_letter_on_ties() {
        assert_eq!(Grade::nearest(4.0), Grade::APlus);
        assert_eq!(Grade::nearest(4.6), Grade::APlus);
        assert_eq!(Grade::nearest(3.1), Grade::B);
        assert_eq!(Grade::nearest(-0.3), Grade::F);
        assert_eq!(Grade::nearest(3.6), Grade::AMinus);
    }

    #[test]
    fn add_validates_input_without_mutating() {
        let mut table = GradeTable::new();
        assert!(matches!(
            table.add(course("Semester 1.1", "CS101", 7, Grade::A)),
            Err(GpaError::InvalidCredits(7))
        ));
        assert!(matches!(
            table.add(course("  ", "CS101", 3, Grade::A)),
            Err(GpaError::MissingField("semester"))
        ));
        assert!(matches!(
            table.add(course("Fall", "CS101", 3, Grade::A)),
            Err(GpaError::InvalidSemester(_))
        ));
        assert!(matches!(
            table.add(course("Semester 1.1", "101", 3, Grade::A)),
            Err(GpaError::InvalidCourseCode(_))
        ));
        assert!(table.is_empty());

        let added = table.add(course("Semester 1.1", "CS101", 3, Grade::A)).unwrap();
        assert_eq!(added.course_code, "CS101");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn delete_shifts_positions() {
        let mut table = GradeTable::new();
        table.add(course("Semester 1.1", "CS101", 3, Grade::A)).unwrap();
        table.add(course("Semester 1.1", "MA101", 4, Grade::B)).unwrap();
        table.add(course("Semester 1.2", "PH101", 2, Grade::C)).unwrap();

        let removed = table.delete(1).unwrap();
        assert_eq!(removed.course_code, "MA101");
        assert_eq!(table.len(), 2);
        assert!(table.records().iter().all(|r| r.course_code != "MA101"));
        assert_eq!(table.get(1).unwrap().course_code, "PH101");
        assert!(matches!(
            table.delete(2),
            Err(GpaError::PositionOutOfRange { position: 2, len: 2 })
        ));
    }

    #[test]
    fn set_grade_returns_previous() {
        let mut table = GradeTable::new();
        table.add(course("Semester 1.1", "CS101", 3, Grade::C)).unwrap();
        assert_eq!(table.set_grade(0, Grade::A).unwrap(), Grade::C);
        assert_eq!(table.get(0).unwrap().grade, Grade::A);
        assert!(table.set_grade(5, Grade::A).is_err());
    }

    #[test]
    fn semesters_keep_first_seen_order() {
        let mut table = GradeTable::new();
        table.add(course("Semester 1.2", "CS102", 3, Grade::A)).unwrap();
        table.add(course("Semester 1.1", "CS101", 3, Grade::A)).unwrap();
        table.add(course("Semester 1.2", "MA102", 3, Grade::B)).unwrap();
        assert_eq!(table.semesters(), vec!["Semester 1.2", "Semester 1.1"]);
        assert_eq!(table.total_credits(), 9);
    }
}
