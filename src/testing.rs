use chrono::NaiveDate;

use crate::models::{CourseRecord, Grade, GradeTable, NewCourse};

pub(crate) fn course(semester: &str, code: &str, credits: u32, grade: Grade) -> NewCourse {
    NewCourse {
        semester: semester.to_string(),
        course_code: code.to_string(),
        course_name: format!("{code} course"),
        credits,
        grade,
    }
}

pub(crate) fn record(semester: &str, code: &str, credits: u32, grade: Grade) -> CourseRecord {
    CourseRecord {
        semester: semester.to_string(),
        course_code: code.to_string(),
        course_name: format!("{code} course"),
        credits,
        grade,
        created_at: NaiveDate::from_ymd_opt(2025, 9, 1)
            .and_then(|d| d.and_hms_micro_opt(10, 30, 0, 123_456))
            .expect("valid fixture timestamp"),
    }
}

/// Eight courses across four year-tagged semesters and three subjects.
pub(crate) fn sample_table() -> GradeTable {
    GradeTable::from_records(vec![
        record("Semester 2021", "CS101", 3, Grade::A),
        record("Semester 2021", "MATH101", 4, Grade::BPlus),
        record("Semester 2022", "CS201", 3, Grade::AMinus),
        record("Semester 2022", "PHY201", 4, Grade::B),
        record("Semester 2023", "CS301", 3, Grade::APlus),
        record("Semester 2023", "MATH301", 4, Grade::BMinus),
        record("Semester 2024", "CS401", 3, Grade::A),
        record("Semester 2024", "PHY401", 2, Grade::CPlus),
    ])
}
