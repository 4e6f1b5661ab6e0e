//! Parsers for the two structured tokens carried by a course record:
//! semester tags ("Semester 2.1", "Semester 2024") and course codes ("CS301").

use std::fmt;

use serde::Serialize;

use crate::error::{GpaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SemesterTag {
    /// "Semester <term>.<half>"
    Term { year: u32, half: u32 },
    /// "Semester <yyyy>"
    Year { year: u32 },
}

impl SemesterTag {
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || GpaError::InvalidSemester(input.to_string());
        let mut tokens = input.split_whitespace();

        let keyword = tokens.next().ok_or_else(invalid)?;
        let value = tokens.next().ok_or_else(invalid)?;
        if !keyword.eq_ignore_ascii_case("semester") || tokens.next().is_some() {
            return Err(invalid());
        }

        if let Some((year, half)) = value.split_once('.') {
            let year = parse_digits(year).ok_or_else(invalid)?;
            let half = parse_digits(half).ok_or_else(invalid)?;
            return Ok(SemesterTag::Term { year, half });
        }

        if value.len() == 4 {
            if let Some(year) = parse_digits(value) {
                return Ok(SemesterTag::Year { year });
            }
        }

        Err(invalid())
    }
}

impl fmt::Display for SemesterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemesterTag::Term { year, half } => write!(f, "Semester {year}.{half}"),
            SemesterTag::Year { year } => write!(f, "Semester {year}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseCode {
    pub subject: String,
    pub level: Option<u32>,
}

impl CourseCode {
    /// Accepts 2+ leading uppercase letters followed by at least one digit.
    /// Subjects longer than four letters are cut to four.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || GpaError::InvalidCourseCode(input.to_string());
        let code = input.trim();

        let letters = code
            .chars()
            .take_while(|c| c.is_ascii_uppercase())
            .count();
        if letters < 2 {
            return Err(invalid());
        }

        let rest = &code[letters..];
        if !rest.starts_with(|c: char| c.is_ascii_digit())
            || !rest.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(invalid());
        }

        Ok(CourseCode {
            subject: code[..letters.min(4)].to_string(),
            level: rest.chars().next().and_then(|c| c.to_digit(10)),
        })
    }
}

/// First run of two or more uppercase letters anywhere in a stored code, cut
/// to four. Reads "CS 301" and "MATH-201" where `CourseCode::parse` would not.
pub fn subject_letters(code: &str) -> Option<String> {
    let mut rest = code;
    while let Some(start) = rest.find(|c: char| c.is_ascii_uppercase()) {
        let run = &rest[start..];
        let len = run.chars().take_while(|c| c.is_ascii_uppercase()).count();
        if len >= 2 {
            return Some(run[..len.min(4)].to_string());
        }
        rest = &run[len..];
    }
    None
}

/// First digit anywhere in a stored code.
pub fn first_digit(code: &str) -> Option<u32> {
    code.chars().find_map(|c| c.to_digit(10))
}

/// First run of four consecutive ASCII digits anywhere in the tag.
pub fn embedded_year(semester: &str) -> Option<u32> {
    let bytes = semester.as_bytes();
    bytes
        .windows(4)
        .position(|w| w.iter().all(u8::is_ascii_digit))
        .and_then(|start| semester[start..start + 4].parse().ok())
}

/// The last whitespace token, which must be exactly four ASCII digits.
pub fn trailing_year(semester: &str) -> Result<u32> {
    semester
        .split_whitespace()
        .last()
        .filter(|token| token.len() == 4)
        .and_then(parse_digits)
        .ok_or_else(|| GpaError::InvalidSemester(semester.to_string()))
}

fn parse_digits(value: &str) -> Option<u32> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_term_and_year_tags() {
        assert_eq!(
            SemesterTag::parse("Semester 2.1").unwrap(),
            SemesterTag::Term { year: 2, half: 1 }
        );
        assert_eq!(
            SemesterTag::parse("Semester 2024").unwrap(),
            SemesterTag::Year { year: 2024 }
        );
        assert_eq!(SemesterTag::Year { year: 2024 }.to_string(), "Semester 2024");
    }

    #[test]
    fn parsed_tokens_serialize_as_json() {
        let year = serde_json::to_value(SemesterTag::Year { year: 2024 }).unwrap();
        assert_eq!(year, serde_json::json!({ "kind": "year", "year": 2024 }));

        let term = serde_json::to_value(SemesterTag::Term { year: 2, half: 1 }).unwrap();
        assert_eq!(term, serde_json::json!({ "kind": "term", "year": 2, "half": 1 }));

        let code = serde_json::to_value(CourseCode::parse("CS301").unwrap()).unwrap();
        assert_eq!(code, serde_json::json!({ "subject": "CS", "level": 3 }));
    }

    #[test]
    fn rejects_malformed_semesters() {
        for tag in ["", "Semester", "Term 2.1", "Semester 2.", "Semester 24", "Semester 2.1 extra"] {
            assert!(
                matches!(SemesterTag::parse(tag), Err(GpaError::InvalidSemester(_))),
                "{tag:?} should be rejected"
            );
        }
    }

    #[test]
    fn parses_course_codes() {
        let code = CourseCode::parse("CS301").unwrap();
        assert_eq!(code.subject, "CS");
        assert_eq!(code.level, Some(3));

        let code = CourseCode::parse("MATH2010A").unwrap();
        assert_eq!(code.subject, "MATH");
        assert_eq!(code.level, Some(2));

        let code = CourseCode::parse("BIOCHEM101").unwrap();
        assert_eq!(code.subject, "BIOC");
        assert_eq!(code.level, Some(1));
    }

    #[test]
    fn rejects_malformed_course_codes() {
        for code in ["", "C101", "cs101", "CS", "CS-101", "101CS"] {
            assert!(CourseCode::parse(code).is_err(), "{code:?} should be rejected");
        }
    }

    #[test]
    fn extracts_years() {
        assert_eq!(embedded_year("Semester 2023"), Some(2023));
        assert_eq!(embedded_year("Semester 1.2"), None);
        assert_eq!(trailing_year("Fall 2025").unwrap(), 2025);
        assert!(trailing_year("Semester 1.1").is_err());
        assert!(trailing_year("Semester 20245").is_err());
        assert!(trailing_year("").is_err());
    }
}
