//! CSV import and export of course records.

use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{GpaError, Result};
use crate::models::{validate_credits, CourseRecord, Grade, GradeTable};

pub const REQUIRED_COLUMNS: [&str; 5] = ["Semester", "Course Code", "Course Name", "Credits", "Grade"];

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Deserialize)]
struct CsvRow {
    #[serde(rename = "Semester")]
    semester: String,
    #[serde(rename = "Course Code")]
    course_code: String,
    #[serde(rename = "Course Name")]
    course_name: String,
    #[serde(rename = "Credits")]
    credits: i64,
    #[serde(rename = "Grade")]
    grade: String,
    #[serde(rename = "Timestamp", default)]
    timestamp: Option<String>,
}

#[derive(Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Semester")]
    semester: &'a str,
    #[serde(rename = "Course Code")]
    course_code: &'a str,
    #[serde(rename = "Course Name")]
    course_name: &'a str,
    #[serde(rename = "Credits")]
    credits: u32,
    #[serde(rename = "Grade")]
    grade: &'static str,
    #[serde(rename = "Timestamp")]
    timestamp: String,
}

/// Reads every row before returning; one bad row rejects the whole input.
pub fn read_courses<R: Read>(reader: R) -> Result<Vec<CourseRecord>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = reader.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|&&column| !headers.iter().any(|h| h == column))
        .map(|&column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(GpaError::MissingColumns(missing));
    }

    let imported_at = Local::now().naive_local();
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row_number = index + 1;
        let invalid = |reason: String| GpaError::InvalidRow {
            row: row_number,
            reason,
        };

        let row = result.map_err(|e| invalid(e.to_string()))?;
        let credits = validate_credits(row.credits).map_err(|e| invalid(e.to_string()))?;
        let grade: Grade = row.grade.parse().map_err(|e: GpaError| invalid(e.to_string()))?;
        let created_at = match row.timestamp.as_deref().map(str::trim) {
            None | Some("") => imported_at,
            Some(value) => parse_timestamp(value).map_err(|e| invalid(e.to_string()))?,
        };

        records.push(CourseRecord {
            semester: row.semester,
            course_code: row.course_code,
            course_name: row.course_name,
            credits,
            grade,
            created_at,
        });
    }

    Ok(records)
}

pub fn write_courses<W: Write>(writer: W, records: &[CourseRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    if records.is_empty() {
        writer.write_record(REQUIRED_COLUMNS.iter().chain(std::iter::once(&"Timestamp")))?;
    }
    for record in records {
        writer.serialize(ExportRow {
            semester: &record.semester,
            course_code: &record.course_code,
            course_name: &record.course_name,
            credits: record.credits,
            grade: record.grade.label(),
            timestamp: record.created_at.format(TIMESTAMP_FORMAT).to_string(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Appends the courses in `csv_path` to the table. Nothing is appended if any
/// row fails to parse.
pub fn import_csv(table: &mut GradeTable, csv_path: &Path) -> Result<usize> {
    let file = std::fs::File::open(csv_path)?;
    let records = read_courses(file)?;
    let imported = records.len();
    table.extend(records);

    info!(imported, path = %csv_path.display(), "imported courses");
    Ok(imported)
}

pub fn export_csv(table: &GradeTable, csv_path: &Path) -> Result<()> {
    let file = std::fs::File::create(csv_path)?;
    write_courses(file, table.records())?;

    info!(exported = table.len(), path = %csv_path.display(), "exported courses");
    Ok(())
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.naive_local()))
        .map_err(|_| GpaError::InvalidTimestamp(value.to_string()))
}
