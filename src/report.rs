use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::gpa;
use crate::models::GradeTable;

pub fn build_report(student: Option<&str>, generated_at: NaiveDateTime, table: &GradeTable) -> String {
    let summary = gpa::summarize(table);
    let trend = gpa::semester_trend(table);
    let distribution = gpa::grade_distribution(table);
    let impacts = gpa::course_impacts(table);

    let mut output = String::new();
    let label = student.unwrap_or("your record");

    let _ = writeln!(output, "# Academic Progress Report");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        label,
        generated_at.format("%Y-%m-%d %H:%M")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");

    if table.is_empty() {
        let _ = writeln!(output, "No courses recorded yet.");
        return output;
    }

    let _ = writeln!(output, "- Overall GPA: {:.2}", summary.gpa);
    let _ = writeln!(output, "- Total credits: {}", summary.total_credits);
    let _ = writeln!(output, "- Courses: {}", summary.course_count);

    let _ = writeln!(output);
    let _ = writeln!(output, "## GPA by Semester");
    for semester in &trend {
        let _ = writeln!(
            output,
            "- {}: {:.2} across {} courses ({} credits)",
            semester.semester, semester.gpa, semester.course_count, semester.credits
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Grade Distribution");
    for (grade, count) in &distribution {
        let _ = writeln!(output, "- {}: {}", grade, count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Course Performance");
    let _ = writeln!(output, "| Semester | Code | Course | Credits | Grade | GPA Impact |");
    let _ = writeln!(output, "|---|---|---|---|---|---|");
    for course in &impacts {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {:.2} |",
            course.semester,
            course.course_code,
            course.course_name,
            course.credits,
            course.grade,
            course.impact
        );
    }

    output
}
