use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{GpaError, Result};
use crate::models::{CourseRecord, Grade, GradeTable, SCALE_CEILING};

pub fn calculate_gpa(records: &[CourseRecord]) -> f64 {
    weighted_average(records.iter().map(|r| (r.credits, r.grade)))
}

/// GPA with some positions' grades replaced. The records are not touched.
pub fn simulate_gpa(records: &[CourseRecord], overrides: &BTreeMap<usize, Grade>) -> Result<f64> {
    if let Some(&position) = overrides.keys().find(|&&p| p >= records.len()) {
        return Err(GpaError::PositionOutOfRange {
            position,
            len: records.len(),
        });
    }

    Ok(weighted_average(records.iter().enumerate().map(|(i, r)| {
        (r.credits, overrides.get(&i).copied().unwrap_or(r.grade))
    })))
}

fn weighted_average(rows: impl Iterator<Item = (u32, Grade)>) -> f64 {
    let (points, credits) = rows.fold((0.0, 0u32), |(points, credits), (c, grade)| {
        (points + c as f64 * grade.points(), credits + c)
    });

    if credits == 0 {
        0.0
    } else {
        points / credits as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioImpact {
    SignificantImprovement,
    ModestImprovement,
    NoChange,
    SlightDecrease,
    SignificantDecrease,
}

impl ScenarioImpact {
    pub fn describe(self) -> &'static str {
        match self {
            ScenarioImpact::SignificantImprovement => "would significantly improve your GPA",
            ScenarioImpact::ModestImprovement => "would lead to a modest improvement in your GPA",
            ScenarioImpact::NoChange => "would result in no change to your GPA",
            ScenarioImpact::SlightDecrease => "would lead to a slight decrease in your GPA",
            ScenarioImpact::SignificantDecrease => "would significantly decrease your GPA",
        }
    }
}

pub fn classify_change(current: f64, projected: f64) -> ScenarioImpact {
    let change = projected - current;
    if change > 0.2 {
        ScenarioImpact::SignificantImprovement
    } else if change > 0.0 {
        ScenarioImpact::ModestImprovement
    } else if change < -0.2 {
        ScenarioImpact::SignificantDecrease
    } else if change < 0.0 {
        ScenarioImpact::SlightDecrease
    } else {
        ScenarioImpact::NoChange
    }
}

/// GPA needed over `remaining_credits` more credit-hours to land on
/// `target_gpa` across the combined load.
pub fn required_future_gpa(
    current_gpa: f64,
    current_credits: f64,
    target_gpa: f64,
    remaining_credits: f64,
) -> f64 {
    let target_points = target_gpa * (current_credits + remaining_credits);
    let current_points = current_gpa * current_credits;
    (target_points - current_points) / remaining_credits
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalOutlook {
    Challenging,
    MixedAB,
    SolidB,
    Comfortable,
}

impl GoalOutlook {
    fn from_required(required: f64) -> Self {
        if required > 3.7 {
            GoalOutlook::Challenging
        } else if required > 3.3 {
            GoalOutlook::MixedAB
        } else if required > 3.0 {
            GoalOutlook::SolidB
        } else {
            GoalOutlook::Comfortable
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            GoalOutlook::Challenging => "challenging, requiring mostly A grades",
            GoalOutlook::MixedAB => "achievable with a mix of A and B+ grades",
            GoalOutlook::SolidB => "realistic with solid B+ performance",
            GoalOutlook::Comfortable => "very achievable at your current level",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GoalAssessment {
    AlreadyMet,
    Feasible { required: f64, outlook: GoalOutlook },
    Infeasible { required: f64 },
}

pub fn assess_goal(
    current_gpa: f64,
    current_credits: f64,
    target_gpa: f64,
    remaining_credits: f64,
) -> Result<GoalAssessment> {
    if !(0.0..=SCALE_CEILING).contains(&target_gpa) {
        return Err(GpaError::InvalidGoal(format!(
            "target GPA {target_gpa} is outside 0.0-{SCALE_CEILING}"
        )));
    }
    if !(remaining_credits > 0.0) {
        return Err(GpaError::InvalidGoal(format!(
            "remaining credits must be positive, got {remaining_credits}"
        )));
    }
    if current_credits < 0.0 {
        return Err(GpaError::InvalidGoal(format!(
            "current credits cannot be negative, got {current_credits}"
        )));
    }

    if target_gpa <= current_gpa {
        return Ok(GoalAssessment::AlreadyMet);
    }

    let required =
        required_future_gpa(current_gpa, current_credits, target_gpa, remaining_credits);
    if required > SCALE_CEILING {
        Ok(GoalAssessment::Infeasible { required })
    } else {
        Ok(GoalAssessment::Feasible {
            required,
            outlook: GoalOutlook::from_required(required),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SemesterGpa {
    pub semester: String,
    pub gpa: f64,
    pub credits: u32,
    pub course_count: usize,
}

/// GPA per semester tag, ordered by tag.
pub fn semester_trend(table: &GradeTable) -> Vec<SemesterGpa> {
    let mut groups: BTreeMap<&str, Vec<CourseRecord>> = BTreeMap::new();
    for record in table.records() {
        groups
            .entry(record.semester.as_str())
            .or_default()
            .push(record.clone());
    }

    groups
        .into_iter()
        .map(|(semester, records)| SemesterGpa {
            semester: semester.to_string(),
            gpa: calculate_gpa(&records),
            credits: records.iter().map(|r| r.credits).sum(),
            course_count: records.len(),
        })
        .collect()
}

/// Count per grade present in the table, best grade first.
pub fn grade_distribution(table: &GradeTable) -> Vec<(Grade, usize)> {
    let mut counts: BTreeMap<Grade, usize> = BTreeMap::new();
    for record in table.records() {
        *counts.entry(record.grade).or_insert(0) += 1;
    }
    counts.into_iter().collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseImpact {
    pub position: usize,
    pub semester: String,
    pub course_code: String,
    pub course_name: String,
    pub credits: u32,
    pub grade: Grade,
    pub impact: f64,
}

/// Courses ranked by credit-weighted points, largest first.
pub fn course_impacts(table: &GradeTable) -> Vec<CourseImpact> {
    let mut impacts: Vec<CourseImpact> = table
        .records()
        .iter()
        .enumerate()
        .map(|(position, r)| CourseImpact {
            position,
            semester: r.semester.clone(),
            course_code: r.course_code.clone(),
            course_name: r.course_name.clone(),
            credits: r.credits,
            grade: r.grade,
            impact: r.weighted_points(),
        })
        .collect();

    impacts.sort_by(|a, b| {
        b.impact
            .partial_cmp(&a.impact)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    impacts
}

#[derive(Debug, Clone, Serialize)]
pub struct GpaSummary {
    pub gpa: f64,
    pub total_credits: u32,
    pub course_count: usize,
}

pub fn summarize(table: &GradeTable) -> GpaSummary {
    GpaSummary {
        gpa: calculate_gpa(table.records()),
        total_credits: table.total_credits(),
        course_count: table.len(),
    }
}
