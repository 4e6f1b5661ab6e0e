//! Study-time planning: weekly hour recommendations, a weekday schedule, and
//! subject-specific study tips.

use serde::Serialize;

use crate::error::{GpaError, Result};

pub const BASE_HOURS_PER_CREDIT: f64 = 2.0;

pub const DIFFICULTY_LEVELS: [&str; 4] = ["Easy", "Moderate", "Challenging", "Very Difficult"];

pub fn difficulty_multiplier(difficulty: &str) -> f64 {
    match difficulty {
        "Easy" => 0.8,
        "Moderate" => 1.0,
        "Challenging" => 1.3,
        "Very Difficult" => 1.6,
        _ => 1.0,
    }
}

pub fn grade_multiplier(target_grade: &str) -> f64 {
    match target_grade {
        "A+" => 1.4,
        "A" => 1.3,
        "A-" => 1.2,
        "B+" => 1.1,
        "B" => 1.0,
        "B-" => 0.9,
        "C+" => 0.8,
        "C" => 0.7,
        "C-" => 0.6,
        "D+" => 0.5,
        "D" => 0.4,
        "D-" => 0.3,
        _ => 1.0,
    }
}

/// Weekly study hours, rounded to one decimal.
pub fn recommend_study_hours(difficulty: &str, credits: u32, target_grade: &str) -> Result<f64> {
    let hours = BASE_HOURS_PER_CREDIT
        * credits as f64
        * difficulty_multiplier(difficulty)
        * grade_multiplier(target_grade);
    let hours = round_tenth(hours);

    if !hours.is_finite() || hours < 0.0 {
        return Err(GpaError::InvalidComputation(format!(
            "study hours for {credits} credits came out as {hours}"
        )));
    }
    Ok(hours)
}

#[derive(Debug, Clone, Serialize)]
pub struct DayPlan {
    pub day: &'static str,
    pub hours: f64,
}

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Spreads weekly hours across Monday to Friday; weekends stay free.
pub fn weekly_schedule(weekly_hours: f64) -> Vec<DayPlan> {
    WEEKDAYS
        .iter()
        .enumerate()
        .map(|(i, &day)| DayPlan {
            day,
            hours: if i < 5 { round_tenth(weekly_hours / 5.0) } else { 0.0 },
        })
        .collect()
}

pub const SUBJECTS: [&str; 11] = [
    "Mathematics",
    "Science",
    "Computer Science",
    "Engineering",
    "Business",
    "Arts",
    "Humanities",
    "Social Sciences",
    "Health Sciences",
    "Languages",
    "Other",
];

pub fn study_tips(subject: &str) -> Option<&'static [&'static str]> {
    let tips: &'static [&'static str] = match subject {
        "Mathematics" => &[
            "Practice solving problems regularly",
            "Focus on understanding concepts rather than memorizing formulas",
            "Review notes within 24 hours of class",
            "Form study groups to discuss complex problems",
            "Use visualization techniques for abstract concepts",
        ],
        "Computer Science" => &[
            "Apply concepts by coding practical examples",
            "Break down complex algorithms into smaller steps",
            "Teach concepts to others to solidify understanding",
            "Create your own test cases for debugging practice",
            "Read documentation and source code to understand libraries",
        ],
        "Science" => &[
            "Create flashcards for key terms and concepts",
            "Draw diagrams to visualize processes",
            "Connect theories to real-world applications",
            "Write summaries of complex topics in your own words",
            "Prepare questions before lab sessions",
        ],
        "Business" => &[
            "Read current business news and relate it to course concepts",
            "Practice with case studies",
            "Create mind maps for interconnected topics",
            "Use real-world examples to understand theories",
            "Discuss concepts with peers from different backgrounds",
        ],
        "Engineering" => &[
            "Solve example problems step by step",
            "Create cheat sheets for formulas and processes",
            "Implement concepts in practical projects",
            "Review previous exam questions",
            "Visualize problems before solving them",
        ],
        "Arts" => &[
            "Analyze examples of excellent work in your field",
            "Practice regularly to develop technical skills",
            "Keep a journal of inspirations and reflections",
            "Seek feedback from peers and instructors",
            "Connect theory to your practical work",
        ],
        "Humanities" => &[
            "Develop arguments by writing outlines",
            "Create timelines for historical events",
            "Engage in discussions to understand different perspectives",
            "Read primary sources when available",
            "Connect ideas across different texts and time periods",
        ],
        "Social Sciences" => &[
            "Connect theories to real-world events",
            "Practice analyzing data and statistics",
            "Read current research in the field",
            "Conduct small observational studies",
            "Create concept maps to show relationships between ideas",
        ],
        "Health Sciences" => &[
            "Use anatomical models or visualizations",
            "Create flashcards for terminology",
            "Form study groups for case discussions",
            "Teach concepts to others to check your understanding",
            "Connect theoretical knowledge to clinical applications",
        ],
        "Languages" => &[
            "Practice speaking daily, even if just to yourself",
            "Use spaced repetition for vocabulary",
            "Immerse yourself in native content such as films and podcasts",
            "Find a language exchange partner",
            "Learn grammar through contextual examples instead of isolated rules",
        ],
        "Other" => &[
            "Break down complex topics into manageable chunks",
            "Use active recall rather than passive reviewing",
            "Use spaced repetition for better retention",
            "Take regular breaks using the Pomodoro technique",
            "Connect new information to concepts you already understand",
        ],
        _ => return None,
    };
    Some(tips)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderate_b_is_baseline() {
        assert_eq!(recommend_study_hours("Moderate", 3, "B").unwrap(), 6.0);
    }

    #[test]
    fn very_difficult_a_plus() {
        assert_eq!(recommend_study_hours("Very Difficult", 4, "A+").unwrap(), 17.9);
    }

    #[test]
    fn unknown_keys_use_neutral_multiplier() {
        assert_eq!(recommend_study_hours("Brutal", 2, "F").unwrap(), 4.0);
        assert_eq!(recommend_study_hours("Easy", 5, "D-").unwrap(), 2.4);
    }

    #[test]
    fn schedule_covers_weekdays_only() {
        let plan = weekly_schedule(17.9);
        assert_eq!(plan.len(), 7);
        assert!(plan[..5].iter().all(|d| d.hours == 3.6));
        assert!(plan[5..].iter().all(|d| d.hours == 0.0));
        assert_eq!(plan[6].day, "Sunday");
    }

    #[test]
    fn every_subject_has_five_tips() {
        for subject in SUBJECTS {
            assert_eq!(study_tips(subject).map(<[_]>::len), Some(5), "{subject}");
        }
        assert!(study_tips("Astrology").is_none());
    }
}
