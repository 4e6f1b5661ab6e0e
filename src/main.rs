use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gpa_insight::config::Settings;
use gpa_insight::gpa::{self, GoalAssessment};
use gpa_insight::models::{Grade, NewCourse};
use gpa_insight::{report, store, study, Session};

#[derive(Parser)]
#[command(name = "gpa-insight")]
#[command(about = "Track courses, compute GPA, plan goals and predict grades", long_about = None)]
struct Cli {
    /// Course CSV loaded at start and rewritten after changes
    #[arg(long, global = true, default_value = "courses.csv")]
    courses: PathBuf,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a course
    Add {
        #[arg(long)]
        semester: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 3)]
        credits: u32,
        #[arg(long)]
        grade: Grade,
    },
    /// Delete the course at a position (positions shift afterwards)
    Delete {
        #[arg(long)]
        position: usize,
    },
    /// Change the grade stored for a course
    SetGrade {
        #[arg(long)]
        position: usize,
        #[arg(long)]
        grade: Grade,
    },
    /// List courses with their positions
    List,
    /// Overall GPA, credits and course count
    Summary,
    /// GPA per semester
    Trend,
    /// GPA if some grades were different
    Simulate {
        /// POSITION=GRADE, repeatable
        #[arg(long = "set", value_parser = parse_override)]
        overrides: Vec<(usize, Grade)>,
    },
    /// GPA needed over the remaining credits to reach a target
    Goal {
        #[arg(long)]
        target: f64,
        #[arg(long)]
        remaining: Option<f64>,
    },
    /// Weekly study hours for a course
    Study {
        #[arg(long, default_value = "Moderate")]
        difficulty: String,
        #[arg(long, default_value_t = 3)]
        credits: u32,
        #[arg(long)]
        target_grade: String,
        #[arg(long)]
        course_name: Option<String>,
    },
    /// Study tips for a subject area
    Tips {
        #[arg(long)]
        subject: String,
    },
    /// Train the grade predictor and show its scores
    Train,
    /// Predict the grade for a future course
    Predict {
        #[arg(long)]
        semester: String,
        #[arg(long)]
        code: String,
        #[arg(long, default_value_t = 3)]
        credits: u32,
    },
    /// Rank the features that drive predicted grades
    Importance {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Append courses from another CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Write all courses to a CSV file
    Export {
        #[arg(long)]
        out: PathBuf,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        student: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn parse_override(value: &str) -> Result<(usize, Grade), String> {
    let (position, grade) = value
        .split_once('=')
        .ok_or_else(|| format!("expected POSITION=GRADE, got {value:?}"))?;
    let position = position
        .trim()
        .parse()
        .map_err(|_| format!("invalid position {position:?}"))?;
    let grade = grade.parse().map_err(|e: gpa_insight::GpaError| e.to_string())?;
    Ok((position, grade))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

fn load_session(settings: &Settings, courses: &Path) -> anyhow::Result<Session> {
    let mut session = Session::with_settings(settings.predictor(), settings.n_estimators);
    if courses.exists() {
        store::import_csv(&mut session.table, courses)
            .with_context(|| format!("failed to load courses from {}", courses.display()))?;
    }
    Ok(session)
}

fn save_session(session: &Session, courses: &Path) -> anyhow::Result<()> {
    store::export_csv(&session.table, courses)
        .with_context(|| format!("failed to write courses to {}", courses.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().context("failed to read GPA_INSIGHT_* settings")?;
    init_tracing(settings.log_json);

    let mut session = load_session(&settings, &cli.courses)?;
    let json = cli.json;

    match cli.command {
        Commands::Add {
            semester,
            code,
            name,
            credits,
            grade,
        } => {
            let added = session
                .add_course(NewCourse {
                    semester,
                    course_code: code,
                    course_name: name,
                    credits,
                    grade,
                })?
                .clone();
            save_session(&session, &cli.courses)?;
            emit(json, &added, || {
                format!("Added {} {} ({}).", added.course_code, added.course_name, added.grade)
            })?;
        }
        Commands::Delete { position } => {
            let removed = session.delete_course(position)?;
            save_session(&session, &cli.courses)?;
            emit(json, &removed, || {
                format!(
                    "Deleted {} {}. {} courses remain; later positions moved up by one.",
                    removed.course_code,
                    removed.course_name,
                    session.table.len()
                )
            })?;
        }
        Commands::SetGrade { position, grade } => {
            let previous = session.set_grade(position, grade)?;
            save_session(&session, &cli.courses)?;
            println!("Position {position}: {previous} -> {grade}. GPA now {:.2}.", session.gpa());
        }
        Commands::List => {
            emit(json, &session.table.records(), || {
                if session.table.is_empty() {
                    return "No courses recorded yet.".to_string();
                }
                session
                    .table
                    .records()
                    .iter()
                    .enumerate()
                    .map(|(i, r)| {
                        format!(
                            "[{i}] {} {}: {} ({} credits, {})",
                            r.semester, r.course_code, r.course_name, r.credits, r.grade
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        Commands::Summary => {
            let summary = session.summary();
            emit(json, &summary, || {
                format!(
                    "GPA {:.2} across {} courses ({} credits).",
                    summary.gpa, summary.course_count, summary.total_credits
                )
            })?;
        }
        Commands::Trend => {
            let trend = gpa::semester_trend(&session.table);
            emit(json, &trend, || {
                if trend.is_empty() {
                    return "No courses recorded yet.".to_string();
                }
                trend
                    .iter()
                    .map(|s| format!("- {}: {:.2} ({} courses)", s.semester, s.gpa, s.course_count))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        Commands::Simulate { overrides } => {
            let overrides: BTreeMap<usize, Grade> = overrides.into_iter().collect();
            let current = session.gpa();
            let projected = session.simulate(&overrides)?;
            let impact = gpa::classify_change(current, projected);

            #[derive(Serialize)]
            struct Scenario {
                current: f64,
                projected: f64,
                change: f64,
                impact: gpa::ScenarioImpact,
            }
            let scenario = Scenario {
                current,
                projected,
                change: projected - current,
                impact,
            };
            emit(json, &scenario, || {
                format!(
                    "Current GPA {:.2}, projected {:.2} ({:+.2}). This scenario {}.",
                    current,
                    projected,
                    projected - current,
                    impact.describe()
                )
            })?;
        }
        Commands::Goal { target, remaining } => {
            let remaining = remaining.unwrap_or(settings.remaining_credits);
            let assessment = session.assess_goal(target, remaining)?;
            let current = session.gpa();
            emit(json, &assessment, || match assessment {
                GoalAssessment::AlreadyMet => format!(
                    "Your current GPA of {current:.2} already meets a target of {target:.2}."
                ),
                GoalAssessment::Feasible { required, outlook } => format!(
                    "To reach {target:.2} you need a {required:.2} GPA over the next {remaining} credits. This is {}.",
                    outlook.describe()
                ),
                GoalAssessment::Infeasible { required } => format!(
                    "A target of {target:.2} would need {required:.2} over the next {remaining} credits, which is above the 4.0 scale."
                ),
            })?;
        }
        Commands::Study {
            difficulty,
            credits,
            target_grade,
            course_name,
        } => {
            let hours = study::recommend_study_hours(&difficulty, credits, &target_grade)?;
            let schedule = study::weekly_schedule(hours);

            #[derive(Serialize)]
            struct StudyPlan {
                weekly_hours: f64,
                schedule: Vec<study::DayPlan>,
            }
            let course = course_name.unwrap_or_else(|| "this course".to_string());
            let plan = StudyPlan {
                weekly_hours: hours,
                schedule,
            };
            emit(json, &plan, || {
                let mut text = format!(
                    "Study {} hours/week for {} ({}, {} credits, target {}).",
                    hours, course, difficulty, credits, target_grade
                );
                for day in &plan.schedule {
                    text.push_str(&format!("\n- {}: {:.1}h", day.day, day.hours));
                }
                text
            })?;
        }
        Commands::Tips { subject } => {
            let tips = study::study_tips(&subject).with_context(|| {
                format!(
                    "unknown subject {subject:?}; choose one of: {}",
                    study::SUBJECTS.join(", ")
                )
            })?;
            emit(json, &tips, || {
                tips.iter()
                    .enumerate()
                    .map(|(i, tip)| format!("{}. {}", i + 1, tip))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        Commands::Train => {
            let report = session.train()?;
            emit(json, &report, || {
                if !report.trained {
                    return format!(
                        "Need at least {} courses to train; have {}.",
                        session.predictor.settings().min_training_rows,
                        session.table.len()
                    );
                }
                format!(
                    "Model trained. Train R2 {}, test R2 {}.",
                    format_score(report.train_score),
                    format_score(report.test_score)
                )
            })?;
        }
        Commands::Predict {
            semester,
            code,
            credits,
        } => {
            let report = session.train()?;
            if !report.trained {
                anyhow::bail!(
                    "need at least {} courses before predicting",
                    session.predictor.settings().min_training_rows
                );
            }
            let prediction = session
                .predict(&semester, &code, credits)
                .context("prediction failed")?;
            emit(json, &prediction, || {
                format!(
                    "Predicted grade for {code}: {} ({:.2} points).",
                    prediction.grade, prediction.points
                )
            })?;
        }
        Commands::Importance { limit } => {
            session.train()?;
            let ranked = session
                .feature_importance()
                .context("need a trained model; add more courses first")?;
            let top: Vec<_> = ranked.into_iter().take(limit).collect();
            emit(json, &top, || {
                top.iter()
                    .map(|f| format!("- {}: {:.3}", f.feature, f.importance))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        Commands::Import { csv } => {
            let imported = store::import_csv(&mut session.table, &csv)
                .with_context(|| format!("import of {} rejected", csv.display()))?;
            save_session(&session, &cli.courses)?;
            println!("Imported {imported} courses from {}.", csv.display());
        }
        Commands::Export { out } => {
            store::export_csv(&session.table, &out)?;
            println!("Exported {} courses to {}.", session.table.len(), out.display());
        }
        Commands::Report { student, out } => {
            let generated_at = chrono::Local::now().naive_local();
            let report = report::build_report(student.as_deref(), generated_at, &session.table);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn format_score(score: Option<f64>) -> String {
    score.map_or_else(|| "n/a".to_string(), |s| format!("{s:.2}"))
}
