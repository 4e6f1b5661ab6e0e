//! Academic record toolkit: GPA arithmetic, what-if scenarios, goal planning,
//! study-time recommendations and grade prediction over a table of courses.

pub mod config;
pub mod error;
pub mod gpa;
pub mod models;
pub mod parse;
pub mod predictor;
pub mod report;
pub mod session;
pub mod store;
pub mod study;

#[cfg(test)]
mod testing;

pub use error::{GpaError, Result};
pub use models::{CourseRecord, Grade, GradeTable, NewCourse};
pub use session::Session;
