use thiserror::Error;

#[derive(Error, Debug)]
pub enum GpaError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("credits must be between 1 and 6, got {0}")]
    InvalidCredits(i64),

    #[error("malformed semester tag: {0:?}")]
    InvalidSemester(String),

    #[error("malformed course code: {0:?}")]
    InvalidCourseCode(String),

    #[error("unknown grade: {0:?}")]
    UnknownGrade(String),

    #[error("position {position} is out of range for a table of {len} courses")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("import is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("unparseable timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("invalid goal: {0}")]
    InvalidGoal(String),

    #[error("prediction model has not been trained")]
    NotTrained,

    #[error("computation failed: {0}")]
    InvalidComputation(String),

    #[error("regression model error: {0}")]
    Model(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GpaError>;
