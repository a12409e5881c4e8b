use thiserror::Error;

/// Local, pre-flight rejections. Nothing reaches the store when one of these fires.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("student name is required")]
    NameRequired,

    #[error("{field} must be between {min} and {max}, got {value}")]
    ScoreOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be a number")]
    NotNumeric { field: &'static str },

    #[error("session length must be a positive number of minutes that fits the calendar, got {minutes}")]
    TtlOutOfRange { minutes: i64 },
}

#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique constraint rejected the row. Callers decide whether that is a fault.
    #[error("duplicate row rejected by {0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique constraint").to_string();
                return StoreError::Conflict(constraint);
            }
        }
        StoreError::Database(err)
    }
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

#[derive(Error, Debug)]
pub enum AttendanceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to mark attendance, please try again: {0}")]
    Store(#[from] StoreError),

    #[error("attendance session is not open for submissions")]
    NotOpen,
}
