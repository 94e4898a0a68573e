use thiserror::Error;

/// Failures a caller can recover from by rephrasing or correcting a goal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GoalError {
    #[error("Could not detect amount from text")]
    AmountNotFound,

    #[error("Could not detect target year from text")]
    YearNotFound,

    #[error("message cannot be empty")]
    EmptyMessage,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, GoalError>;
