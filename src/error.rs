use thiserror::Error;

/// Failures raised by the grade aggregator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregateError {
    #[error("no subjects recorded, cannot average period {period}")]
    InvalidInput { period: i32 },
}

/// Rejections raised while ingesting grade entries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntryError {
    #[error("entry {id}: score {score} is outside 0.0..=5.0")]
    ScoreOutOfRange { id: String, score: f64 },
    #[error("entry {id}: weight {weight} must be greater than zero")]
    NonPositiveWeight { id: String, weight: f64 },
    #[error("entry {id}: period {period} must be 1 or greater")]
    InvalidPeriod { id: String, period: i32 },
    #[error("entry {id}: subject is empty")]
    EmptySubject { id: String },
    #[error("unknown assessment type '{0}'")]
    UnknownAssessmentType(String),
}
