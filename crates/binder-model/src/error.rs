use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid criteria: {0}")]
    CriteriaInvalid(String),

    #[error("unknown cluster status: {0}")]
    UnknownClusterStatus(String),

    #[error("unknown command status: {0}")]
    UnknownCommandStatus(String),

    #[error("unknown application status: {0}")]
    UnknownApplicationStatus(String),

    #[error("invalid model: {0}")]
    Invalid(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
