use thiserror::Error;

/// Errors raised while configuring or running the crop model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LuvaError {
    #[error("{0}")]
    Error(String),
    #[error("Integration over [{t_start}, {t_end}] s failed: {reason}")]
    IntegrationFailed {
        t_start: f64,
        t_end: f64,
        reason: String,
    },
    #[error("Invalid model state: {0}")]
    InvalidState(String),
    #[error("Invalid treatment '{name}': {reason}")]
    InvalidTreatment { name: String, reason: String },
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type for `Result<T, LuvaError>`.
pub type LuvaResult<T> = Result<T, LuvaError>;
