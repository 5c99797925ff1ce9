use std::path::PathBuf;

use estimator_api::api::{FitError, PredictError};

pub type Result<T> = std::result::Result<T, RuleListError>;

#[derive(Debug, thiserror::Error)]
pub enum RuleListError {
    #[error("unknown label mode {0:?}, expected \"label\" or \"prob\"")]
    UnknownLabelMode(String),

    #[error("invalid alpha: {reason}")]
    InvalidAlpha { reason: String },

    #[error("malformed rule string {rule:?}: {reason}")]
    MalformedRule { rule: String, reason: String },

    #[error("malformed itemset item {item:?}: {reason}")]
    MalformedItem { item: String, reason: String },

    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The rules did not partition the instances. Indicates a missing or
    /// misplaced default rule, never bad user input.
    #[error("support total {caught} does not equal the number of instances {n_instances}")]
    SupportMismatch { caught: usize, n_instances: usize },

    #[error("rule id {id} is outside the candidate pool of size {pool_size}")]
    UnknownRuleId { id: usize, pool_size: usize },

    #[error("invalid rule list: {reason}")]
    InvalidRuleList { reason: String },

    #[error("shape mismatch: {reason}")]
    Shape { reason: String },

    #[error("malformed encoded file: {reason}")]
    Format { reason: String },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("trainer failed: {reason}")]
    Trainer { reason: String },

    #[error("rule list is not fitted")]
    NotFitted,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
}

impl RuleListError {
    pub(crate) fn shape(reason: impl Into<String>) -> Self {
        RuleListError::Shape {
            reason: reason.into(),
        }
    }

    pub(crate) fn format(reason: impl Into<String>) -> Self {
        RuleListError::Format {
            reason: reason.into(),
        }
    }
}

impl From<RuleListError> for FitError {
    fn from(err: RuleListError) -> Self {
        match err {
            RuleListError::Trainer { reason } => FitError::Training(reason),
            RuleListError::SupportMismatch { .. } => FitError::Numerical(err.to_string()),
            other => FitError::InvalidInput(other.to_string()),
        }
    }
}

impl From<RuleListError> for PredictError {
    fn from(err: RuleListError) -> Self {
        match err {
            RuleListError::NotFitted => PredictError::NotFitted,
            RuleListError::Shape { .. } | RuleListError::Polars(_) => {
                PredictError::InvalidInput(err.to_string())
            }
            other => PredictError::Unknown(other.to_string()),
        }
    }
}
