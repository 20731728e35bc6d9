// core/src/error.rs

use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Framework-level failures. Application error types embed these via a
/// `From<FlowError>` impl so that setup and dispatch problems surface through
/// the same error channel as business failures.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("step not found: {step}")]
  StepNotFound { step: String },

  #[error("handler missing for required step: {step}")]
  HandlerMissing { step: String },

  #[error("context extraction failed for step '{step}': {source}")]
  ExtractFailure {
    step: String,
    #[source]
    source: AnyhowError,
  },

  #[error("branch workflow could not be built for step '{step}': {source}")]
  BranchBuildFailure {
    step: String,
    #[source]
    source: AnyhowError,
  },

  #[error("context type mismatch (expected {expected}) during {step}")]
  ContextMismatch { step: String, expected: String },

  #[error("no branch condition matched for step '{step}'")]
  NoBranchMatched { step: String },

  #[error("setup error for '{step}': {message}")]
  Setup { step: String, message: String },

  #[error("error in user-provided handler: {source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },

  #[error("internal flywheel error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    FlowError::Handler { source: err }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
