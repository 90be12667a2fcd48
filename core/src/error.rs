// karat/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KaratError {
  /// Missing required field, duplicate name, oversized or wrong-type file.
  #[error("Validation failed: {0}")]
  Validation(String),

  #[error("Not found: {0}")]
  NotFound(String),

  /// Destructive operations are refused unless the caller confirmed them.
  #[error("Confirmation required: {0}")]
  ConfirmationRequired(String),

  #[error("Data store operation failed. Source: {source}")]
  Store {
    #[source]
    source: AnyhowError,
  },

  #[error("Media host rejected the upload: {0}")]
  MediaHost(String),

  #[error("Local store error: {0}")]
  LocalStore(String),

  // --- Workflow engine ---
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("No workflow registered for context type {context_type}")]
  WorkflowNotRegistered { context_type: String },

  #[error("Internal karat error: {0}")]
  Internal(String),
}

impl KaratError {
  pub fn validation(message: impl Into<String>) -> Self {
    KaratError::Validation(message.into())
  }

  pub fn store(err: impl Into<AnyhowError>) -> Self {
    KaratError::Store { source: err.into() }
  }

  /// Validation-class errors are shown inline and leave no partial effect.
  pub fn is_validation(&self) -> bool {
    matches!(self, KaratError::Validation(_))
  }
}

impl From<serde_json::Error> for KaratError {
  fn from(err: serde_json::Error) -> Self {
    KaratError::LocalStore(format!("malformed stored value: {}", err))
  }
}

pub type KaratResult<T, E = KaratError> = std::result::Result<T, E>;
