// storefront/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use karat::KaratError;
use serde_json::json;
use thiserror::Error;

/// Where a not-found response sends the visitor back to.
pub const CATALOG_PATH: &str = "/api/v1/catalog";

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Confirmation Required: {0}")]
  ConfirmationRequired(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Media Host Error: {0}")]
  MediaHost(String),

  #[error("Karat Workflow Error: {source}")]
  Workflow {
    #[source]
    source: KaratError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),

  /// A workflow stopped early where the handler needed it to complete.
  #[error("Pipeline execution was halted by a handler.")]
  PipelineHaltedByHandler,
}

impl From<KaratError> for AppError {
  fn from(err: KaratError) -> Self {
    match err {
      KaratError::Validation(m) => AppError::Validation(m),
      KaratError::NotFound(m) => AppError::NotFound(m),
      KaratError::ConfirmationRequired(m) => AppError::ConfirmationRequired(m),
      KaratError::MediaHost(m) => AppError::MediaHost(m),
      other => AppError::Workflow { source: other },
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Internal(other.to_string()),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> actix_web::http::StatusCode {
    use actix_web::http::StatusCode;
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::ConfirmationRequired(_) | AppError::PipelineHaltedByHandler => StatusCode::CONFLICT,
      AppError::MediaHost(_) => StatusCode::BAD_GATEWAY,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    match self {
      AppError::Validation(_) | AppError::NotFound(_) | AppError::ConfirmationRequired(_) => {
        tracing::warn!(application_error = %self, "Request rejected");
      }
      _ => tracing::error!(application_error = %self, "Responding with error"),
    }
    let mut builder = HttpResponse::build(self.status_code());
    match self {
      AppError::Validation(m) => builder.json(json!({"error": m})),
      AppError::NotFound(m) => builder.json(json!({"error": m, "back": CATALOG_PATH})),
      AppError::ConfirmationRequired(m) => builder.json(json!({"error": m, "hint": "repeat with ?confirm=true"})),
      AppError::Config(m) => builder.json(json!({"error": "Configuration issue", "detail": m})),
      AppError::Sqlx(_) => builder.json(json!({"error": "Database operation failed"})),
      AppError::MediaHost(m) => builder.json(json!({"error": "Image upload failed", "detail": m})),
      AppError::Workflow { source } => {
        tracing::error!(karat_error_source = ?source, "Workflow error details");
        builder.json(json!({"error": "Workflow processing error", "detail": source.to_string()}))
      }
      AppError::Internal(m) => builder.json(json!({"error": "An internal error occurred", "detail": m})),
      AppError::PipelineHaltedByHandler => {
        builder.json(json!({"error": "Process halted before completion."}))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
