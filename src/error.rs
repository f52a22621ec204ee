use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Caller-supplied value was rejected; nothing was changed.
    #[error("{0}")]
    Validation(String),

    /// Mutation target could not be found and none was synthesized.
    #[error("{0}")]
    NotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// A blocking task was cancelled or panicked.
    #[error("background task failed: {0}")]
    Blocking(String),
}

impl EngineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        EngineError::Parse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<actix_web::error::BlockingError> for EngineError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        EngineError::Blocking(e.to_string())
    }
}

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let reason = match self {
            EngineError::Validation(_) | EngineError::NotFound(_) => self.to_string(),
            _ => {
                tracing::error!(error = %self, "Request failed");
                "Internal Server Error".to_string()
            }
        };
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": reason
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_errors_keep_their_reason() {
        let e = EngineError::Validation("Invalid record index".into());
        assert_eq!(e.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            EngineError::NotFound("gone".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn internal_errors_are_opaque() {
        let e = EngineError::parse("/data/2025-01-07.json", "expected a list");
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(e.to_string().contains("2025-01-07.json"));
    }
}
