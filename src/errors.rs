// errors.rs
use astra::Response;
use thiserror::Error;

/// Errors originating from either the server logic
/// (routing, validation, missing resources) or downstream layers (DB).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// A required identifier was missing. Raised before touching the store.
    #[error("Validation Error: {0}")]
    Validation(String),
    #[error("Database Error: {0}")]
    DbError(String),
    #[error("Internal Server Error")]
    InternalError,
}

impl ServerError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::NotFound => 404,
            ServerError::BadRequest(_) | ServerError::Validation(_) => 400,
            ServerError::DbError(_) | ServerError::InternalError => 500,
        }
    }
}

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        ServerError::DbError(e.to_string())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(e: serde_json::Error) -> Self {
        ServerError::DbError(format!("document decode failed: {e}"))
    }
}

// Type alias commonly used by route handlers.
pub type ResultResp = Result<Response, ServerError>;
