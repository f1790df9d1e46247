use actix_web::{error, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::services::VertexError;

/// Broad category of a failed prediction request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Deployment identifiers missing
    Configuration,
    /// Anything that went wrong talking to the prediction service
    RemoteService,
    /// Prediction came back without the expected fields
    Shape,
    /// Request body could not be read as a JSON object
    Input,
}

impl ErrorKind {
    /// HTTP status sent to the client for this kind of failure
    ///
    /// Every kind currently maps to 400 Bad Request, upstream outages included.
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::Configuration => StatusCode::BAD_REQUEST,
            ErrorKind::RemoteService => StatusCode::BAD_REQUEST,
            ErrorKind::Shape => StatusCode::BAD_REQUEST,
            ErrorKind::Input => StatusCode::BAD_REQUEST,
        }
    }
}

/// Errors surfaced by the `/predict` endpoint
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("PROJECT_ID and ENDPOINT_ID must be set in environment variables")]
    Configuration,

    #[error(transparent)]
    RemoteService(#[from] VertexError),

    #[error("Prediction result is missing '{0}'")]
    MissingKey(&'static str),

    #[error("Prediction result field '{0}' is not a list")]
    NotASequence(&'static str),

    #[error("{0}")]
    Input(String),
}

impl PredictError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictError::Configuration => ErrorKind::Configuration,
            PredictError::RemoteService(_) => ErrorKind::RemoteService,
            PredictError::MissingKey(_) | PredictError::NotASequence(_) => ErrorKind::Shape,
            PredictError::Input(_) => ErrorKind::Input,
        }
    }
}

impl error::ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.to_string()))
    }
}
