use serde::{Deserialize, Serialize};
use crate::models::domain::PredictionResult;

/// Successful prediction envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub status: String,
    pub prediction: PredictionResult,
}

impl PredictionResponse {
    pub fn success(prediction: PredictionResult) -> Self {
        Self {
            status: "success".to_string(),
            prediction,
        }
    }
}

/// Error envelope, used for every failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}
