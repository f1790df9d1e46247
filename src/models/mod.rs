// Model exports
pub mod domain;
pub mod responses;

pub use domain::{API_ENDPOINT, LOCATION, DeploymentConfig, FeatureRecord, PredictionResult, RawPrediction};
pub use responses::{ErrorResponse, PredictionResponse};
