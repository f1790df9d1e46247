//! Penguin Gateway - HTTP front end for a Vertex AI penguin species classifier
//!
//! Accepts culmen, flipper and body mass measurements, forwards them to a
//! deployed tabular classification model and returns its class labels and
//! scores in a stable envelope.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use error::{ErrorKind, PredictError};
pub use models::{DeploymentConfig, FeatureRecord, PredictionResponse, PredictionResult, ErrorResponse};
pub use routes::{configure_routes, AppState};
pub use services::{ClientOptions, Credentials, Predictor, VertexPredictor};
