// Service exports
pub mod credentials;
pub mod predictor;
pub mod vertex;

pub use credentials::{Claims, Credentials, CredentialsError, ServiceAccountCredentials};
pub use predictor::{Predictor, VertexPredictor};
pub use vertex::{predict_tabular_classification, ClientOptions, VertexError, VertexPredictionClient};
