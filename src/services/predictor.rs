use async_trait::async_trait;

use crate::models::{DeploymentConfig, FeatureRecord, RawPrediction};
use crate::services::vertex::{predict_tabular_classification, ClientOptions, VertexError};

/// Anything that can turn a feature record into a raw prediction
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(
        &self,
        deployment: &DeploymentConfig,
        features: &FeatureRecord,
    ) -> Result<RawPrediction, VertexError>;
}

/// [`Predictor`] backed by a Vertex AI endpoint
#[derive(Debug, Clone, Default)]
pub struct VertexPredictor {
    options: ClientOptions,
}

impl VertexPredictor {
    pub fn new(options: ClientOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Predictor for VertexPredictor {
    async fn predict(
        &self,
        deployment: &DeploymentConfig,
        features: &FeatureRecord,
    ) -> Result<RawPrediction, VertexError> {
        predict_tabular_classification(deployment, features, &self.options).await
    }
}
