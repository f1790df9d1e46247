use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// Region the model is deployed in
pub const LOCATION: &str = "europe-west4";
/// Regional Vertex AI API host
pub const API_ENDPOINT: &str = "europe-west4-aiplatform.googleapis.com";

/// Measurements describing one penguin specimen
///
/// Values are kept exactly as the caller sent them. A field the caller left
/// out is `null` and is forwarded that way; the model decides what to do
/// with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(default)]
    pub culmen_length_mm: Value,
    #[serde(default)]
    pub culmen_depth_mm: Value,
    #[serde(default)]
    pub flipper_length_mm: Value,
    #[serde(default)]
    pub body_mass_g: Value,
}

/// Addressing information for the deployed model
///
/// Only the project and endpoint ids are configurable. Region and API host
/// are fixed to [`LOCATION`] and [`API_ENDPOINT`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
pub struct DeploymentConfig {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub project_id: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub endpoint_id: String,
}

impl DeploymentConfig {
    pub fn new(project_id: impl Into<String>, endpoint_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            endpoint_id: endpoint_id.into(),
        }
    }

    pub fn location(&self) -> &'static str {
        LOCATION
    }

    pub fn api_endpoint(&self) -> &'static str {
        API_ENDPOINT
    }

    /// True when both identifiers are set
    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    /// Fully-qualified endpoint resource name
    pub fn endpoint_path(&self) -> String {
        format!(
            "projects/{}/locations/{}/endpoints/{}",
            urlencoding::encode(&self.project_id),
            urlencoding::encode(self.location()),
            urlencoding::encode(&self.endpoint_id),
        )
    }
}

/// First prediction returned by the remote service, keys untouched
pub type RawPrediction = Map<String, Value>;

/// Labels and their confidence scores, index-aligned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub classes: Vec<Value>,
    pub scores: Vec<Value>,
}
