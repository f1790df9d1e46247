use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{DeploymentConfig, FeatureRecord, RawPrediction};
use crate::services::credentials::{Credentials, CredentialsError};

/// Errors that can occur when calling the Vertex AI prediction service
#[derive(Debug, Error)]
pub enum VertexError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Prediction service returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Prediction service returned no predictions")]
    EmptyPredictions,

    #[error("Authentication failed: {0}")]
    Credentials(#[from] CredentialsError),
}

/// Settings every prediction client is built from
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Replaces `https://{api_endpoint}` as the request base
    pub base_url: Option<String>,
    pub credentials: Arc<Credentials>,
}

impl ClientOptions {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            base_url: None,
            credentials: Arc::new(credentials),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Body of `PredictionService.Predict`
#[derive(Debug, Serialize)]
pub struct PredictRequest<'a, T: Serialize> {
    pub instances: &'a [T],
    pub parameters: Value,
}

/// Response of `PredictionService.Predict`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    #[serde(default)]
    pub predictions: Vec<Value>,
    #[serde(default)]
    pub deployed_model_id: Option<String>,
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Deserialize)]
struct GoogleErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Vertex AI prediction client bound to one regional API host
pub struct VertexPredictionClient {
    base_url: String,
    audience: String,
    credentials: Arc<Credentials>,
    client: Client,
}

impl VertexPredictionClient {
    /// Create a client for `api_endpoint`, e.g. `europe-west4-aiplatform.googleapis.com`
    pub fn new(api_endpoint: &str, options: &ClientOptions) -> Result<Self, VertexError> {
        let base_url = options
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}", api_endpoint));

        Ok(Self {
            base_url,
            audience: format!("https://{}/", api_endpoint),
            credentials: Arc::clone(&options.credentials),
            client: Client::builder().build()?,
        })
    }

    /// Call `:predict` on an endpoint resource name
    pub async fn predict<T: Serialize>(
        &self,
        endpoint: &str,
        instances: &[T],
        parameters: Value,
    ) -> Result<PredictResponse, VertexError> {
        let url = format!(
            "{}/v1/{}:predict",
            self.base_url.trim_end_matches('/'),
            endpoint
        );

        tracing::debug!("Sending prediction request to: {}", url);

        let request = self
            .client
            .post(&url)
            .json(&PredictRequest { instances, parameters });

        let auth_headers = self.credentials.auth_headers(&self.audience).await?;
        let response = request.headers(auth_headers).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Prediction request to {} failed: {} - {}", endpoint, status, body);
            return Err(api_error(status.as_u16(), &body));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| VertexError::InvalidResponse(format!("Failed to parse predict response: {}", e)))
    }
}

fn api_error(status: u16, body: &str) -> VertexError {
    let message = match serde_json::from_str::<GoogleErrorBody>(body) {
        Ok(parsed) => match parsed.error.status {
            Some(code) => format!("{} ({})", parsed.error.message, code),
            None => parsed.error.message,
        },
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    };

    VertexError::ApiError { status, message }
}

/// Classify one feature record with a deployed tabular model
///
/// Builds a fresh client, sends the record as the only instance with empty
/// parameters, and returns the first prediction as-is.
pub async fn predict_tabular_classification(
    deployment: &DeploymentConfig,
    features: &FeatureRecord,
    options: &ClientOptions,
) -> Result<RawPrediction, VertexError> {
    let client = VertexPredictionClient::new(deployment.api_endpoint(), options)?;
    let endpoint = deployment.endpoint_path();

    let response = client
        .predict(&endpoint, std::slice::from_ref(features), json!({}))
        .await?;

    let first = response
        .predictions
        .into_iter()
        .next()
        .ok_or(VertexError::EmptyPredictions)?;

    let prediction = match first {
        Value::Object(map) => map,
        other => {
            return Err(VertexError::InvalidResponse(format!(
                "Expected prediction object, got {}",
                other
            )))
        }
    };

    let logged = serde_json::to_string(&prediction).unwrap_or_default();
    tracing::debug!(
        deployed_model_id = response.deployed_model_id.as_deref().unwrap_or("unknown"),
        "Prediction dict: {}",
        logged
    );

    Ok(prediction)
}
