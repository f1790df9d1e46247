use actix_web::{http::header, web, HttpMessage, HttpRequest, HttpResponse};
use std::sync::Arc;
use tracing::Instrument;

use crate::core::{extract_features, is_json_content_type, reshape_prediction};
use crate::error::PredictError;
use crate::models::{DeploymentConfig, ErrorResponse, PredictionResponse};
use crate::services::Predictor;

/// Default request body cap, in bytes
pub const DEFAULT_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub deployment: DeploymentConfig,
    pub predictor: Arc<dyn Predictor>,
    pub body_limit: usize,
}

impl AppState {
    pub fn new(deployment: DeploymentConfig, predictor: Arc<dyn Predictor>) -> Self {
        Self {
            deployment,
            predictor,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }
}

/// Configure prediction routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/predict")
            .route(web::post().to(predict))
            .default_service(web::to(method_not_allowed)),
    );
}

async fn method_not_allowed(req: HttpRequest) -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .insert_header((header::ALLOW, "POST"))
        .json(ErrorResponse::new(format!(
            "Method {} not allowed on {}",
            req.method(),
            req.path()
        )))
}

/// Classify a penguin specimen
///
/// POST /predict
///
/// Request body:
/// ```json
/// {
///   "culmen_length_mm": 45.1,
///   "culmen_depth_mm": 14.5,
///   "flipper_length_mm": 210,
///   "body_mass_g": 4750
/// }
/// ```
///
/// Every failure is reported as `{"status": "error", "message": "..."}`.
async fn predict(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse, PredictError> {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("predict", %request_id);

    let result = run_prediction(&state, &req, payload)
        .instrument(span.clone())
        .await;

    span.in_scope(|| match &result {
        Ok(_) => tracing::info!("Prediction succeeded"),
        Err(e) => tracing::warn!(kind = ?e.kind(), "Prediction failed: {}", e),
    });

    let prediction = result?;
    Ok(HttpResponse::Ok().json(prediction))
}

async fn run_prediction(
    state: &AppState,
    req: &HttpRequest,
    payload: web::Payload,
) -> Result<PredictionResponse, PredictError> {
    let content_type = req.content_type();
    if !is_json_content_type(content_type) {
        return Err(PredictError::Input(format!(
            "Unsupported content type '{}', expected application/json",
            content_type
        )));
    }

    let body = read_body(payload, state.body_limit).await?;
    let features = extract_features(&body)?;
    tracing::debug!("Extracted features: {:?}", features);

    if !state.deployment.is_complete() {
        return Err(PredictError::Configuration);
    }

    let raw = state.predictor.predict(&state.deployment, &features).await?;
    let prediction = reshape_prediction(raw)?;

    Ok(PredictionResponse::success(prediction))
}

/// Buffer the request body, rejecting it once it grows past `limit`
async fn read_body(payload: web::Payload, limit: usize) -> Result<web::Bytes, PredictError> {
    match payload.to_bytes_limited(limit).await {
        Ok(Ok(body)) => Ok(body),
        Ok(Err(e)) => Err(PredictError::Input(format!("Failed to read request body: {}", e))),
        Err(_) => Err(PredictError::Input(format!(
            "Request body exceeds the {} byte limit",
            limit
        ))),
    }
}
