use serde_json::Value;

use crate::error::PredictError;
use crate::models::FeatureRecord;

/// Whether a `Content-Type` value names a JSON payload
///
/// Accepts `application/json` and structured-syntax types such as
/// `application/problem+json`. Parameters after `;` are ignored.
pub fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// Build a [`FeatureRecord`] from a raw request body
///
/// The body has to be a JSON object. Unknown keys are ignored, missing ones
/// become `null`, and values are not coerced.
pub fn extract_features(body: &[u8]) -> Result<FeatureRecord, PredictError> {
    let parsed: Value = serde_json::from_slice(body)
        .map_err(|e| PredictError::Input(format!("Failed to decode JSON body: {}", e)))?;

    let Value::Object(mut fields) = parsed else {
        return Err(PredictError::Input(
            "Request body must be a JSON object".to_string(),
        ));
    };

    let mut take = |name: &str| fields.remove(name).unwrap_or(Value::Null);

    Ok(FeatureRecord {
        culmen_length_mm: take("culmen_length_mm"),
        culmen_depth_mm: take("culmen_depth_mm"),
        flipper_length_mm: take("flipper_length_mm"),
        body_mass_g: take("body_mass_g"),
    })
}
