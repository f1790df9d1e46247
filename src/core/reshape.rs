use serde_json::Value;

use crate::error::PredictError;
use crate::models::{PredictionResult, RawPrediction};

/// Pull `classes` and `scores` out of a raw prediction
///
/// `classes` is checked first, so a result missing both reports `classes`.
/// Any other keys the model returns are dropped.
pub fn reshape_prediction(mut raw: RawPrediction) -> Result<PredictionResult, PredictError> {
    let classes = take_sequence(&mut raw, "classes")?;
    let scores = take_sequence(&mut raw, "scores")?;

    Ok(PredictionResult { classes, scores })
}

fn take_sequence(raw: &mut RawPrediction, key: &'static str) -> Result<Vec<Value>, PredictError> {
    match raw.remove(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(PredictError::NotASequence(key)),
        None => Err(PredictError::MissingKey(key)),
    }
}
