// Request/response translation
pub mod features;
pub mod reshape;

pub use features::{extract_features, is_json_content_type};
pub use reshape::reshape_prediction;
