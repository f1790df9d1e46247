// Route exports
pub mod predict;

use actix_web::web;

pub use predict::{AppState, DEFAULT_BODY_LIMIT};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(predict::configure);
}
