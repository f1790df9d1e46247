use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use penguin_gateway::config::{LoggingSettings, Settings};
use penguin_gateway::routes::{self, AppState};
use penguin_gateway::services::{ClientOptions, Credentials, VertexPredictor};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Load `.env`, letting its values win over the inherited environment
fn load_dotenv() {
    if let Ok(entries) = dotenv::dotenv_iter() {
        for (key, value) in entries.flatten() {
            std::env::set_var(key, value);
        }
    }
}

fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "compact" => subscriber.compact().init(),
        _ => subscriber.init(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    load_dotenv();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing(&LoggingSettings::default());
            error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    init_tracing(&settings.logging);

    info!("Starting penguin prediction gateway...");
    info!("PROJECT_ID: {}", settings.deployment.project_id);
    info!("ENDPOINT_ID: {}", settings.deployment.endpoint_id);

    if !settings.deployment.is_complete() {
        warn!("PROJECT_ID or ENDPOINT_ID is not set, every prediction request will be rejected");
    }

    let credentials = Credentials::resolve(
        settings.vertex.credentials_file.as_deref(),
        settings.vertex.access_token.as_deref(),
        settings.vertex.disable_auth,
    )
    .map_err(|e| {
        error!("Failed to load Google credentials: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!("Using {} credentials for Vertex AI", credentials.describe());

    let mut options = ClientOptions::new(credentials);
    if let Some(base_url) = settings.vertex.base_url.clone() {
        info!("Overriding prediction API base URL: {}", base_url);
        options = options.with_base_url(base_url);
    }

    let app_state = AppState::new(
        settings.deployment.clone(),
        Arc::new(VertexPredictor::new(options)),
    )
    .with_body_limit(settings.server.max_body_bytes);

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
