use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod advisor;
mod config;
mod error;
mod extract;
mod middleware;
mod routes;
mod state;
mod store;
mod upstream;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Smart Plant Monitor",
        version = "0.1.0",
        description = "Care advice for plants from their humidity and temperature readings."
    ),
    paths(
        routes::health::health_check,
        routes::plant_status::get_plant_status,
    ),
    components(schemas(
        HealthResponse,
        routes::plant_status::PlantStatusRequest,
        plant_advisor_core::advice::StructuredAdvice,
        plant_advisor_core::error::ApiError,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plant_advisor_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = match config::AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let advisor = match advisor::from_config(&config.provider) {
        Ok(advisor) => advisor,
        Err(err) => {
            tracing::error!(error = %err, "Failed to set up AI provider");
            std::process::exit(1);
        }
    };

    // The Firestore connection opens lazily on the first request.
    let app_state = state::AppState {
        store: Arc::new(store::FirestoreStore::new(config.firestore.clone())),
        advisor: Arc::from(advisor),
        fields: Arc::new(config.fields.clone()),
    };

    let app = routes::app(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Smart Plant Monitor listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, addr = %addr, "Failed to bind");
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!(error = %err, "Server error");
        std::process::exit(1);
    }
}
