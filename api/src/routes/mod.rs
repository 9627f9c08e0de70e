use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware;
use crate::state::AppState;

pub mod health;
pub mod plant_status;

/// Every route with tracing and CORS applied.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(plant_status::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::cors::build_cors_layer()),
        )
        .with_state(state)
}
