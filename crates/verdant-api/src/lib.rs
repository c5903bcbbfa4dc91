pub mod dashboard;
pub mod gallery;
pub mod metrics;
pub mod readings;
pub mod state;
pub mod upload;
pub mod weather;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use state::{AppState, AppStateInner, Settings};

/// Full HTTP surface of the station server.
pub fn router(state: AppState) -> Router {
    let artifacts = ServeDir::new(state.uploads.output_dir());
    let body_limit = state.settings.max_body_bytes;

    Router::new()
        .route("/", get(dashboard::index))
        .route("/health", get(health))
        .route("/api/data", post(readings::receive_data))
        .route("/api/latest", get(readings::latest))
        .route("/api/table-data", get(readings::table_data))
        .route("/api/chart-data", get(readings::chart_data))
        .route("/api/upload", post(upload::upload_part))
        .route("/api/gallery", get(gallery::gallery))
        .route("/api/weather", get(weather::get_weather))
        .nest_service("/uploads", artifacts)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health: liveness check.
pub async fn health() -> &'static str {
    "ok"
}
