pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{Router, routing::get};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let session_routes = Router::new()
        .route("/", get(routes::session::list))
        .route("/{session_id}", get(routes::session::get));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/session", session_routes)
        .route(
            "/ws/captions/{session_id}/{role}",
            get(ws::handler::caption_upgrade),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
