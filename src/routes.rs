use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::handlers;
use crate::state::AppState;
use crate::websocket;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Translation API
        .route("/translate", post(handlers::translate))
        .route("/translate/stream", post(handlers::translate_stream))
        .route("/list-languages", get(handlers::list_languages))
        // WebSocket
        .route("/ws/stream/:client_id", get(websocket::websocket_handler))
        // Health check
        .route("/api/health", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let translator_healthy = state.translator.health_check().await;
    Json(json!({
        "status": "ok",
        "translator": translator_healthy,
        "connections": state.registry.connection_count().await,
    }))
}
