use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

/// `GET /health` — liveness plus per-dependency health, generalized from
/// the engine workspace's `health_handler` (neo4j+postgres+redis) to
/// postgres+redis+embedding-backend.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let vector_store_ok = match state.embedding_analyzer.as_ref() {
        Some(analyzer) => analyzer.store_health_check().await,
        None => true,
    };

    let status = if vector_store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if vector_store_ok { "healthy" } else { "unhealthy" },
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "services": {
                "vector_store": if vector_store_ok { "healthy" } else { "unhealthy" },
            }
        })),
    )
}
