use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

/// `GET /info` — non-sensitive posture: name, version, whether privacy
/// and security stages are enabled, and the active detector count.
pub async fn info_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "name": "llm-sentinel",
        "version": env!("CARGO_PKG_VERSION"),
        "privacy_enabled": state.config.privacy.enabled,
        "security_enabled": state.config.security.enabled,
        "security_mode": match state.config.security.mode {
            sentinel_common::types::SecurityMode::Block => "block",
            sentinel_common::types::SecurityMode::Log => "log",
            sentinel_common::types::SecurityMode::Passthrough => "passthrough",
        },
        "detector_count": state.detector.active_count(),
    }))
}
