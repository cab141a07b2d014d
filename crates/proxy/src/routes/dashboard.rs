use axum::response::{Html, IntoResponse};

/// `GET /` and `GET /dashboard` — the dashboard UI itself is an external
/// collaborator out of scope; this serves a minimal static placeholder
/// rather than a real UI.
pub async fn dashboard_handler() -> impl IntoResponse {
    Html(
        "<!doctype html><html><head><title>LLM Sentinel</title></head>\
         <body><h1>LLM Sentinel</h1><p>Proxy is running. See /health, /info, /metrics, /ws.</p>\
         </body></html>",
    )
}
