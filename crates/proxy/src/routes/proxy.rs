use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use sentinel_analyzer::{combine, decide, extract_prompt, PatternAnalyzer};
use sentinel_common::types::{Action, RequestContext};
use sentinel_eventhub::{Event, EventKind};

use crate::middleware::Provider;
use crate::AppState;

/// Handles every `/openai/*`, `/anthropic/*`, `/ollama/*` request: the
/// full pipeline from spec — rate limit, scrub+redact, injection
/// analysis, then streamed upstream forward.
pub async fn proxy_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path();
    let Some((provider, rest_path)) = Provider::from_path(path) else {
        return (StatusCode::NOT_FOUND, "no upstream matches this path").into_response();
    };

    let client_ip = addr.ip().to_string();
    let original_headers = header_map_to_string_map(&headers);
    let mut ctx = RequestContext::new(client_ip.clone(), original_headers);

    if state.config.security.rate_limit.enabled && !state.rate_limiter.try_acquire(&client_ip) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            axum::Json(json!({"error": "Rate limit exceeded"})),
        )
            .into_response();
    }

    let masked_body = if state.config.privacy.enabled {
        let text = String::from_utf8_lossy(&body);
        let result = state.detector.detect(&text, Default::default());
        if !result.findings.is_empty() {
            ctx.findings = result.findings.clone();
            if state.config.websocket.events.broadcast_pii_detections {
                state.event_hub.publish(Event::new(
                    EventKind::PiiDetection,
                    Some(ctx.request_id),
                    json!({
                        "request_id": ctx.request_id.to_string(),
                        "findings": result.findings,
                    }),
                ));
            }
        }
        Bytes::from(result.masked_text.into_bytes())
    } else {
        body
    };

    if state.config.security.enabled {
        if let Ok(parsed) = serde_json::from_slice::<serde_json::Value>(&masked_body) {
            if let Some(prompt) = extract_prompt(&parsed) {
                let verdict = analyze(&state, &prompt).await;
                let action = decide(&verdict, state.config.security.mode);

                if (verdict.is_malicious || verdict.confidence > 0.5)
                    && state.config.websocket.events.broadcast_vector_security
                {
                    state.event_hub.publish(Event::new(
                        EventKind::VectorSecurity,
                        Some(ctx.request_id),
                        json!({
                            "request_id": ctx.request_id.to_string(),
                            "attack_type": verdict.attack_type.as_str(),
                            "confidence": verdict.confidence,
                            "action": vector_security_action(action, verdict.is_malicious),
                        }),
                    ));
                }

                ctx.injection_verdict = Some(verdict.clone());

                if action == Action::Block {
                    return (
                        StatusCode::FORBIDDEN,
                        format!(
                            "Request blocked: {} detected (confidence: {:.1}%)",
                            verdict.attack_type.as_str(),
                            verdict.confidence * 100.0
                        ),
                    )
                        .into_response();
                }
            }
        }
    }

    let upstream_headers = state.header_scrubber.headers_for_upstream(&ctx.original_headers);

    let start = Instant::now();
    let response = forward_upstream(&state, provider, rest_path, uri.query(), method, upstream_headers, masked_body).await;
    let outcome = match response {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!(error = %e, provider = provider.name(), "upstream request failed");
            return (
                StatusCode::BAD_GATEWAY,
                axum::Json(json!({"error": format!("upstream error: {e}")})),
            )
                .into_response();
        }
    };

    let logged_headers = state.header_scrubber.scrub_for_logging(&ctx.original_headers);
    state.event_hub.publish(Event::new(
        EventKind::RequestCompletion,
        Some(ctx.request_id),
        json!({
            "request_id": ctx.request_id.to_string(),
            "provider": provider.name(),
            "status": outcome.status().as_u16(),
            "duration_ms": start.elapsed().as_millis(),
            "headers": logged_headers,
        }),
    ));

    stream_response(outcome)
}

/// Labels a vector-security event by what actually happened to the
/// request: blocked outright, forwarded despite a malicious verdict
/// (log/passthrough mode), or forwarded on a merely medium-confidence
/// signal that never crossed the malicious bar.
fn vector_security_action(action: Action, is_malicious: bool) -> &'static str {
    if action == Action::Block {
        "blocked"
    } else if is_malicious {
        "logged"
    } else {
        "forwarded"
    }
}

async fn analyze(state: &AppState, prompt: &str) -> sentinel_common::types::InjectionVerdict {
    let pattern_verdict = PatternAnalyzer::new().analyze(prompt);

    let Some(embedding_analyzer) = state.embedding_analyzer.as_ref() else {
        let threshold = state.config.security.vector_security.block_threshold;
        return sentinel_common::types::InjectionVerdict {
            is_malicious: pattern_verdict.confidence >= threshold,
            ..pattern_verdict
        };
    };

    let embedding_verdict = embedding_analyzer.analyze(prompt).await;
    combine(
        pattern_verdict,
        embedding_verdict,
        state.config.security.vector_security.block_threshold,
    )
}

async fn forward_upstream(
    state: &AppState,
    provider: Provider,
    rest_path: &str,
    query: Option<&str>,
    method: Method,
    headers: HashMap<String, String>,
    body: Bytes,
) -> Result<reqwest::Response, reqwest::Error> {
    let upstream_router = &state.upstream_router;
    let url = upstream_router.target_url(provider, rest_path, query);

    let mut request = state
        .http
        .request(method, &url)
        .timeout(upstream_router.timeout())
        .body(body.to_vec());

    let mut saw_user_agent = false;
    for (name, value) in &headers {
        if name.eq_ignore_ascii_case("host") || name.eq_ignore_ascii_case("content-length") {
            continue;
        }
        if name.eq_ignore_ascii_case("user-agent") {
            saw_user_agent = true;
        }
        request = request.header(name, value);
    }
    if !saw_user_agent {
        request = request.header("User-Agent", format!("LLM-Sentinel/{}", env!("CARGO_PKG_VERSION")));
    }

    request.send().await
}

/// Pump the upstream response chunk-wise into the client response body;
/// never buffered fully, preserving streaming semantics.
fn stream_response(upstream: reqwest::Response) -> Response {
    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut builder = Response::builder().status(status);

    for (name, value) in upstream.headers() {
        if name.as_str().eq_ignore_ascii_case("transfer-encoding") {
            continue;
        }
        builder = builder.header(name, value);
    }

    let stream = upstream.bytes_stream();
    builder
        .body(Body::from_stream(stream))
        .unwrap_or_else(|_| (StatusCode::BAD_GATEWAY, "failed to build response").into_response())
}

fn header_map_to_string_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
