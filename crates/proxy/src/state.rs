use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use sentinel_analyzer::EmbeddingAnalyzer;
use sentinel_common::config::ProxyConfig;
use sentinel_eventhub::EventHub;
use sentinel_ratelimit::IpRateLimiter;
use sentinel_redaction::{Detector, HeaderScrubber};

use crate::middleware::UpstreamRouter;

/// Shared application state, handed to every axum handler behind an `Arc`.
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub detector: Arc<Detector>,
    pub header_scrubber: Arc<HeaderScrubber>,
    pub embedding_analyzer: Option<Arc<EmbeddingAnalyzer>>,
    pub rate_limiter: Arc<IpRateLimiter>,
    pub event_hub: Arc<EventHub>,
    pub upstream_router: UpstreamRouter,
    pub http: reqwest::Client,
    pub metrics_handle: PrometheusHandle,
    pub started_at: chrono::DateTime<chrono::Utc>,
}
