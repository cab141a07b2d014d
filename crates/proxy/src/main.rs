use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::{any, get};
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;

use sentinel_analyzer::EmbeddingAnalyzer;
use sentinel_common::config::{ProxyConfig, RetryConfig, ServiceType};
use sentinel_eventhub::EventHub;
use sentinel_ratelimit::IpRateLimiter;
use sentinel_redaction::{Detector, HeaderScrubber};
use sentinel_vectorstore::VectorStore;

use sentinel_proxy::{config, middleware, routes, AppState};

#[tokio::main]
async fn main() {
    let log_format = std::env::var("SENTINEL_LOG_FORMAT").unwrap_or_else(|_| "json".into());
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    if log_format == "console" {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    }

    tracing::info!("LLM Sentinel starting");

    let config_path = std::env::var("SENTINEL_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config/sentinel.yaml"));

    let config = match config::load_config(&config_path) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration, refusing to start");
            std::process::exit(1);
        }
    };

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus metrics recorder");

    let detector = match Detector::build(&config.privacy.detectors, &[], Duration::from_millis(50)) {
        Ok(detector) => Arc::new(detector),
        Err(e) => {
            tracing::error!(error = %e, "failed to compile redaction rules, refusing to start");
            std::process::exit(1);
        }
    };

    let header_scrubber = Arc::new(HeaderScrubber::new(
        &config.privacy.header_scrubbing.headers,
        config.privacy.header_scrubbing.preserve_upstream_auth,
    ));

    let event_hub = Arc::new(EventHub::new());

    let rate_limiter = Arc::new(IpRateLimiter::new(
        config.security.rate_limit.requests_per_min,
        config.security.rate_limit.burst_limit,
    ));
    tokio::spawn(Arc::clone(&rate_limiter).run_idle_sweeper(Duration::from_secs(60)));

    let embedding_analyzer = if config.security.vector_security.enabled {
        Some(Arc::new(build_embedding_analyzer(&config).await))
    } else {
        None
    };

    let upstream_router = middleware::UpstreamRouter::new(&config.upstream);

    let http = reqwest::Client::builder()
        .build()
        .expect("failed to build HTTP client");

    let port = config.server.port;

    let state = Arc::new(AppState {
        config,
        detector,
        header_scrubber,
        embedding_analyzer,
        rate_limiter,
        event_hub,
        upstream_router,
        http,
        metrics_handle,
        started_at: chrono::Utc::now(),
    });

    let app = Router::new()
        .route("/health", get(routes::health_handler))
        .route("/info", get(routes::info_handler))
        .route("/", get(routes::dashboard_handler))
        .route("/dashboard", get(routes::dashboard_handler))
        .route("/ws", get(routes::ws_handler))
        .route("/metrics", get(metrics_handler))
        .route("/openai/{*path}", any(routes::proxy_handler))
        .route("/anthropic/{*path}", any(routes::proxy_handler))
        .route("/ollama/{*path}", any(routes::proxy_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("failed to bind TCP listener");

    tracing::info!(port, "LLM Sentinel listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("HTTP server error");
}

async fn build_embedding_analyzer(config: &ProxyConfig) -> EmbeddingAnalyzer {
    let vs_config = &config.security.vector_security;

    let store = match VectorStore::connect(&vs_config.database.database_url, vs_config.database.max_connections).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to vector store, refusing to start");
            std::process::exit(1);
        }
    };
    if let Err(e) = store.migrate().await {
        tracing::error!(error = %e, "failed to run vector store migrations, refusing to start");
        std::process::exit(1);
    }
    if let Err(e) = store.create_index(vs_config.database.ann_index_threshold).await {
        tracing::warn!(error = %e, "failed to build ANN index, continuing without it");
    }

    let provider: Arc<dyn sentinel_embeddings::EmbeddingProvider> = match vs_config.service_type {
        ServiceType::Pattern => Arc::new(sentinel_embeddings::providers::PatternProvider::new(vs_config.embedding.dimensions)),
        ServiceType::Hash => Arc::new(sentinel_embeddings::providers::HashProvider::new(vs_config.embedding.dimensions)),
        ServiceType::Ml => {
            tracing::warn!("ml service_type requires an inference backend this build doesn't ship; falling back to hash");
            Arc::new(sentinel_embeddings::providers::HashProvider::new(vs_config.embedding.dimensions))
        }
    };

    let cache = if vs_config.embedding.redis_enabled {
        match sentinel_embeddings::EmbeddingCache::connect(
            vs_config.embedding.dimensions,
            "sentinel",
            Duration::from_secs(vs_config.embedding.cache_ttl_seconds),
            &vs_config.embedding.redis_url,
        )
        .await
        {
            Ok(cache) => cache,
            Err(e) => {
                tracing::error!(error = %e, "failed to connect to embedding cache, refusing to start");
                std::process::exit(1);
            }
        }
    } else {
        sentinel_embeddings::EmbeddingCache::disabled(
            vs_config.embedding.dimensions,
            "sentinel",
            Duration::from_secs(vs_config.embedding.cache_ttl_seconds),
        )
    };

    if let Err(e) = cache
        .check_namespace_consistency("sentinel-startup-probe", vs_config.embedding.allow_legacy_cache_keys)
        .await
    {
        tracing::error!(error = %e, "embedding cache namespace check failed, refusing to start");
        std::process::exit(1);
    }

    EmbeddingAnalyzer::new(
        provider,
        Arc::new(store),
        Arc::new(cache),
        RetryConfig::default(),
        vs_config.block_threshold,
        vs_config.max_batch_size as i64,
    )
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}
