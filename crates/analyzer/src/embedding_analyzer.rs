use std::sync::Arc;
use std::time::Instant;

use sentinel_common::circuit_breaker::CircuitBreaker;
use sentinel_common::config::RetryConfig;
use sentinel_common::types::{AttackType, InjectionVerdict};
use sentinel_embeddings::{EmbeddingCache, EmbeddingProvider};
use sentinel_vectorstore::VectorStore;

/// Embedding-and-similarity half of the analyzer. Consults the cache,
/// falls back to the provider with bounded retry, then searches the
/// vector store for the nearest known prompt. Either dependency being
/// down degrades to a non-malicious verdict rather than failing the
/// request — this path is advisory, the pattern analyzer is the floor.
pub struct EmbeddingAnalyzer {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<VectorStore>,
    cache: Arc<EmbeddingCache>,
    retry: RetryConfig,
    embedding_breaker: CircuitBreaker,
    store_breaker: CircuitBreaker,
    threshold: f32,
    search_limit: i64,
}

impl EmbeddingAnalyzer {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<VectorStore>,
        cache: Arc<EmbeddingCache>,
        retry: RetryConfig,
        threshold: f32,
        search_limit: i64,
    ) -> Self {
        Self {
            provider,
            store,
            cache,
            retry,
            embedding_breaker: CircuitBreaker::new("embedding_provider", 3, 30),
            store_breaker: CircuitBreaker::new("vector_store", 3, 30),
            threshold,
            search_limit,
        }
    }

    pub async fn store_health_check(&self) -> bool {
        self.store.health_check().await.is_ok()
    }

    pub async fn analyze(&self, text: &str) -> InjectionVerdict {
        let start = Instant::now();

        let embedding = match self.embedding_for(text).await {
            Some(v) => v,
            None => return passthrough_verdict(start),
        };

        if !self.store_breaker.allow() {
            return passthrough_verdict(start);
        }

        match self.store.find_similar(&embedding, self.search_limit).await {
            Ok(matches) => {
                self.store_breaker.record_success();
                let best = matches
                    .into_iter()
                    .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

                match best {
                    Some((vector, score)) if vector.attack_type != AttackType::Safe => {
                        InjectionVerdict {
                            is_malicious: score >= self.threshold,
                            attack_type: vector.attack_type,
                            confidence: score,
                            similarity_score: score,
                            matched_text: None,
                            processing_time: start.elapsed(),
                        }
                    }
                    _ => passthrough_verdict(start),
                }
            }
            Err(e) => {
                self.store_breaker.record_failure();
                tracing::warn!(error = %e, "vector store search failed, degrading to safe");
                passthrough_verdict(start)
            }
        }
    }

    async fn embedding_for(&self, text: &str) -> Option<Vec<f32>> {
        if let Some(cached) = self.cache.get(text).await {
            return Some(cached);
        }

        if !self.embedding_breaker.allow() {
            return None;
        }

        let mut attempt = 0u32;
        let mut backoff_ms = self.retry.initial_backoff_ms;
        loop {
            attempt += 1;
            match self.provider.generate(text).await {
                Ok(result) => {
                    self.embedding_breaker.record_success();
                    let cache = self.cache.clone();
                    let normalized = text.to_string();
                    let embedding = result.embedding.clone();
                    tokio::spawn(async move {
                        cache.set(&normalized, &embedding).await;
                    });
                    return Some(result.embedding);
                }
                Err(e) => {
                    if attempt >= self.retry.max_attempts {
                        self.embedding_breaker.record_failure();
                        tracing::warn!(error = %e, attempt, "embedding provider exhausted retries");
                        return None;
                    }
                    tracing::warn!(error = %e, attempt, wait_ms = backoff_ms, "embedding provider error, retrying");
                    tokio::time::sleep(std::time::Duration::from_millis(backoff_ms)).await;
                    backoff_ms = ((backoff_ms as f64) * self.retry.backoff_multiplier) as u64;
                    backoff_ms = backoff_ms.min(self.retry.max_backoff_ms);
                }
            }
        }
    }
}

fn passthrough_verdict(start: Instant) -> InjectionVerdict {
    InjectionVerdict {
        is_malicious: false,
        attack_type: AttackType::Safe,
        confidence: 0.0,
        similarity_score: 0.0,
        matched_text: None,
        processing_time: start.elapsed(),
    }
}
