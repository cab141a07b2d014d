mod cache;
pub mod providers;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use cache::{CacheCodec, CacheError, EmbeddingCache};

/// The fixed embedding dimension used across the proxy unless configured
/// otherwise.
pub const DEFAULT_DIMENSIONS: u32 = 384;

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("empty input text")]
    EmptyInput,
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: u32, got: usize },
    #[error("embedding backend error: {0}")]
    Backend(String),
}

/// Which concrete provider produced a result — carried through so the
/// pipeline can attribute verdicts and stats correctly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Pattern,
    Hash,
    Ml,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Pattern => "pattern",
            ServiceType::Hash => "hash",
            ServiceType::Ml => "ml",
        }
    }
}

/// Result of a single embedding computation.
#[derive(Clone, Debug)]
pub struct EmbeddingResult {
    pub embedding: Vec<f32>,
    pub duration: Duration,
    pub token_count: u32,
    pub service_type: ServiceType,
    pub cache_hit: bool,
}

/// Result of a batch embedding computation.
#[derive(Clone, Debug)]
pub struct BatchEmbeddingResult {
    pub embeddings: Vec<Vec<f32>>,
    pub success: Vec<bool>,
    pub cache_hits: usize,
    pub duration: Duration,
}

/// A point-in-time snapshot of provider usage counters.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ProviderStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub errors: u64,
}

/// Atomic counters backing `ProviderStats`. Readers get a `Copy`
/// snapshot; writers never block each other on a lock — atomics give
/// the same guarantee a short write lock would, without the lock.
#[derive(Default)]
pub struct StatsCounters {
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    errors: AtomicU64,
}

impl StatsCounters {
    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
    pub fn snapshot(&self) -> ProviderStats {
        ProviderStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Capability interface shared by every embedding provider variant —
/// tagged implementations selected by configuration.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn generate(&self, text: &str) -> Result<EmbeddingResult, EmbeddingError>;
    async fn generate_batch(&self, texts: &[String]) -> Result<BatchEmbeddingResult, EmbeddingError>;
    fn compute_similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(a, b)
    }
    fn stats(&self) -> ProviderStats;
    fn dimensions(&self) -> u32;
    async fn close(&self) {}
}

/// Cosine similarity between two equal-length vectors. For unit-norm
/// vectors this equals `1 - cosine distance`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Normalize a vector in place to unit L2 norm. Every provider must
/// return unit-norm vectors.
pub fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = vec![0.6, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn orthogonal_vectors_have_similarity_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-5);
    }

    #[test]
    fn normalize_produces_unit_norm() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}
