use std::time::Instant;

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use sha2::{Digest, Sha256};

use crate::providers::ATTACK_KEYWORDS;
use crate::{
    normalize, BatchEmbeddingResult, EmbeddingError, EmbeddingProvider, EmbeddingResult,
    ProviderStats, ServiceType, StatsCounters,
};

const KEYWORD_BOOST: f32 = 0.15;

/// Embedding provider built on a digest-seeded PRNG stream: the same
/// text always produces the same digest, the same digest always seeds
/// the same stream, so identical input yields a byte-identical vector
/// with no state and no network call. A small fixed boost is added
/// along keyword-dependent dimensions so attack-related text clusters
/// together even without a real model.
pub struct HashProvider {
    dimensions: u32,
    stats: StatsCounters,
}

impl HashProvider {
    pub fn new(dimensions: u32) -> Self {
        Self {
            dimensions,
            stats: StatsCounters::default(),
        }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let digest = Sha256::digest(text.as_bytes());
        let seed: [u8; 32] = digest.into();
        let mut rng = StdRng::from_seed(seed);

        let dims = self.dimensions as usize;
        let mut v: Vec<f32> = (0..dims).map(|_| rng.gen_range(-1.0f32..1.0)).collect();

        let lower = text.to_lowercase();
        for keyword in ATTACK_KEYWORDS {
            if lower.contains(keyword) {
                let slot = keyword_dimension(keyword, dims);
                v[slot] += KEYWORD_BOOST;
            }
        }

        normalize(&mut v);
        v
    }
}

fn keyword_dimension(keyword: &str, dims: usize) -> usize {
    let digest = Sha256::digest(keyword.as_bytes());
    let mut acc: u64 = 0;
    for byte in digest.iter().take(8) {
        acc = (acc << 8) | *byte as u64;
    }
    (acc as usize) % dims.max(1)
}

#[async_trait]
impl EmbeddingProvider for HashProvider {
    async fn generate(&self, text: &str) -> Result<EmbeddingResult, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        self.stats.record_request();
        let start = Instant::now();
        let embedding = self.embed(text);
        Ok(EmbeddingResult {
            embedding,
            duration: start.elapsed(),
            token_count: text.split_whitespace().count() as u32,
            service_type: ServiceType::Hash,
            cache_hit: false,
        })
    }

    async fn generate_batch(
        &self,
        texts: &[String],
    ) -> Result<BatchEmbeddingResult, EmbeddingError> {
        let start = Instant::now();
        let mut embeddings = Vec::with_capacity(texts.len());
        let mut success = Vec::with_capacity(texts.len());
        for t in texts {
            if t.is_empty() {
                embeddings.push(vec![0.0; self.dimensions as usize]);
                success.push(false);
            } else {
                embeddings.push(self.embed(t));
                success.push(true);
            }
        }
        self.stats.record_request();
        Ok(BatchEmbeddingResult {
            embeddings,
            success,
            cache_hits: 0,
            duration: start.elapsed(),
        })
    }

    fn stats(&self) -> ProviderStats {
        self.stats.snapshot()
    }

    fn dimensions(&self) -> u32 {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_text_yields_identical_vector() {
        let provider = HashProvider::new(64);
        let a = provider.generate("the quick brown fox").await.unwrap();
        let b = provider.generate("the quick brown fox").await.unwrap();
        assert_eq!(a.embedding, b.embedding);
    }

    #[tokio::test]
    async fn different_text_yields_different_vector() {
        let provider = HashProvider::new(64);
        let a = provider.generate("the quick brown fox").await.unwrap();
        let b = provider.generate("a slow red turtle").await.unwrap();
        assert_ne!(a.embedding, b.embedding);
    }

    #[tokio::test]
    async fn output_is_unit_norm() {
        let provider = HashProvider::new(128);
        let result = provider.generate("hello").await.unwrap();
        let norm: f32 = result.embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }
}
