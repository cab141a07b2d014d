use std::time::Instant;

use async_trait::async_trait;

use crate::providers::ATTACK_KEYWORDS;
use crate::{
    normalize, BatchEmbeddingResult, EmbeddingError, EmbeddingProvider, EmbeddingResult,
    ProviderStats, ServiceType, StatsCounters,
};

/// Embedding provider that computes a feature-engineered unit vector
/// purely from text statistics and attack-pattern scores — no model,
/// no network call. Used when the vector path is enabled but no real
/// model is configured.
pub struct PatternProvider {
    dimensions: u32,
    stats: StatsCounters,
}

impl PatternProvider {
    pub fn new(dimensions: u32) -> Self {
        Self {
            dimensions,
            stats: StatsCounters::default(),
        }
    }

    fn features(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let len = text.chars().count() as f32;
        let digit_count = text.chars().filter(|c| c.is_ascii_digit()).count() as f32;
        let upper_count = text.chars().filter(|c| c.is_uppercase()).count() as f32;
        let punct_count = text.chars().filter(|c| c.is_ascii_punctuation()).count() as f32;
        let space_count = text.chars().filter(|c| c.is_whitespace()).count() as f32;
        let denom = len.max(1.0);

        let keyword_hits: Vec<f32> = ATTACK_KEYWORDS
            .iter()
            .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
            .collect();
        let keyword_ratio = keyword_hits.iter().sum::<f32>() / ATTACK_KEYWORDS.len() as f32;

        let mut base = vec![
            (len / 1000.0).min(1.0),
            digit_count / denom,
            upper_count / denom,
            punct_count / denom,
            space_count / denom,
            keyword_ratio,
        ];
        base.extend(keyword_hits);

        let dims = self.dimensions as usize;
        let mut v = vec![0f32; dims];
        for (i, slot) in v.iter_mut().enumerate() {
            if i < base.len() {
                *slot = base[i];
            } else {
                let bucket = i % 26;
                let target = (b'a' + bucket as u8) as char;
                let count = lower.chars().filter(|&c| c == target).count() as f32;
                let decay = 1.0 / (1.0 + (i as f32 / dims as f32));
                *slot = (count / denom) * decay;
            }
        }
        normalize(&mut v);
        v
    }
}

#[async_trait]
impl EmbeddingProvider for PatternProvider {
    async fn generate(&self, text: &str) -> Result<EmbeddingResult, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        self.stats.record_request();
        let start = Instant::now();
        let embedding = self.features(text);
        Ok(EmbeddingResult {
            embedding,
            duration: start.elapsed(),
            token_count: text.split_whitespace().count() as u32,
            service_type: ServiceType::Pattern,
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
                embeddings.push(self.features(t));
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
