use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;

use crate::{
    normalize, BatchEmbeddingResult, EmbeddingError, EmbeddingProvider, EmbeddingResult,
    ProviderStats, ServiceType, StatsCounters,
};

const CLS_TOKEN_ID: u32 = 101;
const SEP_TOKEN_ID: u32 = 102;
const PAD_TOKEN_ID: u32 = 0;
const UNK_TOKEN_ID: u32 = 100;

/// Raw output of a model inference call, before pooling. Real models
/// return per-token hidden states; some expose an already-pooled
/// sentence vector directly (e.g. a `[CLS]`-pooler head).
pub enum InferenceOutput {
    /// One vector per input in the batch: `[batch, D]`.
    Pooled(Vec<Vec<f32>>),
    /// Per-token hidden states per input: `[batch, seq, D]`, mean-pooled
    /// over the sequence dimension by the caller.
    Sequence(Vec<Vec<Vec<f32>>>),
}

/// Pluggable model-inference seam. A real deployment wires in an ONNX
/// or candle session here; tests and the pattern/hash fallbacks never
/// need one.
pub trait InferenceBackend: Send + Sync {
    fn infer(&self, token_ids: &[Vec<u32>]) -> Result<InferenceOutput, EmbeddingError>;
}

/// Minimal whitespace tokenizer producing BERT-style special tokens
/// around the sequence. Unknown words map to `[UNK]`; sequences longer
/// than `max_length` are truncated, shorter ones padded with `[PAD]`.
struct Tokenizer {
    vocab: HashMap<String, u32>,
    max_length: usize,
}

impl Tokenizer {
    fn new(vocab: HashMap<String, u32>, max_length: usize) -> Self {
        Self { vocab, max_length }
    }

    fn encode(&self, text: &str) -> Vec<u32> {
        let mut ids = vec![CLS_TOKEN_ID];
        for word in text.to_lowercase().split_whitespace() {
            let cleaned: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
            if cleaned.is_empty() {
                continue;
            }
            let id = self.vocab.get(&cleaned).copied().unwrap_or(UNK_TOKEN_ID);
            ids.push(id);
            if ids.len() >= self.max_length - 1 {
                break;
            }
        }
        ids.push(SEP_TOKEN_ID);
        ids.truncate(self.max_length);
        while ids.len() < self.max_length {
            ids.push(PAD_TOKEN_ID);
        }
        ids
    }
}

/// Embedding provider backed by a real (or mocked) transformer model.
/// Tokenizes to a fixed-length id sequence, runs the pluggable
/// `InferenceBackend`, mean-pools token-level output when the backend
/// doesn't already pool, and hard-errors on a dimension mismatch rather
/// than silently truncating or padding a model's output.
pub struct TransformerProvider {
    dimensions: u32,
    tokenizer: Tokenizer,
    backend: Box<dyn InferenceBackend>,
    stats: StatsCounters,
}

impl TransformerProvider {
    pub fn new(
        dimensions: u32,
        max_length: usize,
        vocab: HashMap<String, u32>,
        backend: Box<dyn InferenceBackend>,
    ) -> Self {
        Self {
            dimensions,
            tokenizer: Tokenizer::new(vocab, max_length),
            backend,
            stats: StatsCounters::default(),
        }
    }

    fn pool(&self, output: InferenceOutput) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        match output {
            InferenceOutput::Pooled(vectors) => Ok(vectors),
            InferenceOutput::Sequence(batches) => Ok(batches
                .into_iter()
                .map(|tokens| {
                    let seq_len = tokens.len().max(1) as f32;
                    let width = tokens.first().map(|t| t.len()).unwrap_or_default();
                    let mut pooled = vec![0f32; width];
                    for token in &tokens {
                        for (slot, value) in pooled.iter_mut().zip(token.iter()) {
                            *slot += value;
                        }
                    }
                    for slot in pooled.iter_mut() {
                        *slot /= seq_len;
                    }
                    pooled
                })
                .collect()),
        }
    }

    fn check_dimensions(&self, vectors: &[Vec<f32>]) -> Result<(), EmbeddingError> {
        for v in vectors {
            if v.len() != self.dimensions as usize {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimensions,
                    got: v.len(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for TransformerProvider {
    async fn generate(&self, text: &str) -> Result<EmbeddingResult, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        self.stats.record_request();
        let start = Instant::now();

        let token_ids = self.tokenizer.encode(text);
        let output = self
            .backend
            .infer(std::slice::from_ref(&token_ids))
            .inspect_err(|_| {
                self.stats.record_error();
            })?;
        let mut pooled = self.pool(output)?;
        self.check_dimensions(&pooled)?;
        let mut embedding = pooled.remove(0);
        normalize(&mut embedding);

        Ok(EmbeddingResult {
            embedding,
            duration: start.elapsed(),
            token_count: token_ids.iter().filter(|&&id| id != PAD_TOKEN_ID).count() as u32,
            service_type: ServiceType::Ml,
            cache_hit: false,
        })
    }

    async fn generate_batch(
        &self,
        texts: &[String],
    ) -> Result<BatchEmbeddingResult, EmbeddingError> {
        let start = Instant::now();
        let token_batches: Vec<Vec<u32>> = texts.iter().map(|t| self.tokenizer.encode(t)).collect();
        let output = self.backend.infer(&token_batches).inspect_err(|_| {
            self.stats.record_error();
        })?;
        let pooled = self.pool(output)?;
        self.check_dimensions(&pooled)?;

        let success = vec![true; pooled.len()];
        let embeddings = pooled
            .into_iter()
            .map(|mut v| {
                normalize(&mut v);
                v
            })
            .collect();
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

    struct MockBackend {
        dimensions: usize,
    }

    impl InferenceBackend for MockBackend {
        fn infer(&self, token_ids: &[Vec<u32>]) -> Result<InferenceOutput, EmbeddingError> {
            let vectors = token_ids
                .iter()
                .map(|ids| {
                    let sum: u32 = ids.iter().sum();
                    (0..self.dimensions)
                        .map(|i| ((sum as usize + i) % 97) as f32 / 97.0)
                        .collect()
                })
                .collect();
            Ok(InferenceOutput::Pooled(vectors))
        }
    }

    struct WrongDimensionBackend;

    impl InferenceBackend for WrongDimensionBackend {
        fn infer(&self, token_ids: &[Vec<u32>]) -> Result<InferenceOutput, EmbeddingError> {
            Ok(InferenceOutput::Pooled(vec![vec![0.0; 3]; token_ids.len()]))
        }
    }

    fn vocab() -> HashMap<String, u32> {
        let mut v = HashMap::new();
        v.insert("hello".to_string(), 7592);
        v.insert("world".to_string(), 2088);
        v
    }

    #[tokio::test]
    async fn tokenizes_and_pools_to_configured_dimension() {
        let provider = TransformerProvider::new(
            8,
            16,
            vocab(),
            Box::new(MockBackend { dimensions: 8 }),
        );
        let result = provider.generate("hello world").await.unwrap();
        assert_eq!(result.embedding.len(), 8);
        let norm: f32 = result.embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_a_hard_error() {
        let provider = TransformerProvider::new(8, 16, vocab(), Box::new(WrongDimensionBackend));
        let err = provider.generate("hello world").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::DimensionMismatch { .. }));
    }

    #[test]
    fn unknown_words_fall_back_to_unk() {
        let tokenizer = Tokenizer::new(vocab(), 8);
        let ids = tokenizer.encode("hello spaceship");
        assert_eq!(ids[0], CLS_TOKEN_ID);
        assert_eq!(ids[1], 7592);
        assert_eq!(ids[2], UNK_TOKEN_ID);
    }

    #[test]
    fn short_sequences_are_padded_to_max_length() {
        let tokenizer = Tokenizer::new(vocab(), 10);
        let ids = tokenizer.encode("hello");
        assert_eq!(ids.len(), 10);
        assert_eq!(*ids.last().unwrap(), PAD_TOKEN_ID);
    }
}
