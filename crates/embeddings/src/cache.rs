use std::time::Duration;

use sha2::{Digest, Sha256};

/// Number of hex characters of the digest kept in the cache key. Widened
/// historically from 8 to 16; this build commits to 16 and refuses to
/// start if the namespace still holds entries keyed with the old,
/// shorter digest unless the operator opts in via
/// `allow_legacy_cache_keys`.
pub const KEY_HASH_LEN: usize = 16;
const LEGACY_KEY_HASH_LEN: usize = 8;

/// Binary wire format for cached embeddings: little-endian f32 x D.
/// A historical CSV-string format also exists on read paths that
/// haven't been upgraded yet; this codec detects and decodes both but
/// only ever writes the binary form.
pub struct CacheCodec {
    dimensions: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache value has wrong length: expected {expected} or legacy CSV, got {got} bytes")]
    BadLength { expected: usize, got: usize },
    #[error("cache value is not valid UTF-8 and not binary-length")]
    Malformed,
    #[error("redis error: {0}")]
    Redis(String),
}

impl CacheCodec {
    pub fn new(dimensions: u32) -> Self {
        Self { dimensions }
    }

    /// Build the namespaced key for a piece of text.
    pub fn key(&self, prefix: &str, normalized_text: &str) -> String {
        let digest = Sha256::digest(normalized_text.as_bytes());
        let hex = hex_encode(&digest);
        format!("{}:ml:{}", prefix, &hex[..KEY_HASH_LEN])
    }

    /// Build the legacy-length key, used only to detect stale entries
    /// at startup.
    pub fn legacy_key(&self, prefix: &str, normalized_text: &str) -> String {
        let digest = Sha256::digest(normalized_text.as_bytes());
        let hex = hex_encode(&digest);
        format!("{}:ml:{}", prefix, &hex[..LEGACY_KEY_HASH_LEN])
    }

    pub fn encode(&self, embedding: &[f32]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(embedding.len() * 4);
        for f in embedding {
            buf.extend_from_slice(&f.to_le_bytes());
        }
        buf
    }

    /// Decode either the binary format (exact `4 * D` bytes) or the
    /// legacy CSV-string format (comma-separated floats). Readers must
    /// not guess: length is authoritative.
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<f32>, CacheError> {
        let expected = (self.dimensions as usize) * 4;
        if bytes.len() == expected {
            return Ok(bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect());
        }

        if let Ok(s) = std::str::from_utf8(bytes) {
            let parsed: Result<Vec<f32>, _> = s.split(',').map(|p| p.trim().parse()).collect();
            if let Ok(values) = parsed {
                if values.len() == self.dimensions as usize {
                    tracing::warn!("decoded legacy CSV-format cache value; operators should clear this namespace");
                    return Ok(values);
                }
            }
        }

        Err(CacheError::BadLength {
            expected,
            got: bytes.len(),
        })
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Redis-backed TTL cache for embeddings. Disabled (no Redis configured)
/// degrades to an always-miss cache — the provider just computes every
/// time, matching the engine workspace's "optional client, absence
/// degrades gracefully" idiom.
pub struct EmbeddingCache {
    codec: CacheCodec,
    prefix: String,
    ttl: Duration,
    backend: Option<redis::aio::MultiplexedConnection>,
}

impl EmbeddingCache {
    pub fn disabled(dimensions: u32, prefix: &str, ttl: Duration) -> Self {
        Self {
            codec: CacheCodec::new(dimensions),
            prefix: prefix.to_string(),
            ttl,
            backend: None,
        }
    }

    pub async fn connect(
        dimensions: u32,
        prefix: &str,
        ttl: Duration,
        redis_url: &str,
    ) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url).map_err(|e| CacheError::Redis(e.to_string()))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;
        Ok(Self {
            codec: CacheCodec::new(dimensions),
            prefix: prefix.to_string(),
            ttl,
            backend: Some(conn),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Refuse to start if the namespace mixes key-hash lengths. Only
    /// meaningful when a backend is connected.
    pub async fn check_namespace_consistency(
        &self,
        sample_text: &str,
        allow_legacy: bool,
    ) -> Result<(), CacheError> {
        if allow_legacy {
            return Ok(());
        }
        let Some(conn) = self.backend.clone() else {
            return Ok(());
        };
        let legacy_key = self.codec.legacy_key(&self.prefix, sample_text);
        let mut conn = conn;
        let exists: bool = redis::cmd("EXISTS")
            .arg(&legacy_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;
        if exists {
            return Err(CacheError::Redis(format!(
                "namespace '{}' contains a legacy-length cache key ({}); refusing to start. \
                 Clear the namespace or set allow_legacy_cache_keys=true.",
                self.prefix, legacy_key
            )));
        }
        Ok(())
    }

    /// Read-through lookup. Errors and misses both return `None` — the
    /// caller always falls back to computing the embedding.
    pub async fn get(&self, normalized_text: &str) -> Option<Vec<f32>> {
        let conn = self.backend.clone()?;
        let key = self.codec.key(&self.prefix, normalized_text);
        let mut conn = conn;
        let bytes: Option<Vec<u8>> = redis::cmd("GET")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .ok()?;
        let bytes = bytes?;
        self.codec.decode(&bytes).ok()
    }

    /// Best-effort, asynchronous write — never awaited on the request
    /// path in the pipeline. Callers should `tokio::spawn` this.
    pub async fn set(&self, normalized_text: &str, embedding: &[f32]) {
        let Some(conn) = self.backend.clone() else {
            return;
        };
        let key = self.codec.key(&self.prefix, normalized_text);
        let bytes = self.codec.encode(embedding);
        let mut conn = conn;
        let result: Result<(), redis::RedisError> = redis::cmd("SET")
            .arg(&key)
            .arg(bytes)
            .arg("EX")
            .arg(self.ttl.as_secs())
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "embedding cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_round_trip() {
        let codec = CacheCodec::new(4);
        let v = vec![0.1f32, -0.2, 0.3, 0.4];
        let bytes = codec.encode(&v);
        assert_eq!(bytes.len(), 16);
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, v);
    }

    #[test]
    fn legacy_csv_format_is_read_compatible() {
        let codec = CacheCodec::new(3);
        let csv = b"0.1,0.2,0.3".to_vec();
        let decoded = codec.decode(&csv).unwrap();
        assert_eq!(decoded, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let codec = CacheCodec::new(4);
        let bytes = vec![0u8; 10];
        assert!(codec.decode(&bytes).is_err());
    }

    #[test]
    fn key_uses_widened_hash_length() {
        let codec = CacheCodec::new(4);
        let key = codec.key("sentinel", "hello world");
        let hash_part = key.rsplit(':').next().unwrap();
        assert_eq!(hash_part.len(), KEY_HASH_LEN);
    }
}
