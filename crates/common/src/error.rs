use thiserror::Error;

/// Top-level error type for the proxy. Crate-local error enums convert
/// into this one at the boundary where a component's failure becomes
/// visible to the pipeline.
#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("redaction engine error: {0}")]
    Redaction(String),

    #[error("embedding provider error: {0}")]
    Embedding(String),

    #[error("vector store error: {0}")]
    VectorStore(String),

    #[error("analyzer error: {0}")]
    Analyzer(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("request blocked: {attack_type} detected (confidence: {confidence_pct:.1}%)")]
    Blocked {
        attack_type: String,
        confidence_pct: f32,
    },

    #[error("{0}")]
    Internal(String),
}

impl SentinelError {
    /// Whether this error represents a transient dependency failure that
    /// warrants a degraded path rather than aborting the request.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            Self::Embedding(_) | Self::VectorStore(_) | Self::Analyzer(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SentinelError>;
