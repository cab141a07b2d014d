pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod ids;
pub mod types;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use error::{Result, SentinelError};
pub use ids::RequestId;
