use std::time::Duration;

use sentinel_common::config::UpstreamConfig;

/// Which upstream provider a request's path prefix maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Anthropic,
    Ollama,
}

impl Provider {
    /// Match a request path against the `/openai`, `/anthropic`,
    /// `/ollama` prefixes, returning the provider and the remaining
    /// path to append verbatim to the upstream base URL.
    pub fn from_path(path: &str) -> Option<(Self, &str)> {
        for (prefix, provider) in [
            ("/openai", Provider::OpenAi),
            ("/anthropic", Provider::Anthropic),
            ("/ollama", Provider::Ollama),
        ] {
            if let Some(rest) = path.strip_prefix(prefix) {
                return Some((provider, rest));
            }
        }
        None
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Ollama => "ollama",
        }
    }
}

/// Generalizes the engine workspace's `match provider.as_str() { "anthropic"
/// => ..., "openai" => ... }` LLM-client dispatch idiom from "pick an SDK
/// implementation" to "pick a base URL", reusing the same
/// per-provider-timeout shape.
pub struct UpstreamRouter {
    openai_base: String,
    anthropic_base: String,
    ollama_base: String,
    timeout: Duration,
}

impl UpstreamRouter {
    pub fn new(config: &UpstreamConfig) -> Self {
        Self {
            openai_base: config.openai.trim_end_matches('/').to_string(),
            anthropic_base: config.anthropic.trim_end_matches('/').to_string(),
            ollama_base: config.ollama.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout),
        }
    }

    pub fn base_url(&self, provider: Provider) -> &str {
        match provider {
            Provider::OpenAi => &self.openai_base,
            Provider::Anthropic => &self.anthropic_base,
            Provider::Ollama => &self.ollama_base,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build the full upstream URL for a stripped path and query string.
    pub fn target_url(&self, provider: Provider, rest_path: &str, query: Option<&str>) -> String {
        let base = self.base_url(provider);
        let path = if rest_path.starts_with('/') {
            rest_path.to_string()
        } else {
            format!("/{}", rest_path)
        };
        match query {
            Some(q) if !q.is_empty() => format!("{base}{path}?{q}"),
            _ => format!("{base}{path}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> UpstreamRouter {
        UpstreamRouter::new(&UpstreamConfig {
            openai: "https://api.openai.com".into(),
            anthropic: "https://api.anthropic.com".into(),
            ollama: "http://localhost:11434".into(),
            timeout: 60,
        })
    }

    #[test]
    fn strips_the_matched_prefix() {
        let (provider, rest) = Provider::from_path("/openai/v1/chat/completions").unwrap();
        assert_eq!(provider, Provider::OpenAi);
        assert_eq!(rest, "/v1/chat/completions");
    }

    #[test]
    fn unmatched_prefix_returns_none() {
        assert!(Provider::from_path("/unknown/path").is_none());
    }

    #[test]
    fn builds_full_target_url_with_query() {
        let url = router().target_url(Provider::Anthropic, "/v1/messages", Some("a=1"));
        assert_eq!(url, "https://api.anthropic.com/v1/messages?a=1");
    }

    #[test]
    fn builds_full_target_url_without_query() {
        let url = router().target_url(Provider::Ollama, "/api/generate", None);
        assert_eq!(url, "http://localhost:11434/api/generate");
    }
}
