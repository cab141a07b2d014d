use std::collections::HashMap;

/// Policy over request headers. Case-insensitive match
/// against a sensitive-header list; optionally preserves auth-class
/// headers on the outbound leg.
pub struct HeaderScrubber {
    sensitive_lower: Vec<String>,
    preserve_upstream_auth: bool,
}

const AUTH_CLASS_PREFIXES: &[&str] = &["authorization", "x-api-key", "x-auth-token", "bearer-"];

impl HeaderScrubber {
    pub fn new(sensitive_headers: &[String], preserve_upstream_auth: bool) -> Self {
        Self {
            sensitive_lower: sensitive_headers.iter().map(|h| h.to_lowercase()).collect(),
            preserve_upstream_auth,
        }
    }

    fn is_sensitive(&self, name_lower: &str) -> bool {
        self.sensitive_lower.iter().any(|h| h == name_lower)
    }

    fn is_auth_class(&self, name_lower: &str) -> bool {
        AUTH_CLASS_PREFIXES
            .iter()
            .any(|p| name_lower == *p || name_lower.starts_with(p))
    }

    /// Produce the scrubbed copy used for logging/events. Every sensitive
    /// header's value becomes `[REDACTED]`, including auth-class headers
    /// — this copy must never leak the original value.
    pub fn scrub_for_logging(&self, headers: &HashMap<String, String>) -> HashMap<String, String> {
        headers
            .iter()
            .map(|(name, value)| {
                let lower = name.to_lowercase();
                if self.is_sensitive(&lower) {
                    (name.clone(), "[REDACTED]".to_string())
                } else {
                    (name.clone(), value.clone())
                }
            })
            .collect()
    }

    /// Produce the headers to send upstream. Non-auth sensitive headers
    /// stay scrubbed; auth-class headers are restored verbatim from
    /// `original` when `preserve_upstream_auth` is enabled — this is the
    /// only path that ever sees the pre-scrub value again.
    pub fn headers_for_upstream(
        &self,
        original: &HashMap<String, String>,
    ) -> HashMap<String, String> {
        original
            .iter()
            .map(|(name, value)| {
                let lower = name.to_lowercase();
                if self.is_sensitive(&lower) {
                    if self.preserve_upstream_auth && self.is_auth_class(&lower) {
                        (name.clone(), value.clone())
                    } else {
                        (name.clone(), "[REDACTED]".to_string())
                    }
                } else {
                    (name.clone(), value.clone())
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_headers() -> HashMap<String, String> {
        let mut h = HashMap::new();
        h.insert(
            "Authorization".to_string(),
            "Bearer sk-live-xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx".to_string(),
        );
        h.insert("X-Api-Key".to_string(), "super-secret".to_string());
        h.insert("Content-Type".to_string(), "application/json".to_string());
        h
    }

    #[test]
    fn logging_copy_never_sees_raw_auth_value() {
        let scrubber = HeaderScrubber::new(
            &["authorization".to_string(), "x-api-key".to_string()],
            true,
        );
        let scrubbed = scrubber.scrub_for_logging(&sample_headers());
        assert_eq!(scrubbed.get("Authorization").unwrap(), "[REDACTED]");
        assert_eq!(scrubbed.get("X-Api-Key").unwrap(), "[REDACTED]");
        assert_eq!(scrubbed.get("Content-Type").unwrap(), "application/json");
    }

    #[test]
    fn upstream_copy_restores_auth_when_preserve_enabled() {
        let scrubber = HeaderScrubber::new(
            &["authorization".to_string(), "x-api-key".to_string()],
            true,
        );
        let upstream = scrubber.headers_for_upstream(&sample_headers());
        assert_eq!(
            upstream.get("Authorization").unwrap(),
            "Bearer sk-live-xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx"
        );
    }

    #[test]
    fn upstream_copy_scrubs_auth_when_preserve_disabled() {
        let scrubber = HeaderScrubber::new(&["authorization".to_string()], false);
        let upstream = scrubber.headers_for_upstream(&sample_headers());
        assert_eq!(upstream.get("Authorization").unwrap(), "[REDACTED]");
    }
}
