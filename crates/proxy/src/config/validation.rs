use sentinel_common::config::ProxyConfig;

use super::loader::ConfigError;

/// Validate the complete proxy configuration. Collects every violation
/// into one error rather than failing on the first, so an operator sees
/// the whole list of problems in one pass.
pub fn validate(config: &ProxyConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_server(config, &mut errors);
    validate_rate_limit(config, &mut errors);
    validate_vector_security(config, &mut errors);
    validate_upstream(config, &mut errors);
    validate_websocket(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.join("; ")))
    }
}

fn validate_server(config: &ProxyConfig, errors: &mut Vec<String>) {
    if config.server.port == 0 {
        errors.push("server.port must be between 1 and 65535".into());
    }
    if config.server.read_timeout == 0 {
        errors.push("server.read_timeout must be > 0".into());
    }
    if config.server.write_timeout == 0 {
        errors.push("server.write_timeout must be > 0".into());
    }
    if config.server.idle_timeout == 0 {
        errors.push("server.idle_timeout must be > 0".into());
    }
}

fn validate_rate_limit(config: &ProxyConfig, errors: &mut Vec<String>) {
    let rl = &config.security.rate_limit;
    if !rl.enabled {
        return;
    }
    if rl.requests_per_min == 0 {
        errors.push("security.rate_limit.requests_per_min must be > 0".into());
    }
    if rl.burst_limit == 0 {
        errors.push("security.rate_limit.burst_limit must be > 0".into());
    }
    if rl.max_request_size == 0 {
        errors.push("security.rate_limit.max_request_size must be > 0".into());
    }
}

fn validate_vector_security(config: &ProxyConfig, errors: &mut Vec<String>) {
    let vs = &config.security.vector_security;
    if !vs.enabled {
        return;
    }
    if !(0.0..=1.0).contains(&vs.block_threshold) {
        errors.push("security.vector_security.block_threshold must be between 0.0 and 1.0".into());
    }
    if vs.max_batch_size == 0 {
        errors.push("security.vector_security.max_batch_size must be > 0".into());
    }
    if vs.embedding.dimensions == 0 {
        errors.push("security.vector_security.embedding.dimensions must be > 0".into());
    }
    if vs.database.max_connections == 0 {
        errors.push("security.vector_security.database.max_connections must be > 0".into());
    }
}

fn validate_upstream(config: &ProxyConfig, errors: &mut Vec<String>) {
    let u = &config.upstream;
    if u.openai.is_empty() {
        errors.push("upstream.openai must not be empty".into());
    }
    if u.anthropic.is_empty() {
        errors.push("upstream.anthropic must not be empty".into());
    }
    if u.ollama.is_empty() {
        errors.push("upstream.ollama must not be empty".into());
    }
    if u.timeout == 0 {
        errors.push("upstream.timeout must be > 0".into());
    }
}

fn validate_websocket(config: &ProxyConfig, errors: &mut Vec<String>) {
    let ws = &config.websocket;
    if !ws.enabled {
        return;
    }
    if ws.max_connections == 0 {
        errors.push("websocket.max_connections must be > 0".into());
    }
    if ws.max_message_size == 0 {
        errors.push("websocket.max_message_size must be > 0".into());
    }
    if ws.ping_interval_seconds == 0 {
        errors.push("websocket.ping_interval_seconds must be > 0".into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_common::config::*;
    use sentinel_common::types::SecurityMode;

    fn base_config() -> ProxyConfig {
        ProxyConfig {
            server: ServerConfig {
                port: 8080,
                read_timeout: 30,
                write_timeout: 30,
                idle_timeout: 30,
            },
            privacy: PrivacyConfig {
                enabled: true,
                detectors: vec!["all".into()],
                masking: MaskingConfig::default(),
                header_scrubbing: HeaderScrubbingConfig::default(),
            },
            security: SecurityConfig {
                enabled: true,
                mode: SecurityMode::Log,
                rate_limit: RateLimitConfig::default(),
                vector_security: VectorSecurityConfig::default(),
            },
            logging: LoggingConfig::default(),
            upstream: UpstreamConfig {
                openai: "https://api.openai.com".into(),
                anthropic: "https://api.anthropic.com".into(),
                ollama: "http://localhost:11434".into(),
                timeout: 60,
            },
            websocket: WebSocketConfig::default(),
        }
    }

    #[test]
    fn a_well_formed_config_validates() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut config = base_config();
        config.server.port = 0;
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn collects_multiple_errors_at_once() {
        let mut config = base_config();
        config.server.port = 0;
        config.upstream.openai = String::new();
        let ConfigError::Validation(msg) = validate(&config).unwrap_err() else {
            panic!("expected Validation error");
        };
        assert!(msg.contains("server.port"));
        assert!(msg.contains("upstream.openai"));
    }
}
