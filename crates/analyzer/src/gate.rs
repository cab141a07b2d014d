use sentinel_common::types::{Action, InjectionVerdict, SecurityMode};

/// The single place that turns a verdict into a forward/block decision.
/// Structured so `log` mode can never block: it isn't matched against
/// `Action::Block` at all, it falls into the same arm as `passthrough`.
pub fn decide(verdict: &InjectionVerdict, mode: SecurityMode) -> Action {
    if !verdict.is_malicious {
        return Action::Forward;
    }
    match mode {
        SecurityMode::Block => Action::Block,
        SecurityMode::Log | SecurityMode::Passthrough => Action::Forward,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_common::types::AttackType;
    use std::time::Duration;

    fn malicious_verdict() -> InjectionVerdict {
        InjectionVerdict {
            is_malicious: true,
            attack_type: AttackType::Jailbreak,
            confidence: 0.95,
            similarity_score: 0.0,
            matched_text: None,
            processing_time: Duration::ZERO,
        }
    }

    #[test]
    fn block_mode_blocks_malicious() {
        assert_eq!(decide(&malicious_verdict(), SecurityMode::Block), Action::Block);
    }

    #[test]
    fn log_mode_never_blocks() {
        assert_eq!(decide(&malicious_verdict(), SecurityMode::Log), Action::Forward);
    }

    #[test]
    fn passthrough_mode_never_blocks() {
        assert_eq!(decide(&malicious_verdict(), SecurityMode::Passthrough), Action::Forward);
    }

    #[test]
    fn benign_verdict_always_forwards() {
        let mut verdict = malicious_verdict();
        verdict.is_malicious = false;
        assert_eq!(decide(&verdict, SecurityMode::Block), Action::Forward);
    }
}
