mod embedding_analyzer;
mod extract;
mod gate;
mod pattern;

pub use embedding_analyzer::EmbeddingAnalyzer;
pub use extract::extract_prompt;
pub use gate::decide;
pub use pattern::PatternAnalyzer;

use sentinel_common::types::InjectionVerdict;

/// Merge the pattern and embedding verdicts: whichever scored higher
/// wins the attack attribution, and the combined confidence is
/// re-checked against `threshold` to set `is_malicious`.
pub fn combine(pattern: InjectionVerdict, embedding: InjectionVerdict, threshold: f32) -> InjectionVerdict {
    let winner = if embedding.confidence > pattern.confidence {
        embedding
    } else {
        pattern
    };
    InjectionVerdict {
        is_malicious: winner.confidence >= threshold,
        ..winner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_common::types::AttackType;
    use std::time::Duration;

    fn verdict(confidence: f32, attack_type: AttackType) -> InjectionVerdict {
        InjectionVerdict {
            is_malicious: false,
            attack_type,
            confidence,
            similarity_score: confidence,
            matched_text: None,
            processing_time: Duration::ZERO,
        }
    }

    #[test]
    fn picks_the_higher_confidence_source() {
        let pattern = verdict(0.3, AttackType::PromptInjection);
        let embedding = verdict(0.8, AttackType::Jailbreak);
        let combined = combine(pattern, embedding, 0.7);
        assert_eq!(combined.attack_type, AttackType::Jailbreak);
        assert!(combined.is_malicious);
    }

    #[test]
    fn below_threshold_is_not_malicious_even_with_a_match() {
        let pattern = verdict(0.5, AttackType::PromptInjection);
        let embedding = verdict(0.2, AttackType::Safe);
        let combined = combine(pattern, embedding, 0.7);
        assert!(!combined.is_malicious);
    }
}
