use chrono::{DateTime, Utc};
use sentinel_common::ids::VectorId;
use sentinel_common::types::AttackType;

/// A previously-seen malicious (or confirmed-safe) prompt embedding,
/// persisted so future requests can be compared against it by cosine
/// similarity instead of pattern matching alone.
#[derive(Clone, Debug)]
pub struct SecurityVector {
    pub id: VectorId,
    pub text: String,
    pub text_hash: String,
    pub embedding: Vec<f32>,
    pub attack_type: AttackType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SecurityVector {
    pub fn new(text: String, text_hash: String, embedding: Vec<f32>, attack_type: AttackType) -> Self {
        let now = Utc::now();
        Self {
            id: VectorId::new(),
            text,
            text_hash,
            embedding,
            attack_type,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Numeric encoding of `AttackType` for the `label` column. `label_text`
/// carries the human-readable form; this is the sortable/indexable one.
pub fn attack_type_to_label(attack_type: AttackType) -> i16 {
    match attack_type {
        AttackType::Safe => 0,
        AttackType::PromptInjection => 1,
        AttackType::Jailbreak => 2,
        AttackType::InformationExtraction => 3,
    }
}
