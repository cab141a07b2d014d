mod hash;
mod pattern;
mod transformer;

pub use hash::HashProvider;
pub use pattern::PatternProvider;
pub use transformer::{InferenceBackend, InferenceOutput, TransformerProvider};

/// Attack-related keywords shared by the pattern and hash providers for
/// feature/boost computation — kept small and explicit rather than
/// duplicating the analyzer's weighted categories.
pub(crate) const ATTACK_KEYWORDS: &[&str] = &[
    "ignore",
    "previous",
    "instructions",
    "override",
    "bypass",
    "jailbreak",
    "system prompt",
    "admin mode",
    "god mode",
    "disable safety",
    "secret",
    "confidential",
    "forget",
];
