use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::RequestId;

/// A grouped record that a rule matched text N>=1 times.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Finding {
    pub entity_type: String,
    pub replacement_used: String,
    pub occurrences: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<(usize, usize)>>,
}

/// Output of running the Detector over one piece of text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectionResult {
    pub masked_text: String,
    pub findings: Vec<Finding>,
}

/// The kind of malicious intent an InjectionAnalyzer attributes to a prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    Safe,
    PromptInjection,
    Jailbreak,
    InformationExtraction,
}

impl AttackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttackType::Safe => "safe",
            AttackType::PromptInjection => "prompt_injection",
            AttackType::Jailbreak => "jailbreak",
            AttackType::InformationExtraction => "information_extraction",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "prompt_injection" => AttackType::PromptInjection,
            "jailbreak" => AttackType::Jailbreak,
            "information_extraction" => AttackType::InformationExtraction,
            _ => AttackType::Safe,
        }
    }
}

/// security.mode — governs whether a malicious verdict short-circuits the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    Block,
    Log,
    Passthrough,
}

/// Decision produced by the analyzer's policy gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Forward,
    Block,
}

/// Verdict produced by the InjectionAnalyzer for one prompt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InjectionVerdict {
    pub is_malicious: bool,
    pub attack_type: AttackType,
    pub confidence: f32,
    pub similarity_score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_text: Option<String>,
    pub processing_time: Duration,
}

/// Per-request state. Exclusively owned by the task handling that request.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub client_ip: String,
    pub start_time: DateTime<Utc>,
    /// Header snapshot taken before scrubbing — the only place the raw
    /// auth-class header values live after the scrub middleware runs.
    pub original_headers: HashMap<String, String>,
    pub findings: Vec<Finding>,
    pub injection_verdict: Option<InjectionVerdict>,
}

impl RequestContext {
    pub fn new(client_ip: String, original_headers: HashMap<String, String>) -> Self {
        Self {
            request_id: RequestId::new(),
            client_ip,
            start_time: Utc::now(),
            original_headers,
            findings: Vec::new(),
            injection_verdict: None,
        }
    }
}
