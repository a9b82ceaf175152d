//! Scripted LLM and reward-model fakes.

use async_trait::async_trait;
use cerebra_providers::{LlmError, LlmProvider, RewardModel};

/// Answers by substring rules against the incoming prompt; first match
/// wins, otherwise the default reply. Can be configured to always fail.
pub struct ScriptedLlm {
    rules: Vec<(String, String)>,
    default_reply: String,
    always_fail: bool,
}

impl ScriptedLlm {
    pub fn new(default_reply: impl Into<String>) -> Self {
        Self { rules: Vec::new(), default_reply: default_reply.into(), always_fail: false }
    }

    /// The refusal reply the answer prompt mandates for unsupported answers.
    pub fn unsure() -> Self {
        Self::new("Hmm, I'm not sure.")
    }

    pub fn failing() -> Self {
        Self { rules: Vec::new(), default_reply: String::new(), always_fail: true }
    }

    /// Reply with `response` when the prompt contains `pattern`.
    pub fn with_rule(mut self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.push((pattern.into(), response.into()));
        self
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        if self.always_fail {
            return Err(LlmError::Throttled("scripted failure".to_string()));
        }
        for (pattern, response) in &self.rules {
            if prompt.contains(pattern.as_str()) {
                return Ok(response.clone());
            }
        }
        Ok(self.default_reply.clone())
    }
}

/// Returns a fixed reward score string, or fails when scripted to.
pub struct ScriptedReward {
    score: String,
    always_fail: bool,
}

impl ScriptedReward {
    pub fn new(score: impl Into<String>) -> Self {
        Self { score: score.into(), always_fail: false }
    }

    /// A plausible nemotron-style score line.
    pub fn typical() -> Self {
        Self::new("helpfulness:3.5,correctness:3.8,coherence:3.6,complexity:2.1,verbosity:1.9")
    }

    pub fn failing() -> Self {
        Self { score: String::new(), always_fail: true }
    }
}

#[async_trait]
impl RewardModel for ScriptedReward {
    async fn score(&self, _prompt: &str, _candidate: &str) -> Result<String, LlmError> {
        if self.always_fail {
            return Err(LlmError::Throttled("scripted failure".to_string()));
        }
        Ok(self.score.clone())
    }
}
