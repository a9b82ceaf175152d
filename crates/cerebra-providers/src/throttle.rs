//! Token-bucket throttling for LLM calls.
//!
//! Replaces a fixed post-generation sleep with a shared limiter awaited
//! before each completion, so concurrent strategies queue instead of
//! hammering the provider's rate limit.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::trace;

use crate::llm::{LlmError, LlmProvider};

pub struct ThrottledLlm {
    inner: Arc<dyn LlmProvider>,
    limiter: DefaultDirectRateLimiter,
}

impl ThrottledLlm {
    /// Wrap `inner` with a per-minute quota. A zero quota is coerced to 1.
    pub fn new(inner: Arc<dyn LlmProvider>, per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
        Self { inner, limiter: RateLimiter::direct(Quota::per_minute(per_minute)) }
    }
}

#[async_trait]
impl LlmProvider for ThrottledLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.limiter.until_ready().await;
        trace!("Rate-limit token acquired");
        self.inner.complete(prompt).await
    }
}
