//! Answer generation seam.
//!
//! [`AnswerGenerator::generate`] never fails: transport errors, provider
//! errors and timeouts all come back as a [`GenerationOutcome`] with
//! `status = Error` and a human-readable explanation in `text`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ai_llm_service::{ChatTurn, LlmServiceProfiles};
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::api_types::AnswerStatus;

/// Status-tagged generator result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub text: String,
    pub status: AnswerStatus,
}

impl GenerationOutcome {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: AnswerStatus::Success,
        }
    }

    /// Failure with `reason` wrapped into a user-facing sentence.
    pub fn failure(reason: impl std::fmt::Display) -> Self {
        Self {
            text: format!("Answer generation failed: {reason}"),
            status: AnswerStatus::Error,
        }
    }
}

/// Produces free text from a system instruction and a conversation.
pub trait AnswerGenerator: Send + Sync {
    fn generate<'a>(
        &'a self,
        system: &'a str,
        turns: &'a [ChatTurn],
    ) -> BoxFuture<'a, GenerationOutcome>;
}

/// Runs a generation future under a ceiling, folding every failure into an outcome.
pub async fn bounded<F, E>(limit: Duration, fut: F) -> GenerationOutcome
where
    F: Future<Output = Result<String, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(text)) => GenerationOutcome::success(text),
        Ok(Err(e)) => {
            warn!(error = %e, "generator call failed");
            GenerationOutcome::failure(e)
        }
        Err(_) => {
            warn!(timeout_secs = limit.as_secs_f64(), "generator call timed out");
            GenerationOutcome::failure(format!("timed out after {}s", limit.as_secs_f64()))
        }
    }
}

/// Generator over the shared LLM service's generation profile.
#[derive(Clone)]
pub struct LlmGenerator {
    svc: Arc<LlmServiceProfiles>,
    timeout: Duration,
}

impl LlmGenerator {
    pub fn new(svc: Arc<LlmServiceProfiles>, timeout: Duration) -> Self {
        Self { svc, timeout }
    }
}

impl AnswerGenerator for LlmGenerator {
    fn generate<'a>(
        &'a self,
        system: &'a str,
        turns: &'a [ChatTurn],
    ) -> BoxFuture<'a, GenerationOutcome> {
        async move {
            debug!(turns = turns.len(), timeout_secs = self.timeout.as_secs(), "generating answer");
            bounded(self.timeout, self.svc.chat(Some(system), turns)).await
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_passes_text_through() {
        let out = bounded(Duration::from_secs(1), async { Ok::<_, String>("hi".to_string()) }).await;
        assert_eq!(out, GenerationOutcome::success("hi"));
    }

    #[tokio::test]
    async fn errors_become_status_error() {
        let out = bounded(Duration::from_secs(1), async {
            Err::<String, _>("connection refused")
        })
        .await;
        assert_eq!(out.status, AnswerStatus::Error);
        assert!(out.text.contains("connection refused"));
    }

    #[tokio::test]
    async fn slow_calls_time_out() {
        let out = bounded(Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, String>("late".to_string())
        })
        .await;
        assert_eq!(out.status, AnswerStatus::Error);
        assert!(out.text.contains("timed out"));
    }
}
