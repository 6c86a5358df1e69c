//! Fallback context summary used when no document was requested

use crate::prompts;
use docflow_gateway::TextGenerationGateway;
use std::sync::Arc;

/// Produces a short context summary and never fails
#[derive(Clone)]
pub struct SummaryFallback {
    gateway: Arc<dyn TextGenerationGateway>,
    placeholder: String,
}

impl SummaryFallback {
    /// Create with the placeholder returned on failure
    #[inline]
    #[must_use]
    pub fn new(gateway: Arc<dyn TextGenerationGateway>, placeholder: impl Into<String>) -> Self {
        Self {
            gateway,
            placeholder: placeholder.into(),
        }
    }

    /// Summarize `corpus`, or return the placeholder if generation fails
    pub async fn summarize(&self, corpus: &str) -> String {
        let prompt = prompts::render(prompts::SUMMARY, &[("corpus", corpus)]);
        match self.gateway.generate(Some(prompts::SUMMARY_SYSTEM), &prompt).await {
            Ok(summary) if !summary.trim().is_empty() => summary.trim().to_string(),
            Ok(_) => {
                tracing::warn!("Summary was empty, using placeholder");
                self.placeholder.clone()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Summary generation failed, using placeholder");
                self.placeholder.clone()
            }
        }
    }
}

impl std::fmt::Debug for SummaryFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryFallback")
            .field("placeholder", &self.placeholder)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow_test_utils::ScriptedGateway;

    #[tokio::test]
    async fn returns_generated_summary() {
        let gateway = ScriptedGateway::new().respond_to("Summarize", "  Invoice automation for ORG_00000001.  ");
        let fallback = SummaryFallback::new(Arc::new(gateway), "n/a");
        assert_eq!(fallback.summarize("corpus").await, "Invoice automation for ORG_00000001.");
    }

    #[tokio::test]
    async fn failure_yields_placeholder() {
        let gateway = ScriptedGateway::new().fail_on("Summarize");
        let fallback = SummaryFallback::new(Arc::new(gateway), "No summary available.");
        assert_eq!(fallback.summarize("corpus").await, "No summary available.");
    }

    #[tokio::test]
    async fn blank_answer_yields_placeholder() {
        let gateway = ScriptedGateway::new().respond_to("Summarize", "   ");
        let fallback = SummaryFallback::new(Arc::new(gateway), "No summary available.");
        assert_eq!(fallback.summarize("corpus").await, "No summary available.");
    }
}
