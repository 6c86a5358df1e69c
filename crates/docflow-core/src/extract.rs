//! Section extraction
//!
//! Asks the gateway to copy one named section out of a generated document
//! and rejects answers that are empty or implausibly short.

use crate::error::DocflowError;
use crate::prompts;
use docflow_gateway::TextGenerationGateway;
use std::sync::Arc;

/// Carves named sections out of a generated document
#[derive(Clone)]
pub struct SectionExtractor {
    gateway: Arc<dyn TextGenerationGateway>,
    min_chars: usize,
}

impl SectionExtractor {
    /// Create an extractor
    #[inline]
    #[must_use]
    pub fn new(gateway: Arc<dyn TextGenerationGateway>, min_chars: usize) -> Self {
        Self { gateway, min_chars }
    }

    /// Minimum accepted section length in characters
    #[inline]
    #[must_use]
    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    /// Extract the section titled `label` from `document`
    ///
    /// # Errors
    /// - `GenerationFailure` if the gateway call fails
    /// - `ExtractionFailure` if the trimmed section is shorter than the minimum
    pub async fn extract(&self, document: &str, label: &str) -> Result<String, DocflowError> {
        let prompt = prompts::render(prompts::EXTRACT, &[("label", label), ("document", document)]);
        let response = self
            .gateway
            .generate(Some(prompts::EXTRACT_SYSTEM), &prompt)
            .await?;

        let section = clean_section(&response, label);
        let length = section.chars().count();
        if length < self.min_chars {
            tracing::warn!(section = label, length, minimum = self.min_chars, "Extracted section rejected");
            return Err(DocflowError::ExtractionFailure {
                section: label.to_string(),
                length,
                minimum: self.min_chars,
            });
        }

        tracing::debug!(section = label, length, "Section extracted");
        Ok(section)
    }
}

impl std::fmt::Debug for SectionExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionExtractor")
            .field("min_chars", &self.min_chars)
            .finish_non_exhaustive()
    }
}

/// Strip fences and an echoed heading from an extraction answer
fn clean_section(response: &str, label: &str) -> String {
    let body = strip_code_fences(response);
    let mut lines = body.lines();
    let first = lines.clone().next().unwrap_or_default();
    if is_heading_for(first, label) {
        lines.next();
        return lines.collect::<Vec<_>>().join("\n").trim().to_string();
    }
    body.to_string()
}

fn is_heading_for(line: &str, label: &str) -> bool {
    let line = line.trim();
    let title = line.trim_start_matches('#');
    (title.len() < line.len() || line.ends_with(':'))
        && title
            .trim()
            .trim_end_matches(':')
            .trim_matches('*')
            .trim()
            .eq_ignore_ascii_case(label.trim())
}

/// Remove one surrounding Markdown code fence, if present
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string on the opening line.
    let body = after_open.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow_test_utils::ScriptedGateway;

    #[test]
    fn strips_fences_with_info_string() {
        assert_eq!(strip_code_fences("```markdown\nbody text\n```\n"), "body text");
        assert_eq!(strip_code_fences("  plain  "), "plain");
        assert_eq!(strip_code_fences("```\nunterminated"), "unterminated");
    }

    #[test]
    fn drops_echoed_heading() {
        let cleaned = clean_section("## Executive Summary\n\nThe project automates invoices.", "Executive Summary");
        assert_eq!(cleaned, "The project automates invoices.");

        let cleaned = clean_section("Executive summary:\nText", "Executive Summary");
        assert_eq!(cleaned, "Text");

        let untouched = clean_section("Executive Summary of the project is short", "Executive Summary");
        assert_eq!(untouched, "Executive Summary of the project is short");
    }

    #[tokio::test]
    async fn returns_trimmed_section() {
        let gateway = ScriptedGateway::new().respond_to(
            "Executive Summary",
            "```\nThe initiative replaces manual invoice entry.\n```",
        );
        let extractor = SectionExtractor::new(Arc::new(gateway), 20);
        let section = extractor
            .extract("# Executive Summary\n...", "Executive Summary")
            .await
            .unwrap();
        assert_eq!(section, "The initiative replaces manual invoice entry.");
    }

    #[tokio::test]
    async fn short_section_is_rejected() {
        let gateway = ScriptedGateway::new().respond_to("Executive Summary", "  TBD  ");
        let extractor = SectionExtractor::new(Arc::new(gateway), 20);
        let err = extractor.extract("doc", "Executive Summary").await.unwrap_err();
        match err {
            DocflowError::ExtractionFailure { length, minimum, .. } => {
                assert_eq!(length, 3);
                assert_eq!(minimum, 20);
            }
            other => panic!("expected extraction failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn gateway_failure_propagates() {
        let gateway = ScriptedGateway::new().fail_on("Executive Summary");
        let extractor = SectionExtractor::new(Arc::new(gateway), 20);
        let err = extractor.extract("doc", "Executive Summary").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
