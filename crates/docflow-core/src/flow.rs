//! Flow diagram generation
//!
//! Converts a process description into draw.io `mxGraphModel` markup:
//! - Builds the prompt from fixed structural rules, the description and context
//! - Scans the answer for one complete `<mxGraphModel>` element
//! - Treats a missing element or an insufficient-detail marker as a decline
//!
//! A decline is a normal result ([`DiagramResult::InsufficientDetail`]),
//! only gateway failures are errors.

use crate::error::DocflowError;
use crate::prompts;
use docflow_gateway::TextGenerationGateway;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Message used when the generator declines without explanation
pub const DEFAULT_INSUFFICIENT_MESSAGE: &str =
    "The process description does not contain enough detail to draw a diagram. Describe the steps in order and who performs each one.";

/// Bare marker accepted in place of the tagged form
pub const INSUFFICIENT_MARKER: &str = "INSUFFICIENT_DETAIL";

static GRAPH_MODEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<mxGraphModel\b[^>]*>.*</mxGraphModel>").expect("valid graph model regex")
});

static INSUFFICIENT_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<insufficient-detail>(.*?)</insufficient-detail>")
        .expect("valid insufficient-detail regex")
});

static LIST_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[-*+•‣◦▪]|\d{1,3}[.)]|\(\d{1,3}\))\s+").expect("valid list marker regex")
});

/// Outcome of one diagram attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramResult {
    /// Complete `mxGraphModel` markup
    Ok {
        /// Diagram markup
        markup: String,
    },
    /// Generator declined for lack of detail
    InsufficientDetail {
        /// Explanation for the user
        message: String,
    },
}

impl DiagramResult {
    /// Interpret a raw generator answer
    #[must_use]
    pub fn from_response(response: &str) -> Self {
        if let Some(captures) = INSUFFICIENT_TAG.captures(response) {
            let message = captures.get(1).map_or("", |m| m.as_str());
            return Self::insufficient(message);
        }
        if let Some(index) = response.find(INSUFFICIENT_MARKER) {
            let rest = &response[index + INSUFFICIENT_MARKER.len()..];
            return Self::insufficient(rest.trim_start_matches([':', '-', ' ']));
        }
        match GRAPH_MODEL.find(response) {
            Some(found) => Self::Ok {
                markup: found.as_str().to_string(),
            },
            None => Self::insufficient(""),
        }
    }

    fn insufficient(message: &str) -> Self {
        let message = message.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::InsufficientDetail {
            message: if message.is_empty() {
                DEFAULT_INSUFFICIENT_MESSAGE.to_string()
            } else {
                message
            },
        }
    }
}

/// Turns process descriptions into diagram markup
#[derive(Clone)]
pub struct FlowGenerator {
    gateway: Arc<dyn TextGenerationGateway>,
}

impl FlowGenerator {
    /// Create a generator
    #[inline]
    #[must_use]
    pub fn new(gateway: Arc<dyn TextGenerationGateway>) -> Self {
        Self { gateway }
    }

    /// Draw `description` with `context` as background
    ///
    /// # Errors
    /// Returns `GenerationFailure` if the gateway call fails
    pub async fn diagram(&self, description: &str, context: &str) -> Result<DiagramResult, DocflowError> {
        let prompt = prompts::render(
            prompts::FLOW,
            &[("description", description), ("context", context)],
        );
        let response = self.gateway.generate(Some(prompts::FLOW_SYSTEM), &prompt).await?;
        let result = DiagramResult::from_response(&response);
        tracing::debug!(
            description_chars = description.len(),
            response_chars = response.len(),
            complete = matches!(result, DiagramResult::Ok { .. }),
            "Diagram attempt finished"
        );
        Ok(result)
    }
}

impl std::fmt::Debug for FlowGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowGenerator").finish_non_exhaustive()
    }
}

/// Clean an extracted section before diagramming
///
/// Drops blank lines and decorative separators, strips list markers and
/// heading hashes, and trims every line.
#[must_use]
pub fn sanitize_description(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_separator(line))
        .map(|line| {
            let line = line.trim_start_matches('#').trim_start();
            LIST_MARKER.replace(line, "").into_owned()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_separator(line: &str) -> bool {
    line.chars().count() >= 3
        && line
            .chars()
            .all(|c| matches!(c, '-' | '=' | '*' | '_' | '~' | '#' | '•' | '─' | '━' | ' '))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow_test_utils::{fixtures, ScriptedGateway};
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_model_from_chatter() {
        let response = format!("Here is the diagram:\n```xml\n{}\n```\nLet me know!", fixtures::SIMPLE_GRAPH_MODEL);
        match DiagramResult::from_response(&response) {
            DiagramResult::Ok { markup } => assert_eq!(markup, fixtures::SIMPLE_GRAPH_MODEL),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn tagged_marker_carries_message() {
        let result = DiagramResult::from_response(
            "<insufficient-detail>\n  Which team approves   the request?\n</insufficient-detail>",
        );
        assert_eq!(
            result,
            DiagramResult::InsufficientDetail {
                message: "Which team approves the request?".into()
            }
        );
    }

    #[test]
    fn bare_marker_wins_over_markup() {
        let response = format!("INSUFFICIENT_DETAIL: no steps given\n{}", fixtures::SIMPLE_GRAPH_MODEL);
        match DiagramResult::from_response(&response) {
            DiagramResult::InsufficientDetail { message } => assert!(message.starts_with("no steps given")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_model_uses_default_message() {
        assert_eq!(
            DiagramResult::from_response("<mxGraphModel><root>"),
            DiagramResult::InsufficientDetail {
                message: DEFAULT_INSUFFICIENT_MESSAGE.into()
            }
        );
    }

    #[test]
    fn sanitize_strips_decoration() {
        let raw = "## Steps\n\n-----\n1. Clerk receives invoice\n  - Checks PO number\n\n* Manager approves\n(2) Finance pays\n=====\n";
        assert_eq!(
            sanitize_description(raw),
            "Steps\nClerk receives invoice\nChecks PO number\nManager approves\nFinance pays"
        );
    }

    #[test]
    fn sanitize_keeps_plain_prose() {
        assert_eq!(sanitize_description("The clerk - not the manager - files it."), "The clerk - not the manager - files it.");
    }

    #[tokio::test]
    async fn gateway_failure_is_an_error() {
        let generator = FlowGenerator::new(Arc::new(ScriptedGateway::new().fail_on("Draw the process")));
        let err = generator.diagram("steps", "context").await.unwrap_err();
        assert!(matches!(err, DocflowError::GenerationFailure(_)));
    }

    #[tokio::test]
    async fn prompt_carries_description_and_context() {
        let gateway = Arc::new(ScriptedGateway::new().respond_to("Draw the process", fixtures::SIMPLE_GRAPH_MODEL));
        let generator = FlowGenerator::new(gateway.clone());
        let result = generator.diagram("Clerk files invoice", "AP automation").await.unwrap();
        assert!(matches!(result, DiagramResult::Ok { .. }));

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].prompt.contains("Clerk files invoice"));
        assert!(calls[0].prompt.contains("AP automation"));
        assert!(calls[0].system.as_deref().unwrap_or_default().contains("mxGraphModel"));
    }
}
