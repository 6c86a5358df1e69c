//! Error types for docflow orchestration
//!
//! One taxonomy for every terminal failure of a run or follow-up:
//! - Invalid requests (no files, no artifacts, stale refinements)
//! - Masking and generation failures from the collaborators
//! - Section extraction that produced implausible text
//! - Refinements that still lack detail
//!
//! A generator declining to draw a diagram is not an error; it becomes a
//! [`crate::ArtifactOutcome::NeedsRefinement`] entry.

use crate::refinement::FlowState;
use crate::types::FlowKind;
use docflow_artifact::{EncodeError, UnknownArtifactId};
use docflow_gateway::GenerationError;
use docflow_mask::MaskingError;

/// Main docflow error type
#[derive(Debug, thiserror::Error)]
pub enum DocflowError {
    /// Request is malformed or refers to nothing pending
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Entity detection failed; nothing was sent for generation
    #[error("masking failed: {0}")]
    MaskingFailure(#[from] MaskingError),

    /// Text generation failed
    #[error("generation failed: {0}")]
    GenerationFailure(#[from] GenerationError),

    /// Extracted section is empty or too short
    #[error("extraction of section '{section}' returned {length} characters, at least {minimum} required")]
    ExtractionFailure {
        /// Requested section heading
        section: String,
        /// Characters returned after trimming
        length: usize,
        /// Configured minimum
        minimum: usize,
    },

    /// Follow-up detail was still not enough to draw the flow
    #[error("{flow} still lacks detail after refinement: {message}")]
    RefinementInsufficient {
        /// Flow being refined
        flow: FlowKind,
        /// Generator's explanation
        message: String,
    },

    /// Artifact encoding failed
    #[error("encoding failed: {0}")]
    Encoding(#[from] EncodeError),

    /// Flow state machine rejected a transition
    #[error("illegal flow transition {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current state
        from: FlowState,
        /// Requested state
        to: FlowState,
    },
}

impl DocflowError {
    /// Create an invalid request error
    #[inline]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::GenerationFailure(_))
    }

    /// Message suitable for showing to the person who made the request
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidRequest(message) => message.clone(),
            Self::MaskingFailure(_) => {
                "Names in the submitted files could not be detected, so nothing was sent for generation. Please try again later.".to_string()
            }
            Self::GenerationFailure(_) => {
                "The text generation service could not complete the request. Please try again.".to_string()
            }
            Self::ExtractionFailure { section, .. } => {
                format!("The generated document did not contain a usable \"{section}\" section.")
            }
            Self::RefinementInsufficient { message, .. } => message.clone(),
            Self::Encoding(_) => "A generated artifact could not be packaged.".to_string(),
            Self::IllegalTransition { .. } => {
                "This refinement request is no longer valid.".to_string()
            }
        }
    }
}

impl From<UnknownArtifactId> for DocflowError {
    fn from(err: UnknownArtifactId) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}
