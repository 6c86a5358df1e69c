//! Per-flow refinement
//!
//! Each requested flow moves through a small state machine:
//!
//! ```text
//! Pending ──► Complete
//!    │
//!    └──► NeedsRefinement ──► Complete
//! ```
//!
//! Pending refinements live in a short-lived cache keyed by correlation id
//! and flow. A follow-up prefers the cached text; once the entry has
//! expired it falls back to the echoed fields, which must match their
//! fingerprint.

use crate::error::DocflowError;
use crate::extract::SectionExtractor;
use crate::flow::{sanitize_description, DiagramResult, FlowGenerator};
use crate::types::{
    ArtifactOutcome, CorrelationId, FlowContext, FlowKind, RefinementFollowUp, RefinementRequest,
};
use docflow_artifact::{DiagramEncoder, GeneratedArtifact};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Separator placed between the original description and added detail
pub const REFINEMENT_SEPARATOR: &str = "\n\nAdditional detail provided by the user:\n";

/// State of one flow within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowState {
    /// Initial step not finished
    Pending,
    /// Waiting for more detail from the user
    NeedsRefinement,
    /// Diagram produced
    Complete,
}

/// Validates a flow state transition
///
/// # Errors
/// Returns `IllegalTransition` for any edge not in [`allowed_transitions`]
pub fn validate_transition(from: FlowState, to: FlowState) -> Result<(), DocflowError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(DocflowError::IllegalTransition { from, to })
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: FlowState) -> &'static [FlowState] {
    use FlowState::*;
    match from {
        Pending => &[NeedsRefinement, Complete],
        NeedsRefinement => &[Complete],
        Complete => &[],
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Pending(Arc<RefinementRequest>),
    Complete,
}

impl Entry {
    fn state(&self) -> FlowState {
        match self {
            Self::Pending(_) => FlowState::NeedsRefinement,
            Self::Complete => FlowState::Complete,
        }
    }
}

/// TTL cache of flow states for recent runs
#[derive(Debug, Clone)]
pub struct RefinementCache {
    inner: Cache<(CorrelationId, FlowKind), Entry>,
}

impl RefinementCache {
    /// Create cache with capacity and time-based expiration
    #[inline]
    #[must_use]
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Pending request for a flow, if still cached
    pub async fn pending(&self, correlation_id: CorrelationId, flow: FlowKind) -> Option<Arc<RefinementRequest>> {
        match self.inner.get(&(correlation_id, flow)).await {
            Some(Entry::Pending(request)) => Some(request),
            _ => None,
        }
    }

    /// Recorded state for a flow, if still cached
    pub async fn state(&self, correlation_id: CorrelationId, flow: FlowKind) -> Option<FlowState> {
        self.inner
            .get(&(correlation_id, flow))
            .await
            .map(|entry| entry.state())
    }

    async fn record_pending(&self, request: RefinementRequest) {
        let key = (request.correlation_id, request.flow);
        self.inner.insert(key, Entry::Pending(Arc::new(request))).await;
    }

    async fn record_complete(&self, correlation_id: CorrelationId, flow: FlowKind) {
        self.inner.insert((correlation_id, flow), Entry::Complete).await;
    }

    async fn remove_pending(&self, correlation_id: CorrelationId, flow: FlowKind) -> bool {
        let key = (correlation_id, flow);
        match self.inner.get(&key).await {
            Some(Entry::Pending(_)) => {
                self.inner.invalidate(&key).await;
                true
            }
            _ => false,
        }
    }
}

/// Drives each flow from its initial attempt to completion
#[derive(Clone)]
pub struct RefinementCoordinator {
    generator: FlowGenerator,
    extractor: SectionExtractor,
    diagram_encoder: Arc<dyn DiagramEncoder>,
    cache: RefinementCache,
}

impl RefinementCoordinator {
    /// Create a coordinator
    #[must_use]
    pub fn new(
        generator: FlowGenerator,
        extractor: SectionExtractor,
        diagram_encoder: Arc<dyn DiagramEncoder>,
        cache: RefinementCache,
    ) -> Self {
        Self {
            generator,
            extractor,
            diagram_encoder,
            cache,
        }
    }

    /// Replace the diagram encoder
    #[inline]
    #[must_use]
    pub fn with_diagram_encoder(mut self, encoder: Arc<dyn DiagramEncoder>) -> Self {
        self.diagram_encoder = encoder;
        self
    }

    /// Cache of flow states
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &RefinementCache {
        &self.cache
    }

    /// First attempt at a flow
    ///
    /// Without a source document the flow goes straight to
    /// `NeedsRefinement`. Section extraction, diagram generation and encoding
    /// failures become a `Failed` outcome for this flow only.
    ///
    /// # Errors
    /// `IllegalTransition` if the state table rejects a step
    pub async fn initial(
        &self,
        correlation_id: CorrelationId,
        flow: FlowKind,
        section_label: &str,
        context: &FlowContext,
    ) -> Result<ArtifactOutcome, DocflowError> {
        let state = FlowState::Pending;

        let Some(document) = context.source_document.as_deref() else {
            validate_transition(state, FlowState::NeedsRefinement)?;
            let request = RefinementRequest::new(
                correlation_id,
                flow,
                flow.describe_prompt(),
                "",
                context.summary_text.as_str(),
            );
            self.cache.record_pending(request.clone()).await;
            tracing::info!(%correlation_id, %flow, "Flow awaits description");
            return Ok(ArtifactOutcome::NeedsRefinement(request));
        };

        let section = match self.extractor.extract(document, section_label).await {
            Ok(section) => section,
            Err(e) => return Ok(Self::isolate(correlation_id, flow, &e)),
        };
        let description = sanitize_description(&section);

        let result = match self.generator.diagram(&description, &context.summary_text).await {
            Ok(result) => result,
            Err(e) => return Ok(Self::isolate(correlation_id, flow, &e)),
        };

        match result {
            DiagramResult::Ok { markup } => {
                validate_transition(state, FlowState::Complete)?;
                match self.diagram_encoder.encode_diagram(flow.default_name(), &markup) {
                    Ok(artifact) => {
                        self.cache.record_complete(correlation_id, flow).await;
                        tracing::info!(%correlation_id, %flow, "Flow complete");
                        Ok(ArtifactOutcome::Complete(artifact))
                    }
                    Err(e) => Ok(Self::isolate(correlation_id, flow, &e.into())),
                }
            }
            DiagramResult::InsufficientDetail { message } => {
                validate_transition(state, FlowState::NeedsRefinement)?;
                let request = RefinementRequest::new(
                    correlation_id,
                    flow,
                    message,
                    description,
                    context.summary_text.as_str(),
                );
                self.cache.record_pending(request.clone()).await;
                tracing::info!(%correlation_id, %flow, "Flow needs refinement");
                Ok(ArtifactOutcome::NeedsRefinement(request))
            }
        }
    }

    /// Retry a pending flow with user-supplied detail
    ///
    /// # Errors
    /// - `InvalidRequest` for blank detail, a completed flow, or a
    ///   fingerprint mismatch when nothing is cached
    /// - `RefinementInsufficient` if the generator still declines
    /// - `GenerationFailure` or `Encoding` from the attempt itself
    pub async fn follow_up(&self, follow_up: &RefinementFollowUp) -> Result<GeneratedArtifact, DocflowError> {
        let RefinementFollowUp {
            correlation_id,
            flow,
            ..
        } = *follow_up;

        if follow_up.detail.trim().is_empty() {
            return Err(DocflowError::invalid("Refinement detail must not be empty."));
        }

        let (original_text, context) = match self.cache.state(correlation_id, flow).await {
            Some(FlowState::Complete) => {
                return Err(DocflowError::invalid(format!(
                    "The {flow} for this request is already complete."
                )));
            }
            _ => match self.cache.pending(correlation_id, flow).await {
                Some(request) => (request.original_text.clone(), request.context.clone()),
                None if follow_up.fingerprint_matches() => {
                    tracing::debug!(%correlation_id, %flow, "Refinement resolved from echoed fields");
                    (follow_up.original_text.clone(), follow_up.context.clone())
                }
                None => {
                    return Err(DocflowError::invalid(
                        "The refinement request does not match any pending flow.",
                    ));
                }
            },
        };

        let description = combine(&original_text, &follow_up.detail);
        match self.generator.diagram(&description, &context).await? {
            DiagramResult::InsufficientDetail { message } => {
                tracing::info!(%correlation_id, %flow, "Refinement still insufficient");
                Err(DocflowError::RefinementInsufficient { flow, message })
            }
            DiagramResult::Ok { markup } => {
                validate_transition(FlowState::NeedsRefinement, FlowState::Complete)?;
                let name = follow_up.base_name.as_deref().unwrap_or_else(|| flow.default_name());
                let artifact = self.diagram_encoder.encode_diagram(name, &markup)?;
                self.cache.record_complete(correlation_id, flow).await;
                tracing::info!(%correlation_id, %flow, "Flow complete after refinement");
                Ok(artifact)
            }
        }
    }

    /// Discard a pending refinement; returns whether one was pending
    pub async fn cancel(&self, correlation_id: CorrelationId, flow: FlowKind) -> bool {
        let removed = self.cache.remove_pending(correlation_id, flow).await;
        if removed {
            tracing::info!(%correlation_id, %flow, "Refinement cancelled");
        }
        removed
    }

    fn isolate(correlation_id: CorrelationId, flow: FlowKind, error: &DocflowError) -> ArtifactOutcome {
        tracing::warn!(%correlation_id, %flow, error = %error, "Flow failed in isolation");
        ArtifactOutcome::Failed {
            message: error.user_message(),
        }
    }
}

impl std::fmt::Debug for RefinementCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefinementCoordinator")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn combine(original: &str, detail: &str) -> String {
    let original = original.trim();
    let detail = detail.trim();
    if original.is_empty() {
        detail.to_string()
    } else {
        format!("{original}{REFINEMENT_SEPARATOR}{detail}")
    }
}
