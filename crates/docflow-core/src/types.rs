//! Core types for docflow
//!
//! Defines the values exchanged with callers:
//! - Correlation identifiers and flow kinds
//! - Orchestrator configuration
//! - Run requests, per-artifact outcomes and the response envelope
//! - Refinement requests and follow-ups

use docflow_artifact::{ArtifactId, ArtifactSummary, ContentHash, GeneratedArtifact};
use docflow_mask::SourceFile;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Identifier linking an initial run to its refinement follow-ups
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CorrelationId(pub Ulid);

impl CorrelationId {
    /// Generate new correlation ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CorrelationId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(Self)
    }
}

/// A diagrammable process flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FlowKind {
    /// Current-state process
    #[serde(rename = "as-is-flow")]
    AsIs,
    /// Future-state process
    #[serde(rename = "to-be-flow")]
    ToBe,
}

impl FlowKind {
    /// Both flows in response order
    pub const ALL: [FlowKind; 2] = [FlowKind::AsIs, FlowKind::ToBe];

    /// Artifact identifier of this flow
    #[inline]
    #[must_use]
    pub const fn artifact_id(&self) -> ArtifactId {
        match self {
            Self::AsIs => ArtifactId::AsIsFlow,
            Self::ToBe => ArtifactId::ToBeFlow,
        }
    }

    /// Flow for an artifact identifier, if it names one
    #[inline]
    #[must_use]
    pub const fn from_artifact_id(id: ArtifactId) -> Option<Self> {
        match id {
            ArtifactId::AsIsFlow => Some(Self::AsIs),
            ArtifactId::ToBeFlow => Some(Self::ToBe),
            ArtifactId::Document | ArtifactId::AnonymizationPackage => None,
        }
    }

    /// Wire name
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.artifact_id().as_str()
    }

    /// Default artifact base name
    #[inline]
    #[must_use]
    pub const fn default_name(&self) -> &'static str {
        match self {
            Self::AsIs => "As-Is Process Flow",
            Self::ToBe => "To-Be Process Flow",
        }
    }

    /// Prompt shown when there is no source document to draw from
    #[inline]
    #[must_use]
    pub const fn describe_prompt(&self) -> &'static str {
        match self {
            Self::AsIs => {
                "Describe the current (as-is) process step by step, including who performs each step and where decisions are made."
            }
            Self::ToBe => {
                "Describe the proposed (to-be) process step by step, including who performs each step and where decisions are made."
            }
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Shortest extracted section accepted as plausible
    #[serde(default = "default_min_section_chars")]
    pub min_section_chars: usize,
    /// Heading of the executive summary section
    #[serde(default = "default_executive_summary_section")]
    pub executive_summary_section: String,
    /// Heading of the current-state process section
    #[serde(default = "default_as_is_section")]
    pub as_is_section: String,
    /// Heading of the future-state process section
    #[serde(default = "default_to_be_section")]
    pub to_be_section: String,
    /// Base name of the generated document
    #[serde(default = "default_document_name")]
    pub document_name: String,
    /// Base name of the anonymization package
    #[serde(default = "default_package_name")]
    pub package_name: String,
    /// Context used when no summary can be generated
    #[serde(default = "default_summary_placeholder")]
    pub summary_placeholder: String,
    /// Lifetime of a pending refinement
    #[serde(default = "default_refinement_ttl_secs")]
    pub refinement_ttl_secs: u64,
    /// Most pending refinements kept at once
    #[serde(default = "default_refinement_capacity")]
    pub refinement_capacity: u64,
}

fn default_min_section_chars() -> usize {
    20
}

fn default_executive_summary_section() -> String {
    "Executive Summary".to_string()
}

fn default_as_is_section() -> String {
    "Current State Process".to_string()
}

fn default_to_be_section() -> String {
    "Future State Process".to_string()
}

fn default_document_name() -> String {
    "Requirements Document".to_string()
}

fn default_package_name() -> String {
    "Anonymization Package".to_string()
}

fn default_summary_placeholder() -> String {
    "No summary is available for the submitted material.".to_string()
}

fn default_refinement_ttl_secs() -> u64 {
    3600
}

fn default_refinement_capacity() -> u64 {
    10_000
}

impl OrchestratorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With minimum section length
    #[inline]
    #[must_use]
    pub fn with_min_section_chars(mut self, min: usize) -> Self {
        self.min_section_chars = min;
        self
    }

    /// With refinement lifetime
    #[inline]
    #[must_use]
    pub fn with_refinement_ttl_secs(mut self, secs: u64) -> Self {
        self.refinement_ttl_secs = secs;
        self
    }

    /// Section heading describing a flow
    #[must_use]
    pub fn section_label(&self, flow: FlowKind) -> &str {
        match flow {
            FlowKind::AsIs => &self.as_is_section,
            FlowKind::ToBe => &self.to_be_section,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            min_section_chars: default_min_section_chars(),
            executive_summary_section: default_executive_summary_section(),
            as_is_section: default_as_is_section(),
            to_be_section: default_to_be_section(),
            document_name: default_document_name(),
            package_name: default_package_name(),
            summary_placeholder: default_summary_placeholder(),
            refinement_ttl_secs: default_refinement_ttl_secs(),
            refinement_capacity: default_refinement_capacity(),
        }
    }
}

/// Files and requested artifacts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Uploaded files in submission order
    pub files: Vec<SourceFile>,
    /// Requested artifacts; duplicates collapse
    pub artifacts: BTreeSet<ArtifactId>,
}

impl RunRequest {
    /// Create a request
    #[must_use]
    pub fn new(files: Vec<SourceFile>, artifacts: impl IntoIterator<Item = ArtifactId>) -> Self {
        Self {
            files,
            artifacts: artifacts.into_iter().collect(),
        }
    }

    /// Requested flows in response order
    #[must_use]
    pub fn flows(&self) -> Vec<FlowKind> {
        self.artifacts
            .iter()
            .filter_map(|id| FlowKind::from_artifact_id(*id))
            .collect()
    }
}

/// Shared context for every flow branch of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowContext {
    /// Unmasked contextual summary
    pub summary_text: String,
    /// Unmasked generated document, when one was requested
    pub source_document: Option<String>,
}

/// Pending flow awaiting more detail from the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementRequest {
    /// Run this request belongs to
    pub correlation_id: CorrelationId,
    /// Flow awaiting refinement
    pub flow: FlowKind,
    /// Human-readable reason
    pub message: String,
    /// Description the generator declined
    pub original_text: String,
    /// Context summary used for the flow
    pub context: String,
    /// Digest binding the fields above
    pub fingerprint: ContentHash,
}

impl RefinementRequest {
    /// Create a request and fingerprint it
    #[must_use]
    pub fn new(
        correlation_id: CorrelationId,
        flow: FlowKind,
        message: impl Into<String>,
        original_text: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        let original_text = original_text.into();
        let context = context.into();
        let fingerprint = fingerprint(correlation_id, flow, &original_text, &context);
        Self {
            correlation_id,
            flow,
            message: message.into(),
            original_text,
            context,
            fingerprint,
        }
    }
}

/// Digest over the fields a follow-up echoes back
///
/// Unkeyed: it catches truncated or partially edited echoes, not a caller
/// that recomputes it over new fields.
#[must_use]
pub fn fingerprint(
    correlation_id: CorrelationId,
    flow: FlowKind,
    original_text: &str,
    context: &str,
) -> ContentHash {
    let correlation = correlation_id.to_string();
    ContentHash::compute_fields(&[&correlation, flow.as_str(), original_text, context])
}

/// Refinement detail supplied by the user for a pending flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementFollowUp {
    /// Run the flow belongs to
    pub correlation_id: CorrelationId,
    /// Flow being refined
    pub flow: FlowKind,
    /// Echoed original description
    pub original_text: String,
    /// Echoed context summary
    pub context: String,
    /// Echoed fingerprint
    pub fingerprint: ContentHash,
    /// Additional detail from the user
    pub detail: String,
    /// Artifact base name; the flow's default name when absent
    #[serde(default)]
    pub base_name: Option<String>,
}

impl RefinementFollowUp {
    /// Follow-up answering a refinement request
    #[must_use]
    pub fn answering(request: &RefinementRequest, detail: impl Into<String>) -> Self {
        Self {
            correlation_id: request.correlation_id,
            flow: request.flow,
            original_text: request.original_text.clone(),
            context: request.context.clone(),
            fingerprint: request.fingerprint,
            detail: detail.into(),
            base_name: None,
        }
    }

    /// With artifact base name
    #[inline]
    #[must_use]
    pub fn with_base_name(mut self, name: impl Into<String>) -> Self {
        self.base_name = Some(name.into());
        self
    }

    /// Whether the echoed fields match the echoed fingerprint
    #[must_use]
    pub fn fingerprint_matches(&self) -> bool {
        fingerprint(
            self.correlation_id,
            self.flow,
            &self.original_text,
            &self.context,
        ) == self.fingerprint
    }
}

/// Result for one requested artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtifactOutcome {
    /// Artifact was produced
    Complete(GeneratedArtifact),
    /// Flow is paused until the user adds detail
    NeedsRefinement(RefinementRequest),
    /// Flow failed in isolation
    Failed {
        /// User-facing reason
        message: String,
    },
}

impl ArtifactOutcome {
    /// Completed artifact, if any
    #[must_use]
    pub fn artifact(&self) -> Option<&GeneratedArtifact> {
        match self {
            Self::Complete(artifact) => Some(artifact),
            _ => None,
        }
    }

    /// Pending refinement, if any
    #[must_use]
    pub fn refinement(&self) -> Option<&RefinementRequest> {
        match self {
            Self::NeedsRefinement(request) => Some(request),
            _ => None,
        }
    }

    /// Short status label for logs
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Complete(_) => "complete",
            Self::NeedsRefinement(_) => "needs_refinement",
            Self::Failed { .. } => "failed",
        }
    }

    /// Outcome without payload bytes
    #[must_use]
    pub fn summary(&self) -> OutcomeSummary {
        match self {
            Self::Complete(artifact) => OutcomeSummary::Complete(artifact.summary()),
            Self::NeedsRefinement(request) => OutcomeSummary::NeedsRefinement {
                flow: request.flow,
                message: request.message.clone(),
            },
            Self::Failed { message } => OutcomeSummary::Failed {
                message: message.clone(),
            },
        }
    }
}

/// Outcome descriptor without payload bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeSummary {
    /// Artifact was produced
    Complete(ArtifactSummary),
    /// Flow awaits refinement
    NeedsRefinement {
        /// Pending flow
        flow: FlowKind,
        /// Reason shown to the user
        message: String,
    },
    /// Flow failed in isolation
    Failed {
        /// Reason shown to the user
        message: String,
    },
}

/// Response envelope for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResponse {
    /// Identifier for follow-ups
    pub correlation_id: CorrelationId,
    /// One outcome per requested artifact
    pub artifacts: BTreeMap<ArtifactId, ArtifactOutcome>,
}

impl RunResponse {
    /// Outcome for an artifact
    #[must_use]
    pub fn get(&self, id: ArtifactId) -> Option<&ArtifactOutcome> {
        self.artifacts.get(&id)
    }

    /// Pending refinements
    pub fn refinements(&self) -> impl Iterator<Item = &RefinementRequest> {
        self.artifacts.values().filter_map(ArtifactOutcome::refinement)
    }

    /// Envelope without payload bytes
    #[must_use]
    pub fn summary(&self) -> ResponseSummary {
        ResponseSummary {
            correlation_id: self.correlation_id,
            artifacts: self
                .artifacts
                .iter()
                .map(|(id, outcome)| (*id, outcome.summary()))
                .collect(),
        }
    }
}

/// [`RunResponse`] without payload bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSummary {
    /// Identifier for follow-ups
    pub correlation_id: CorrelationId,
    /// One outcome per requested artifact
    pub artifacts: BTreeMap<ArtifactId, OutcomeSummary>,
}
