//! docflow Core
//!
//! Orchestrates the path from uploaded business documents to derived
//! artifacts:
//! - Masks names once per submission before any generation call
//! - Generates a requirements document and extracts sections from it
//! - Draws the as-is and to-be process flows concurrently
//! - Pauses an under-specified flow for user refinement without blocking
//!   its sibling
//!
//! # Example
//!
//! ```rust,ignore
//! use docflow_core::{ArtifactOrchestrator, OrchestratorConfig, RunRequest};
//!
//! let orchestrator = ArtifactOrchestrator::new(masker, gateway, OrchestratorConfig::default());
//! let response = orchestrator.run(&RunRequest::new(files, ids)).await?;
//! for request in response.refinements() {
//!     // ask the user for more detail, then:
//!     orchestrator.refine(&RefinementFollowUp::answering(request, detail)).await?;
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod extract;
pub mod flow;
pub mod orchestrator;
mod prompts;
pub mod refinement;
pub mod summary;
pub mod types;

pub use error::DocflowError;
pub use extract::SectionExtractor;
pub use flow::{sanitize_description, DiagramResult, FlowGenerator, DEFAULT_INSUFFICIENT_MESSAGE};
pub use orchestrator::{
    ArtifactOrchestrator, PACKAGE_CORPUS_ENTRY, PACKAGE_MANIFEST_ENTRY, PACKAGE_MAPPING_ENTRY,
};
pub use refinement::{
    allowed_transitions, validate_transition, FlowState, RefinementCache, RefinementCoordinator,
    REFINEMENT_SEPARATOR,
};
pub use summary::SummaryFallback;
pub use types::{
    fingerprint, ArtifactOutcome, CorrelationId, FlowContext, FlowKind, OrchestratorConfig,
    OutcomeSummary, RefinementFollowUp, RefinementRequest, ResponseSummary, RunRequest,
    RunResponse,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
