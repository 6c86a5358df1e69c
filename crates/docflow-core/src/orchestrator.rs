//! Artifact orchestration
//!
//! One run turns uploaded files into the requested artifacts:
//! 1. Validate the request and mask the whole submission once
//! 2. Package the masked corpus and mapping when requested
//! 3. Generate the document, or a fallback summary when only flows are wanted
//! 4. Attempt every requested flow concurrently
//! 5. Merge everything into one response keyed by artifact id
//!
//! Document-stage failures abort the run. A flow whose section or diagram
//! cannot be generated is reported as `failed` while its sibling proceeds.

use crate::error::DocflowError;
use crate::extract::{strip_code_fences, SectionExtractor};
use crate::flow::FlowGenerator;
use crate::prompts;
use crate::refinement::{RefinementCache, RefinementCoordinator};
use crate::summary::SummaryFallback;
use crate::types::{
    ArtifactOutcome, CorrelationId, FlowContext, FlowKind, OrchestratorConfig, RefinementFollowUp,
    RunRequest, RunResponse,
};
use docflow_artifact::{ArtifactId, ContentHash, EncodeError, Encoders, GeneratedArtifact, PackageEntry};
use docflow_gateway::TextGenerationGateway;
use docflow_mask::{EntityMasker, MaskedCorpus, SubmissionCorpus};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Masked corpus entry in the anonymization package
pub const PACKAGE_CORPUS_ENTRY: &str = "masked_corpus.txt";
/// Entity mapping entry in the anonymization package
pub const PACKAGE_MAPPING_ENTRY: &str = "entity_mapping.json";
/// Manifest entry in the anonymization package
pub const PACKAGE_MANIFEST_ENTRY: &str = "manifest.json";

#[derive(Debug, Serialize)]
struct PackageManifest<'a> {
    correlation_id: CorrelationId,
    generated_at: chrono::DateTime<chrono::Utc>,
    generator: String,
    files: &'a [String],
    entities_masked: usize,
    replacements: usize,
    masked_corpus_digest: ContentHash,
}

/// Runs the full pipeline for one submission
pub struct ArtifactOrchestrator {
    masker: EntityMasker,
    gateway: Arc<dyn TextGenerationGateway>,
    extractor: SectionExtractor,
    summary: SummaryFallback,
    refinement: RefinementCoordinator,
    encoders: Encoders,
    config: OrchestratorConfig,
}

impl ArtifactOrchestrator {
    /// Create an orchestrator with the default encoders
    #[must_use]
    pub fn new(
        masker: EntityMasker,
        gateway: Arc<dyn TextGenerationGateway>,
        config: OrchestratorConfig,
    ) -> Self {
        let encoders = Encoders::default();
        let extractor = SectionExtractor::new(gateway.clone(), config.min_section_chars);
        let refinement = RefinementCoordinator::new(
            FlowGenerator::new(gateway.clone()),
            extractor.clone(),
            encoders.diagram.clone(),
            RefinementCache::with_ttl(
                config.refinement_capacity,
                Duration::from_secs(config.refinement_ttl_secs),
            ),
        );
        Self {
            masker,
            summary: SummaryFallback::new(gateway.clone(), config.summary_placeholder.clone()),
            gateway,
            extractor,
            refinement,
            encoders,
            config,
        }
    }

    /// With custom encoders
    #[must_use]
    pub fn with_encoders(mut self, encoders: Encoders) -> Self {
        self.refinement = self.refinement.with_diagram_encoder(encoders.diagram.clone());
        self.encoders = encoders;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Refinement coordinator shared with follow-ups
    #[inline]
    #[must_use]
    pub fn refinement(&self) -> &RefinementCoordinator {
        &self.refinement
    }

    /// Produce every requested artifact
    ///
    /// # Errors
    /// - `InvalidRequest` without files, text or requested artifacts
    /// - `MaskingFailure` if entity detection fails
    /// - `GenerationFailure` or `ExtractionFailure` from the document stage
    /// - `Encoding` if the document or package cannot be encoded
    pub async fn run(&self, request: &RunRequest) -> Result<RunResponse, DocflowError> {
        if request.files.is_empty() {
            return Err(DocflowError::invalid("At least one file must be submitted."));
        }
        if request.artifacts.is_empty() {
            return Err(DocflowError::invalid("At least one artifact must be requested."));
        }

        let correlation_id = CorrelationId::new();
        let corpus = SubmissionCorpus::from_files(&request.files);
        if corpus.is_blank() {
            return Err(DocflowError::invalid("The submitted files contain no text."));
        }
        tracing::info!(
            %correlation_id,
            files = request.files.len(),
            artifacts = request.artifacts.len(),
            "Run started"
        );

        let masked = self.masker.mask(&corpus).await?;
        let mut artifacts = BTreeMap::new();

        if request.artifacts.contains(&ArtifactId::AnonymizationPackage) {
            let package = self.package(correlation_id, &corpus, &masked)?;
            tracing::info!(%correlation_id, size_bytes = package.payload().len(), "Anonymization package built");
            artifacts.insert(ArtifactId::AnonymizationPackage, ArtifactOutcome::Complete(package));
        }

        let flows = request.flows();
        let context = if request.artifacts.contains(&ArtifactId::Document) {
            let (document, context) = self.document(correlation_id, &masked).await?;
            artifacts.insert(ArtifactId::Document, ArtifactOutcome::Complete(document));
            Some(context)
        } else if flows.is_empty() {
            None
        } else {
            let summary = self.summary.summarize(&masked.text).await;
            Some(FlowContext {
                summary_text: masked.mapping.unmask(&summary),
                source_document: None,
            })
        };

        if let Some(context) = context.as_ref().filter(|_| !flows.is_empty()) {
            let branches = flows.iter().map(|flow| {
                self.refinement.initial(
                    correlation_id,
                    *flow,
                    self.config.section_label(*flow),
                    context,
                )
            });
            let outcomes = join_all(branches).await;
            for (flow, outcome) in flows.iter().zip(outcomes) {
                let outcome = outcome?;
                tracing::info!(%correlation_id, %flow, status = outcome.status(), "Flow finished");
                artifacts.insert(flow.artifact_id(), outcome);
            }
        }

        tracing::info!(%correlation_id, artifacts = artifacts.len(), "Run finished");
        Ok(RunResponse {
            correlation_id,
            artifacts,
        })
    }

    /// Complete a pending flow with user-supplied detail
    ///
    /// # Errors
    /// See [`RefinementCoordinator::follow_up`]
    pub async fn refine(&self, follow_up: &RefinementFollowUp) -> Result<GeneratedArtifact, DocflowError> {
        self.refinement.follow_up(follow_up).await
    }

    /// Discard a pending refinement
    pub async fn cancel(&self, correlation_id: CorrelationId, flow: FlowKind) -> bool {
        self.refinement.cancel(correlation_id, flow).await
    }

    async fn document(
        &self,
        correlation_id: CorrelationId,
        masked: &MaskedCorpus,
    ) -> Result<(GeneratedArtifact, FlowContext), DocflowError> {
        let config = &self.config;
        let prompt = prompts::render(
            prompts::DOCUMENT,
            &[
                ("executive_summary", config.executive_summary_section.as_str()),
                ("as_is", config.as_is_section.as_str()),
                ("to_be", config.to_be_section.as_str()),
                ("corpus", masked.text.as_str()),
            ],
        );
        tracing::debug!(%correlation_id, prompt_chars = prompt.len(), "Requesting document");
        let generated = self
            .gateway
            .generate(Some(prompts::DOCUMENT_SYSTEM), &prompt)
            .await?;
        let document = masked.mapping.unmask(strip_code_fences(&generated));
        tracing::info!(%correlation_id, chars = document.len(), "Document generated");

        let summary = self
            .extractor
            .extract(&document, &config.executive_summary_section)
            .await?;
        let artifact = self
            .encoders
            .document
            .encode_document(&config.document_name, &document)?;

        Ok((
            artifact,
            FlowContext {
                summary_text: summary,
                source_document: Some(document),
            },
        ))
    }

    fn package(
        &self,
        correlation_id: CorrelationId,
        corpus: &SubmissionCorpus,
        masked: &MaskedCorpus,
    ) -> Result<GeneratedArtifact, DocflowError> {
        let manifest = PackageManifest {
            correlation_id,
            generated_at: chrono::Utc::now(),
            generator: format!("docflow {}", crate::VERSION),
            files: corpus.file_names(),
            entities_masked: masked.mapping.len(),
            replacements: masked.stats.replacements,
            masked_corpus_digest: ContentHash::compute(masked.text.as_bytes()),
        };
        let entries = [
            PackageEntry::new(PACKAGE_CORPUS_ENTRY, masked.text.as_bytes()),
            PackageEntry::new(PACKAGE_MAPPING_ENTRY, to_json(masked.mapping.as_ref())?),
            PackageEntry::new(PACKAGE_MANIFEST_ENTRY, to_json(&manifest)?),
        ];
        Ok(self
            .encoders
            .package
            .encode_package(&self.config.package_name, &entries)?)
    }
}

impl std::fmt::Debug for ArtifactOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactOrchestrator")
            .field("config", &self.config)
            .field("refinement", &self.refinement)
            .finish_non_exhaustive()
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, EncodeError> {
    serde_json::to_vec_pretty(value).map_err(|e| EncodeError::InvalidContent {
        format: "json",
        reason: e.to_string(),
    })
}
