//! End-to-end orchestration with a scripted gateway.
//!
//! Rules in a `ScriptedGateway` answer in insertion order, so narrower
//! rules are registered before broader ones.

use docflow_artifact::ArtifactId;
use docflow_core::{
    ArtifactOrchestrator, ArtifactOutcome, DocflowError, FlowKind, OrchestratorConfig,
    RefinementFollowUp, RunRequest, SectionExtractor,
};
use async_trait::async_trait;
use docflow_gateway::{GenerationError, TextGenerationGateway};
use docflow_mask::{EntityMasker, SourceFile};
use docflow_test_utils::fixtures::{
    self, extraction_needle, invoice_files, requirements_document, AS_IS_SECTION,
    DOCUMENT_NEEDLE, EXECUTIVE_SUMMARY, FLOW_NEEDLE, SUMMARY_NEEDLE, TO_BE_SECTION,
};
use docflow_test_utils::{ScriptedGateway, StaticRecognizer};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

const SUMMARY_TEXT: &str = "The accounts payable team will automate invoice matching.";
const VAGUE_AS_IS: &str = "Invoices are handled somehow by the team.";
const DETAILED_TO_BE: &str =
    "1. Invoice arrives by email\n2. System matches PO automatically\n3. Manager approves exceptions";

fn recognizer() -> StaticRecognizer {
    StaticRecognizer::default()
        .with_people(&["Jane Doe"])
        .with_organizations(&["Acme Corp"])
}

fn orchestrator(gateway: &ScriptedGateway, recognizer: StaticRecognizer) -> ArtifactOrchestrator {
    ArtifactOrchestrator::new(
        EntityMasker::new(Arc::new(recognizer)),
        Arc::new(gateway.clone()),
        OrchestratorConfig::default(),
    )
}

/// Gateway scripted for a document whose as-is section is too vague to draw
fn document_gateway() -> ScriptedGateway {
    ScriptedGateway::new()
        .respond_when(&[FLOW_NEEDLE, "Clerk receives"], fixtures::SIMPLE_GRAPH_MODEL)
        .respond_when(&[FLOW_NEEDLE, "handled somehow"], fixtures::INSUFFICIENT_ANSWER)
        .respond_when(&[FLOW_NEEDLE, "System matches PO"], fixtures::SIMPLE_GRAPH_MODEL)
        .respond_to(&extraction_needle(EXECUTIVE_SUMMARY), SUMMARY_TEXT)
        .respond_to(&extraction_needle(AS_IS_SECTION), VAGUE_AS_IS)
        .respond_to(&extraction_needle(TO_BE_SECTION), DETAILED_TO_BE)
        .respond_to(
            DOCUMENT_NEEDLE,
            &requirements_document(SUMMARY_TEXT, VAGUE_AS_IS, DETAILED_TO_BE),
        )
}

fn all_flows_and_document() -> RunRequest {
    RunRequest::new(
        invoice_files(),
        [ArtifactId::Document, ArtifactId::AsIsFlow, ArtifactId::ToBeFlow],
    )
}

#[tokio::test]
async fn vague_flow_pauses_while_detailed_flow_completes() {
    let gateway = document_gateway();
    let response = orchestrator(&gateway, recognizer())
        .run(&all_flows_and_document())
        .await
        .unwrap();

    assert_eq!(response.artifacts.len(), 3);
    assert!(response.get(ArtifactId::Document).unwrap().artifact().is_some());

    let to_be = response.get(ArtifactId::ToBeFlow).unwrap();
    assert_eq!(to_be.artifact().unwrap().name(), "To-Be_Process_Flow.drawio");

    let pending = response.get(ArtifactId::AsIsFlow).unwrap().refinement().unwrap();
    assert_eq!(pending.flow, FlowKind::AsIs);
    assert_eq!(pending.correlation_id, response.correlation_id);
    assert_eq!(pending.original_text, VAGUE_AS_IS);
    assert_eq!(pending.context, SUMMARY_TEXT);
    assert!(pending.message.contains("who approves invoices"));
    assert_eq!(response.refinements().count(), 1);
}

#[tokio::test]
async fn refinement_converges_in_one_follow_up() {
    let gateway = document_gateway();
    let orchestrator = orchestrator(&gateway, recognizer());
    let response = orchestrator.run(&all_flows_and_document()).await.unwrap();
    let pending = response.get(ArtifactId::AsIsFlow).unwrap().refinement().unwrap();

    let follow_up = RefinementFollowUp::answering(
        pending,
        "Clerk receives the invoice, keys it in, and the manager signs it off.",
    );
    let artifact = orchestrator.refine(&follow_up).await.unwrap();
    assert_eq!(artifact.name(), "As-Is_Process_Flow.drawio");
    assert!(artifact.verify());

    let second = orchestrator.refine(&follow_up).await.unwrap_err();
    assert!(matches!(second, DocflowError::InvalidRequest(_)));
}

#[tokio::test]
async fn diagram_failure_is_isolated_to_its_flow() {
    let gateway = ScriptedGateway::new()
        .fail_when(&[FLOW_NEEDLE, "handled somehow"])
        .respond_when(&[FLOW_NEEDLE, "System matches PO"], fixtures::SIMPLE_GRAPH_MODEL)
        .respond_to(&extraction_needle(EXECUTIVE_SUMMARY), SUMMARY_TEXT)
        .respond_to(&extraction_needle(AS_IS_SECTION), VAGUE_AS_IS)
        .respond_to(&extraction_needle(TO_BE_SECTION), DETAILED_TO_BE)
        .respond_to(
            DOCUMENT_NEEDLE,
            &requirements_document(SUMMARY_TEXT, VAGUE_AS_IS, DETAILED_TO_BE),
        );
    let response = orchestrator(&gateway, recognizer())
        .run(&all_flows_and_document())
        .await
        .unwrap();

    match response.get(ArtifactId::AsIsFlow).unwrap() {
        ArtifactOutcome::Failed { message } => assert!(!message.is_empty()),
        other => panic!("expected failed as-is flow, got {other:?}"),
    }
    assert!(response.get(ArtifactId::ToBeFlow).unwrap().artifact().is_some());
    assert!(response.get(ArtifactId::Document).unwrap().artifact().is_some());
}

/// Scripted document whose as-is section extraction is answered by `as_is`
fn gateway_with_as_is_extraction(as_is: Option<&str>) -> ScriptedGateway {
    let gateway = ScriptedGateway::new()
        .respond_when(&[FLOW_NEEDLE, "System matches PO"], fixtures::SIMPLE_GRAPH_MODEL)
        .respond_to(&extraction_needle(EXECUTIVE_SUMMARY), SUMMARY_TEXT);
    let gateway = match as_is {
        Some(text) => gateway.respond_to(&extraction_needle(AS_IS_SECTION), text),
        None => gateway.fail_on(&extraction_needle(AS_IS_SECTION)),
    };
    gateway
        .respond_to(&extraction_needle(TO_BE_SECTION), DETAILED_TO_BE)
        .respond_to(
            DOCUMENT_NEEDLE,
            &requirements_document(SUMMARY_TEXT, VAGUE_AS_IS, DETAILED_TO_BE),
        )
}

#[tokio::test]
async fn short_flow_section_fails_only_that_flow() {
    let gateway = gateway_with_as_is_extraction(Some("Done by hand."));
    let response = orchestrator(&gateway, recognizer())
        .run(&all_flows_and_document())
        .await
        .unwrap();

    match response.get(ArtifactId::AsIsFlow).unwrap() {
        ArtifactOutcome::Failed { message } => assert!(message.contains(AS_IS_SECTION)),
        other => panic!("expected failed as-is flow, got {other:?}"),
    }
    assert!(response.get(ArtifactId::ToBeFlow).unwrap().artifact().is_some());
    assert!(response.get(ArtifactId::Document).unwrap().artifact().is_some());
    assert_eq!(gateway.count_calls(FLOW_NEEDLE), 1);
}

#[tokio::test]
async fn failed_flow_extraction_call_fails_only_that_flow() {
    let gateway = gateway_with_as_is_extraction(None);
    let response = orchestrator(&gateway, recognizer())
        .run(&all_flows_and_document())
        .await
        .unwrap();

    assert!(matches!(
        response.get(ArtifactId::AsIsFlow).unwrap(),
        ArtifactOutcome::Failed { .. }
    ));
    assert!(response.get(ArtifactId::ToBeFlow).unwrap().artifact().is_some());
}

/// Holds every diagram prompt until two are in flight at once
struct RendezvousGateway {
    inner: ScriptedGateway,
    barrier: Barrier,
}

#[async_trait]
impl TextGenerationGateway for RendezvousGateway {
    async fn generate(
        &self,
        system_instruction: Option<&str>,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        if prompt.contains(FLOW_NEEDLE) {
            self.barrier.wait().await;
        }
        self.inner.generate(system_instruction, prompt).await
    }
}

#[tokio::test]
async fn flows_are_generated_concurrently() {
    let gateway = RendezvousGateway {
        inner: ScriptedGateway::new()
            .respond_to(FLOW_NEEDLE, fixtures::SIMPLE_GRAPH_MODEL)
            .respond_to(&extraction_needle(EXECUTIVE_SUMMARY), SUMMARY_TEXT)
            .respond_to(&extraction_needle(AS_IS_SECTION), DETAILED_TO_BE)
            .respond_to(&extraction_needle(TO_BE_SECTION), DETAILED_TO_BE)
            .respond_to(
                DOCUMENT_NEEDLE,
                &requirements_document(SUMMARY_TEXT, DETAILED_TO_BE, DETAILED_TO_BE),
            ),
        barrier: Barrier::new(2),
    };
    let orchestrator = ArtifactOrchestrator::new(
        EntityMasker::new(Arc::new(recognizer())),
        Arc::new(gateway),
        OrchestratorConfig::default(),
    );

    let response = tokio::time::timeout(
        Duration::from_secs(10),
        orchestrator.run(&all_flows_and_document()),
    )
    .await
    .expect("flows ran one after another")
    .unwrap();

    for flow in FlowKind::ALL {
        assert!(response.get(flow.artifact_id()).unwrap().artifact().is_some());
    }
}

#[tokio::test]
async fn document_failure_aborts_the_run() {
    let gateway = ScriptedGateway::new().fail_on(DOCUMENT_NEEDLE);
    let err = orchestrator(&gateway, recognizer())
        .run(&all_flows_and_document())
        .await
        .unwrap_err();
    assert!(matches!(err, DocflowError::GenerationFailure(_)));
    assert!(err.is_retryable());
    assert_eq!(gateway.count_calls(FLOW_NEEDLE), 0);
}

#[tokio::test]
async fn short_executive_summary_aborts_the_run() {
    let gateway = ScriptedGateway::new()
        .respond_to(&extraction_needle(EXECUTIVE_SUMMARY), "TBD")
        .respond_to(DOCUMENT_NEEDLE, "# Executive Summary\n\nTBD\n");
    let err = orchestrator(&gateway, recognizer())
        .run(&RunRequest::new(invoice_files(), [ArtifactId::Document]))
        .await
        .unwrap_err();
    match err {
        DocflowError::ExtractionFailure {
            section,
            length,
            minimum,
        } => {
            assert_eq!(section, EXECUTIVE_SUMMARY);
            assert_eq!(length, 3);
            assert_eq!(minimum, 20);
        }
        other => panic!("expected extraction failure, got {other:?}"),
    }
}

#[tokio::test]
async fn document_is_generated_masked_and_returned_unmasked() {
    // Extraction rules come first: the echoed document contains the
    // document prompt's own wording.
    let gateway = ScriptedGateway::new()
        .respond_to(&extraction_needle(EXECUTIVE_SUMMARY), SUMMARY_TEXT)
        .echo_on(DOCUMENT_NEEDLE);
    let response = orchestrator(&gateway, recognizer())
        .run(&RunRequest::new(invoice_files(), [ArtifactId::Document]))
        .await
        .unwrap();

    let document_prompt = gateway
        .calls()
        .into_iter()
        .find(|call| call.prompt.contains(DOCUMENT_NEEDLE))
        .unwrap()
        .prompt;
    assert!(!document_prompt.contains("Jane Doe"));
    assert!(!document_prompt.contains("Acme Corp"));
    assert!(document_prompt.contains("PERSON_"));
    assert!(document_prompt.contains("ORG_"));

    let artifact = response.get(ArtifactId::Document).unwrap().artifact().unwrap();
    let text = std::str::from_utf8(artifact.payload()).unwrap();
    assert!(text.contains("Kickoff with Jane Doe from Acme Corp."));
    assert!(!text.contains("PERSON_"));
}

#[tokio::test]
async fn flows_without_document_use_summary_context() {
    let gateway = ScriptedGateway::new().respond_to(SUMMARY_NEEDLE, SUMMARY_TEXT);
    let response = orchestrator(&gateway, recognizer())
        .run(&RunRequest::new(
            invoice_files(),
            [ArtifactId::AsIsFlow, ArtifactId::ToBeFlow],
        ))
        .await
        .unwrap();

    for flow in FlowKind::ALL {
        let pending = response.get(flow.artifact_id()).unwrap().refinement().unwrap();
        assert_eq!(pending.message, flow.describe_prompt());
        assert_eq!(pending.context, SUMMARY_TEXT);
    }
    assert_eq!(gateway.count_calls(SUMMARY_NEEDLE), 1);
    assert_eq!(gateway.count_calls(FLOW_NEEDLE), 0);
    assert!(!gateway.calls()[0].prompt.contains("Jane Doe"));
}

#[tokio::test]
async fn summary_failure_degrades_to_placeholder() {
    let gateway = ScriptedGateway::new().fail_on(SUMMARY_NEEDLE);
    let response = orchestrator(&gateway, recognizer())
        .run(&RunRequest::new(invoice_files(), [ArtifactId::ToBeFlow]))
        .await
        .unwrap();
    let pending = response.get(ArtifactId::ToBeFlow).unwrap().refinement().unwrap();
    assert_eq!(pending.context, OrchestratorConfig::default().summary_placeholder);
}

#[tokio::test]
async fn missing_artifacts_or_files_are_invalid() {
    let gateway = ScriptedGateway::new();
    let recognizer = recognizer();
    let orchestrator = orchestrator(&gateway, recognizer.clone());

    let no_artifacts = orchestrator
        .run(&RunRequest::new(invoice_files(), Vec::<ArtifactId>::new()))
        .await
        .unwrap_err();
    assert!(matches!(no_artifacts, DocflowError::InvalidRequest(_)));

    let no_files = orchestrator
        .run(&RunRequest::new(Vec::new(), [ArtifactId::Document]))
        .await
        .unwrap_err();
    assert!(matches!(no_files, DocflowError::InvalidRequest(_)));

    let blank = orchestrator
        .run(&RunRequest::new(
            vec![SourceFile::new("empty.txt", "  \n")],
            [ArtifactId::Document],
        ))
        .await
        .unwrap_err();
    assert!(matches!(blank, DocflowError::InvalidRequest(_)));

    assert_eq!(recognizer.calls(), 0);
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn masking_failure_stops_before_generation() {
    let gateway = document_gateway();
    let err = orchestrator(&gateway, StaticRecognizer::failing("model missing"))
        .run(&all_flows_and_document())
        .await
        .unwrap_err();
    assert!(matches!(err, DocflowError::MaskingFailure(_)));
    assert!(!err.is_retryable());
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn extraction_is_stable_for_identical_inputs() {
    let gateway = document_gateway();
    let extractor = SectionExtractor::new(Arc::new(gateway.clone()), 20);
    let document = requirements_document(SUMMARY_TEXT, VAGUE_AS_IS, DETAILED_TO_BE);

    let first = extractor.extract(&document, TO_BE_SECTION).await.unwrap();
    let second = extractor.extract(&document, TO_BE_SECTION).await.unwrap();
    assert_eq!(first, second);

    let calls = gateway.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);
}
