//! docflow command line
//!
//! Library half of the `docflow` binary:
//! - [`DocflowConfig`] loading from TOML
//! - Wiring the recognizer, gateway and orchestrator from configuration
//! - `run` and `refine` commands writing results to an output directory

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod output;

pub use config::DocflowConfig;

use anyhow::{Context, Result};
use docflow_artifact::ArtifactId;
use docflow_core::{ArtifactOrchestrator, RefinementFollowUp, ResponseSummary, RunRequest};
use docflow_mask::{EntityMasker, SourceFile, SubprocessRecognizer};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Build the orchestrator described by `config`
pub fn build_orchestrator(config: &DocflowConfig) -> Result<ArtifactOrchestrator> {
    let recognizer = SubprocessRecognizer::new(&config.recognizer)?;
    let gateway = docflow_gateway::build_gateway(&config.gateway)?;
    Ok(ArtifactOrchestrator::new(
        EntityMasker::new(Arc::new(recognizer)),
        gateway,
        config.orchestrator.clone(),
    ))
}

/// Read uploaded files as text
pub fn read_sources(paths: &[PathBuf]) -> Result<Vec<SourceFile>> {
    paths
        .iter()
        .map(|path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let name = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            Ok(SourceFile::new(name, content))
        })
        .collect()
}

/// Parse artifact identifiers given on the command line
pub fn parse_artifacts(values: &[String]) -> Result<Vec<ArtifactId>, docflow_core::DocflowError> {
    values
        .iter()
        .map(|value| value.parse::<ArtifactId>().map_err(Into::into))
        .collect()
}

/// `docflow run`
pub async fn run(
    orchestrator: &ArtifactOrchestrator,
    files: &[PathBuf],
    artifacts: &[String],
    out: &Path,
) -> Result<ResponseSummary> {
    let request = RunRequest::new(read_sources(files)?, parse_artifacts(artifacts)?);
    let response = orchestrator.run(&request).await?;
    for path in output::write_response(out, &response)? {
        tracing::info!(path = %path.display(), "Wrote output");
    }
    Ok(response.summary())
}

/// `docflow refine`
pub async fn refine(
    orchestrator: &ArtifactOrchestrator,
    request: &Path,
    detail: &str,
    name: Option<&str>,
    out: &Path,
) -> Result<docflow_artifact::ArtifactSummary> {
    let pending = output::read_refinement(request)?;
    let mut follow_up = RefinementFollowUp::answering(&pending, detail);
    if let Some(name) = name {
        follow_up = follow_up.with_base_name(name);
    }
    let artifact = orchestrator.refine(&follow_up).await?;
    std::fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    let path = output::write_artifact(out, &artifact)?;
    tracing::info!(path = %path.display(), "Wrote output");
    Ok(artifact.summary())
}

/// Message to show on stderr for a failed command
#[must_use]
pub fn user_facing(err: &anyhow::Error) -> String {
    match err.downcast_ref::<docflow_core::DocflowError>() {
        Some(docflow) => docflow.user_message(),
        None => format!("{err:#}"),
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
