//! Writing results to the output directory

use anyhow::{Context, Result};
use docflow_artifact::GeneratedArtifact;
use docflow_core::{ArtifactOutcome, FlowKind, RefinementRequest, RunResponse};
use std::path::{Path, PathBuf};

/// File name used for a pending refinement request
#[must_use]
pub fn refinement_file_name(flow: FlowKind) -> String {
    format!("refinement-{flow}.json")
}

/// Write one artifact, returning its path
pub fn write_artifact(dir: &Path, artifact: &GeneratedArtifact) -> Result<PathBuf> {
    let path = dir.join(artifact.name());
    std::fs::write(&path, artifact.payload())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Write one refinement request as JSON, returning its path
pub fn write_refinement(dir: &Path, request: &RefinementRequest) -> Result<PathBuf> {
    let path = dir.join(refinement_file_name(request.flow));
    let json = serde_json::to_vec_pretty(request)?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Write every completed artifact and pending refinement of a run
pub fn write_response(dir: &Path, response: &RunResponse) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let mut written = Vec::new();
    for outcome in response.artifacts.values() {
        match outcome {
            ArtifactOutcome::Complete(artifact) => written.push(write_artifact(dir, artifact)?),
            ArtifactOutcome::NeedsRefinement(request) => {
                written.push(write_refinement(dir, request)?);
            }
            ArtifactOutcome::Failed { .. } => {}
        }
    }
    Ok(written)
}

/// Read a refinement request written by [`write_refinement`]
pub fn read_refinement(path: &Path) -> Result<RefinementRequest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a refinement request", path.display()))
}
