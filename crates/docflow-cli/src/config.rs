//! Process configuration loaded from TOML
//!
//! ```toml
//! [gateway]
//! provider = "openai"
//! model = "gpt-4o-mini"
//!
//! [recognizer]
//! command = ["python3", "server/ner_spacy.py"]
//!
//! [orchestrator]
//! min_section_chars = 40
//! ```
//!
//! Every table and field is optional.

use anyhow::{Context, Result};
use docflow_core::OrchestratorConfig;
use docflow_gateway::GatewayConfig;
use docflow_mask::RecognizerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for one `docflow` process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocflowConfig {
    /// Text generation backend
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Entity recognizer command
    #[serde(default)]
    pub recognizer: RecognizerConfig,
    /// Pipeline settings
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

impl DocflowConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid docflow configuration")
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Load from `path`, or use defaults when no path is given
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}
