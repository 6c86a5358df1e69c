//! Entity recognizer contract
//!
//! The recognizer is an external collaborator: raw text in, three lists of
//! detected names out. [`SubprocessRecognizer`] drives a configured command
//! over stdin/stdout, exchanging JSON of the form
//!
//! ```text
//! {"people": ["Jane Doe"], "organizations": ["Acme Corp"], "locations": []}
//! ```
//!
//! `locations` may be omitted. On failure the command is expected to exit
//! non-zero and may print `{"error": "..."}` on stderr.

use crate::error::MaskingError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Names detected in a text, grouped by category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedEntities {
    /// Person names
    #[serde(default)]
    pub people: Vec<String>,
    /// Organization names
    #[serde(default)]
    pub organizations: Vec<String>,
    /// Location names
    #[serde(default)]
    pub locations: Vec<String>,
}

impl DetectedEntities {
    /// Total number of names across categories
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.people.len() + self.organizations.len() + self.locations.len()
    }
}

/// Detects sensitive names in raw text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Detect people, organizations and locations in `text`
    ///
    /// # Errors
    /// Returns error if the collaborator is unreachable or answers with
    /// unparsable output
    async fn detect(&self, text: &str) -> Result<DetectedEntities, MaskingError>;
}

/// Recognizer process configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Program and arguments
    #[serde(default = "default_command")]
    pub command: Vec<String>,
    /// Time allowed for one detection
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_command() -> Vec<String> {
    vec!["python3".to_string(), "ner_spacy.py".to_string()]
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Runs an external recognizer command per detection
#[derive(Debug, Clone)]
pub struct SubprocessRecognizer {
    command: Vec<String>,
    timeout: Duration,
}

impl SubprocessRecognizer {
    /// Create from configuration
    ///
    /// # Errors
    /// Returns `MaskingError::EmptyCommand` if no program is configured
    pub fn new(config: &RecognizerConfig) -> Result<Self, MaskingError> {
        if config.command.first().map_or(true, |p| p.trim().is_empty()) {
            return Err(MaskingError::EmptyCommand);
        }
        Ok(Self {
            command: config.command.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Override the timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, text: &str) -> Result<std::process::Output, MaskingError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or(MaskingError::EmptyCommand)?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| MaskingError::Spawn {
                command: program.clone(),
                source,
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            MaskingError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "recognizer stdin unavailable",
            ))
        })?;

        // Feed stdin while draining stdout so large inputs cannot deadlock.
        let feed = async move {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        // A recognizer that exits before reading everything is reported by its status.
        if let Err(err) = fed {
            if err.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(err.into());
            }
        }
        Ok(output?)
    }
}

#[async_trait]
impl EntityRecognizer for SubprocessRecognizer {
    async fn detect(&self, text: &str) -> Result<DetectedEntities, MaskingError> {
        let start = Instant::now();
        let output = tokio::time::timeout(self.timeout, self.run(text))
            .await
            .map_err(|_| MaskingError::Timeout {
                secs: self.timeout.as_secs(),
            })??;

        if !output.status.success() {
            return Err(MaskingError::CollaboratorFailed {
                status: output.status.to_string(),
                message: stderr_message(&output.stderr),
            });
        }

        let entities: DetectedEntities = serde_json::from_slice(&output.stdout)?;
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            input_bytes = text.len(),
            detected = entities.total(),
            "Entity recognizer complete"
        );
        Ok(entities)
    }
}

#[derive(Deserialize)]
struct RecognizerFailure {
    error: String,
}

fn stderr_message(stderr: &[u8]) -> String {
    let raw = String::from_utf8_lossy(stderr);
    let trimmed = raw.trim();
    match serde_json::from_str::<RecognizerFailure>(trimmed) {
        Ok(failure) => failure.error,
        Err(_) if trimmed.is_empty() => "no diagnostic output".to_string(),
        Err(_) => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_are_optional() {
        let parsed: DetectedEntities =
            serde_json::from_str(r#"{"people": ["Jane Doe"], "organizations": ["Acme"]}"#).unwrap();
        assert_eq!(parsed.people, ["Jane Doe"]);
        assert!(parsed.locations.is_empty());
        assert_eq!(parsed.total(), 2);
    }

    #[test]
    fn stderr_message_prefers_json_error() {
        assert_eq!(stderr_message(br#"{"error": "model missing"}"#), "model missing");
        assert_eq!(stderr_message(b"Traceback ...\n"), "Traceback ...");
        assert_eq!(stderr_message(b""), "no diagnostic output");
    }

    #[test]
    fn empty_command_is_rejected() {
        let config = RecognizerConfig {
            command: vec![],
            timeout_secs: 1,
        };
        assert!(matches!(
            SubprocessRecognizer::new(&config),
            Err(MaskingError::EmptyCommand)
        ));
    }
}
