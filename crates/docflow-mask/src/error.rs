//! Masking errors
//!
//! Every variant is fatal for the run: text never reaches the generation
//! gateway unmasked.

/// Failure to obtain or apply an entity mask
#[derive(Debug, thiserror::Error)]
pub enum MaskingError {
    /// Recognizer command is not configured
    #[error("entity recognizer command is empty")]
    EmptyCommand,

    /// Recognizer process could not be started
    #[error("failed to start entity recognizer '{command}': {source}")]
    Spawn {
        /// Program that failed to start
        command: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Recognizer did not answer in time
    #[error("entity recognizer timed out after {secs}s")]
    Timeout {
        /// Configured timeout
        secs: u64,
    },

    /// Recognizer exited unsuccessfully
    #[error("entity recognizer failed ({status}): {message}")]
    CollaboratorFailed {
        /// Exit status description
        status: String,
        /// Message reported by the recognizer
        message: String,
    },

    /// Recognizer output was not the expected JSON object
    #[error("entity recognizer returned unparsable output: {0}")]
    InvalidOutput(#[from] serde_json::Error),

    /// Pipe I/O with the recognizer failed
    #[error("entity recognizer io error: {0}")]
    Io(#[from] std::io::Error),
}
