//! Gateway errors

/// Longest response body excerpt kept in an error
const BODY_EXCERPT_CHARS: usize = 500;

/// Failure of a single generation call
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// API key environment variable is not set
    #[error("missing API key: environment variable {env} is not set")]
    MissingApiKey {
        /// Variable that was read
        env: String,
    },

    /// Request never produced an HTTP response (connect, timeout, TLS)
    #[error("{provider} request failed: {source}")]
    Transport {
        /// Backend name
        provider: &'static str,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// Provider answered with a non-success status
    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        /// Backend name
        provider: &'static str,
        /// HTTP status code
        status: u16,
        /// Response body excerpt
        body: String,
    },

    /// Provider answered with an unexpected body
    #[error("{provider} response could not be decoded: {message}")]
    Decode {
        /// Backend name
        provider: &'static str,
        /// Decoder message
        message: String,
    },

    /// Provider answered without any generated text
    #[error("{provider} returned an empty response")]
    EmptyResponse {
        /// Backend name
        provider: &'static str,
    },
}

impl GenerationError {
    /// Whether the request timed out
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }

    pub(crate) fn status(provider: &'static str, status: u16, body: &str) -> Self {
        let body: String = body.trim().chars().take(BODY_EXCERPT_CHARS).collect();
        Self::Status {
            provider,
            status,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_body_is_truncated() {
        let err = GenerationError::status("openai", 429, &"x".repeat(2_000));
        match &err {
            GenerationError::Status { body, status, .. } => {
                assert_eq!(*status, 429);
                assert_eq!(body.len(), BODY_EXCERPT_CHARS);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!err.is_timeout());
    }
}
