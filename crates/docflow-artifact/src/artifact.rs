//! Generated artifacts
//!
//! Defines the fixed set of requestable [`ArtifactId`]s and the
//! [`GeneratedArtifact`] deliverable returned to callers.

use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Media type of a Markdown document
pub const MEDIA_TYPE_MARKDOWN: &str = "text/markdown";
/// Media type of a draw.io diagram file
pub const MEDIA_TYPE_DRAWIO: &str = "application/vnd.jgraph.mxfile";
/// Media type of a zip archive
pub const MEDIA_TYPE_ZIP: &str = "application/zip";

/// Identifier of a requestable artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactId {
    /// Structured requirements document
    Document,
    /// Current-state process diagram
    AsIsFlow,
    /// Future-state process diagram
    ToBeFlow,
    /// Masked corpus plus entity mapping
    AnonymizationPackage,
}

impl ArtifactId {
    /// Every requestable identifier
    pub const ALL: [ArtifactId; 4] = [
        ArtifactId::Document,
        ArtifactId::AsIsFlow,
        ArtifactId::ToBeFlow,
        ArtifactId::AnonymizationPackage,
    ];

    /// Wire name
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::AsIsFlow => "as-is-flow",
            Self::ToBeFlow => "to-be-flow",
            Self::AnonymizationPackage => "anonymization-package",
        }
    }

    /// Whether this identifier names a process-flow diagram
    #[inline]
    #[must_use]
    pub const fn is_flow(&self) -> bool {
        matches!(self, Self::AsIsFlow | Self::ToBeFlow)
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactId {
    type Err = UnknownArtifactId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s.trim())
            .ok_or_else(|| UnknownArtifactId(s.to_string()))
    }
}

/// Returned when parsing an identifier outside the fixed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown artifact identifier '{0}' (expected one of: document, as-is-flow, to-be-flow, anonymization-package)")]
pub struct UnknownArtifactId(pub String);

/// Broad class of a produced deliverable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Prose document
    Document,
    /// Diagram file
    Diagram,
    /// Archive bundle
    Archive,
}

/// One produced deliverable
///
/// # Invariants
/// - `digest` is always the Blake3 digest of `payload`
/// - Immutable after construction; a replacement is a new value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    kind: ArtifactKind,
    name: String,
    #[serde(with = "base64_payload")]
    payload: Vec<u8>,
    media_type: String,
    digest: ContentHash,
}

impl GeneratedArtifact {
    /// Create an artifact, computing its digest
    #[must_use]
    pub fn new(
        kind: ArtifactKind,
        name: impl Into<String>,
        payload: Vec<u8>,
        media_type: impl Into<String>,
    ) -> Self {
        let digest = ContentHash::compute(&payload);
        Self {
            kind,
            name: name.into(),
            payload,
            media_type: media_type.into(),
            digest,
        }
    }

    /// Artifact kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// File name offered to the caller
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw payload bytes
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Media type
    #[inline]
    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Payload digest
    #[inline]
    #[must_use]
    pub fn digest(&self) -> &ContentHash {
        &self.digest
    }

    /// Check that the digest still matches the payload
    #[inline]
    #[must_use]
    pub fn verify(&self) -> bool {
        ContentHash::compute(&self.payload) == self.digest
    }

    /// Payload-free view for listings
    #[must_use]
    pub fn summary(&self) -> ArtifactSummary {
        ArtifactSummary {
            kind: self.kind,
            name: self.name.clone(),
            media_type: self.media_type.clone(),
            digest: self.digest,
            size_bytes: self.payload.len(),
        }
    }
}

/// Artifact summary without the payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    /// Artifact kind
    pub kind: ArtifactKind,
    /// File name
    pub name: String,
    /// Media type
    pub media_type: String,
    /// Payload digest
    pub digest: ContentHash,
    /// Payload size
    pub size_bytes: usize,
}

mod base64_payload {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_id_parses_wire_names() {
        for id in ArtifactId::ALL {
            assert_eq!(id.as_str().parse::<ArtifactId>().unwrap(), id);
        }
        assert!("slides".parse::<ArtifactId>().is_err());
    }

    #[test]
    fn artifact_id_serde_matches_display() {
        let json = serde_json::to_string(&ArtifactId::AsIsFlow).unwrap();
        assert_eq!(json, "\"as-is-flow\"");
        assert!(ArtifactId::ToBeFlow.is_flow());
        assert!(!ArtifactId::Document.is_flow());
    }

    #[test]
    fn payload_serializes_as_base64() {
        let artifact = GeneratedArtifact::new(
            ArtifactKind::Document,
            "brd.md",
            b"# Title".to_vec(),
            MEDIA_TYPE_MARKDOWN,
        );
        let value = serde_json::to_value(&artifact).unwrap();
        assert_eq!(value["payload"], "IyBUaXRsZQ==");
        assert_eq!(value["kind"], "document");

        let decoded: GeneratedArtifact = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, artifact);
        assert!(decoded.verify());
    }

    #[test]
    fn summary_drops_payload() {
        let artifact = GeneratedArtifact::new(ArtifactKind::Archive, "pkg.zip", vec![0; 12], MEDIA_TYPE_ZIP);
        let summary = artifact.summary();
        assert_eq!(summary.size_bytes, 12);
        assert_eq!(summary.digest, *artifact.digest());
    }
}
