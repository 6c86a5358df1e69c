//! Artifact encoders
//!
//! Encoders turn final text content into a [`GeneratedArtifact`]. They run
//! only after the pipeline has produced unmasked, final text. The shipped
//! defaults emit Markdown documents, draw.io diagram files and zip bundles;
//! richer binary formats plug in through the same traits.

use crate::artifact::{
    ArtifactKind, GeneratedArtifact, MEDIA_TYPE_DRAWIO, MEDIA_TYPE_MARKDOWN, MEDIA_TYPE_ZIP,
};
use std::io::{Cursor, Write};
use std::sync::Arc;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Errors raised while encoding an artifact
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// Content cannot be encoded in the target format
    #[error("invalid content for {format}: {reason}")]
    InvalidContent { format: &'static str, reason: String },

    /// Archive writer failed
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// I/O error while writing into an in-memory buffer
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Compiles a prose document
pub trait DocumentEncoder: Send + Sync {
    /// Encode `text` under the given base name
    ///
    /// # Errors
    /// Returns error if the text cannot be represented in the format
    fn encode_document(&self, base_name: &str, text: &str) -> Result<GeneratedArtifact, EncodeError>;
}

/// Compiles diagram markup
pub trait DiagramEncoder: Send + Sync {
    /// Encode `markup` under the given base name
    ///
    /// # Errors
    /// Returns error if the markup is not a diagram document
    fn encode_diagram(&self, base_name: &str, markup: &str) -> Result<GeneratedArtifact, EncodeError>;
}

/// One file inside a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    /// Path inside the archive
    pub name: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl PackageEntry {
    /// Create a new entry
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Bundles several files into one downloadable archive
pub trait PackageEncoder: Send + Sync {
    /// Bundle `entries` under the given base name
    ///
    /// # Errors
    /// Returns error if the archive cannot be written
    fn encode_package(
        &self,
        base_name: &str,
        entries: &[PackageEntry],
    ) -> Result<GeneratedArtifact, EncodeError>;
}

/// Writes the document text as-is into a `.md` file
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownDocumentEncoder;

impl DocumentEncoder for MarkdownDocumentEncoder {
    fn encode_document(&self, base_name: &str, text: &str) -> Result<GeneratedArtifact, EncodeError> {
        if text.trim().is_empty() {
            return Err(EncodeError::InvalidContent {
                format: "markdown",
                reason: "document text is empty".to_string(),
            });
        }
        Ok(GeneratedArtifact::new(
            ArtifactKind::Document,
            format!("{}.md", file_stem(base_name)),
            text.as_bytes().to_vec(),
            MEDIA_TYPE_MARKDOWN,
        ))
    }
}

/// Wraps an `mxGraphModel` into an uncompressed `.drawio` file
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawioDiagramEncoder;

impl DiagramEncoder for DrawioDiagramEncoder {
    fn encode_diagram(&self, base_name: &str, markup: &str) -> Result<GeneratedArtifact, EncodeError> {
        let markup = markup.trim();
        if !markup.starts_with("<mxGraphModel") || !markup.ends_with("</mxGraphModel>") {
            return Err(EncodeError::InvalidContent {
                format: "drawio",
                reason: "markup is not a single mxGraphModel element".to_string(),
            });
        }
        let title = escape_attr(base_name);
        let file = format!(
            "<mxfile host=\"docflow\">\n  <diagram id=\"{id}\" name=\"{title}\">\n{markup}\n  </diagram>\n</mxfile>\n",
            id = file_stem(base_name),
        );
        Ok(GeneratedArtifact::new(
            ArtifactKind::Diagram,
            format!("{}.drawio", file_stem(base_name)),
            file.into_bytes(),
            MEDIA_TYPE_DRAWIO,
        ))
    }
}

/// Writes entries into a deflated zip archive
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipPackageEncoder;

impl PackageEncoder for ZipPackageEncoder {
    fn encode_package(
        &self,
        base_name: &str,
        entries: &[PackageEntry],
    ) -> Result<GeneratedArtifact, EncodeError> {
        if entries.is_empty() {
            return Err(EncodeError::InvalidContent {
                format: "zip",
                reason: "package has no entries".to_string(),
            });
        }

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for entry in entries {
            writer.start_file(entry.name.clone(), options)?;
            writer.write_all(&entry.bytes)?;
        }
        let bytes = writer.finish()?.into_inner();

        Ok(GeneratedArtifact::new(
            ArtifactKind::Archive,
            format!("{}.zip", file_stem(base_name)),
            bytes,
            MEDIA_TYPE_ZIP,
        ))
    }
}

/// The encoder set used by the pipeline
#[derive(Clone)]
pub struct Encoders {
    /// Document encoder
    pub document: Arc<dyn DocumentEncoder>,
    /// Diagram encoder
    pub diagram: Arc<dyn DiagramEncoder>,
    /// Package encoder
    pub package: Arc<dyn PackageEncoder>,
}

impl Default for Encoders {
    fn default() -> Self {
        Self {
            document: Arc::new(MarkdownDocumentEncoder),
            diagram: Arc::new(DrawioDiagramEncoder),
            package: Arc::new(ZipPackageEncoder),
        }
    }
}

impl std::fmt::Debug for Encoders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoders").finish_non_exhaustive()
    }
}

/// Turn a display name into a safe file stem
///
/// Runs of anything other than ASCII alphanumerics, `-` and `_` collapse
/// into a single `_`. An empty result becomes `artifact`.
#[must_use]
pub fn file_stem(base_name: &str) -> String {
    let mut stem = String::with_capacity(base_name.len());
    for ch in base_name.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            stem.push(ch);
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "artifact".to_string()
    } else {
        stem.to_string()
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MODEL: &str = "<mxGraphModel><root><mxCell id=\"0\"/></root></mxGraphModel>";

    #[test]
    fn file_stem_collapses_separators() {
        assert_eq!(file_stem("Invoice Process / v2"), "Invoice_Process_v2");
        assert_eq!(file_stem("  ***  "), "artifact");
        assert_eq!(file_stem("as-is_flow"), "as-is_flow");
    }

    #[test]
    fn markdown_rejects_empty_text() {
        let err = MarkdownDocumentEncoder.encode_document("brd", "  \n").unwrap_err();
        assert!(matches!(err, EncodeError::InvalidContent { format: "markdown", .. }));
    }

    #[test]
    fn drawio_wraps_model() {
        let artifact = DrawioDiagramEncoder
            .encode_diagram("As-Is \"Flow\"", MODEL)
            .unwrap();
        assert_eq!(artifact.name(), "As-Is_Flow.drawio");
        assert_eq!(artifact.kind(), ArtifactKind::Diagram);
        let text = std::str::from_utf8(artifact.payload()).unwrap();
        assert!(text.starts_with("<mxfile"));
        assert!(text.contains(MODEL));
        assert!(text.contains("name=\"As-Is &quot;Flow&quot;\""));
    }

    #[test]
    fn drawio_rejects_non_model_markup() {
        assert!(DrawioDiagramEncoder.encode_diagram("x", "<svg/>").is_err());
    }

    #[test]
    fn zip_package_has_zip_magic() {
        let entries = vec![
            PackageEntry::new("masked_corpus.txt", "PERSON_0A1B2C3D wrote this"),
            PackageEntry::new("entity_mapping.json", "{}"),
        ];
        let artifact = ZipPackageEncoder.encode_package("anonymization package", &entries).unwrap();
        assert_eq!(artifact.name(), "anonymization_package.zip");
        assert_eq!(&artifact.payload()[..2], b"PK");
        assert!(artifact.verify());
    }

    #[test]
    fn zip_package_requires_entries() {
        assert!(ZipPackageEncoder.encode_package("pkg", &[]).is_err());
    }
}
