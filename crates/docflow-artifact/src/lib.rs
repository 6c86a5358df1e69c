//! docflow Artifact System
//!
//! Deliverables produced by the pipeline and the encoders that compile them.
//!
//! # Core Concepts
//!
//! - [`ArtifactId`]: the fixed set of artifacts a caller can request
//! - [`GeneratedArtifact`]: immutable deliverable with a payload digest
//! - [`ContentHash`]: 32-byte Blake3 digest
//! - [`Encoders`]: document, diagram and package encoders
//!
//! # Example
//!
//! ```rust,ignore
//! use docflow_artifact::{DiagramEncoder, DrawioDiagramEncoder};
//!
//! let artifact = DrawioDiagramEncoder.encode_diagram("As-Is Flow", &markup)?;
//! println!("{} ({})", artifact.name(), artifact.digest().short());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod artifact;
mod encode;
mod hash;

pub use artifact::{
    ArtifactId, ArtifactKind, ArtifactSummary, GeneratedArtifact, UnknownArtifactId,
    MEDIA_TYPE_DRAWIO, MEDIA_TYPE_MARKDOWN, MEDIA_TYPE_ZIP,
};
pub use encode::{
    file_stem, DiagramEncoder, DocumentEncoder, DrawioDiagramEncoder, EncodeError, Encoders,
    MarkdownDocumentEncoder, PackageEncoder, PackageEntry, ZipPackageEncoder,
};
pub use hash::{ContentHash, HashError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
