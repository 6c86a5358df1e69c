//! docflow Masking
//!
//! Reversible anonymization of a multi-file submission:
//! - Builds one [`SubmissionCorpus`] from every uploaded file
//! - Detects names through an [`EntityRecognizer`] collaborator
//! - Filters recognizer noise with [`EntityFilter`]
//! - Masks names with opaque tokens and records one [`EntityMapping`]
//! - Restores original names in generated text
//!
//! # Example
//!
//! ```rust,ignore
//! use docflow_mask::{EntityMasker, SubmissionCorpus, SubprocessRecognizer};
//!
//! let recognizer = SubprocessRecognizer::new(&config.recognizer)?;
//! let masker = EntityMasker::new(Arc::new(recognizer));
//! let masked = masker.mask(&SubmissionCorpus::from_files(&files)).await?;
//! let restored = masked.mapping.unmask(&generated);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod corpus;
pub mod error;
pub mod filter;
pub mod mapping;
pub mod masker;
pub mod recognizer;

pub use corpus::{SourceFile, SubmissionCorpus};
pub use error::MaskingError;
pub use filter::{Candidate, EntityFilter, DEFAULT_DENY_LIST};
pub use mapping::{replace_whole_word, EntityCategory, EntityMapping, MaskToken};
pub use masker::{mask_candidates, EntityMasker, MaskedCorpus, MaskingStats};
pub use recognizer::{DetectedEntities, EntityRecognizer, RecognizerConfig, SubprocessRecognizer};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
