//! Entity masker
//!
//! One recognizer call per submission, one mapping for the whole corpus.
//! Candidates are substituted longest first so a multi-word name is never
//! pre-empted by one of its component words.

use crate::corpus::SubmissionCorpus;
use crate::error::MaskingError;
use crate::filter::{Candidate, EntityFilter};
use crate::mapping::{replace_whole_word, EntityMapping, MaskToken};
use crate::recognizer::EntityRecognizer;
use std::sync::Arc;

/// Result of masking a corpus
#[derive(Debug, Clone)]
pub struct MaskedCorpus {
    /// Corpus text with every recorded name replaced by its token
    pub text: String,
    /// Shared, read-only mapping
    pub mapping: Arc<EntityMapping>,
    /// Counters for logging
    pub stats: MaskingStats,
}

/// Masking counters (never names)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskingStats {
    /// Names reported by the recognizer
    pub detected: usize,
    /// Names that survived filtering
    pub candidates: usize,
    /// Names recorded in the mapping
    pub masked: usize,
    /// Total substitutions made
    pub replacements: usize,
}

/// Builds the masking scheme for a submission
pub struct EntityMasker {
    recognizer: Arc<dyn EntityRecognizer>,
    filter: EntityFilter,
}

impl EntityMasker {
    /// Create a masker with the default entity filter
    #[inline]
    #[must_use]
    pub fn new(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self {
            recognizer,
            filter: EntityFilter::default(),
        }
    }

    /// Replace the entity filter
    #[inline]
    #[must_use]
    pub fn with_filter(mut self, filter: EntityFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Mask the corpus
    ///
    /// # Errors
    /// Propagates recognizer failures; there is no unmasked fallback
    pub async fn mask(&self, corpus: &SubmissionCorpus) -> Result<MaskedCorpus, MaskingError> {
        let detected = self.recognizer.detect(corpus.text()).await?;
        let candidates = self.filter.apply(&detected);
        let (text, mapping, replacements) =
            mask_candidates(corpus.text(), candidates.clone(), rand::random::<u32>);

        let stats = MaskingStats {
            detected: detected.total(),
            candidates: candidates.len(),
            masked: mapping.len(),
            replacements,
        };
        tracing::info!(
            files = corpus.file_names().len(),
            detected = stats.detected,
            candidates = stats.candidates,
            masked = stats.masked,
            replacements = stats.replacements,
            "Corpus masked"
        );

        Ok(MaskedCorpus {
            text,
            mapping: Arc::new(mapping),
            stats,
        })
    }

    /// Restore original names in generated text
    #[inline]
    #[must_use]
    pub fn unmask(text: &str, mapping: &EntityMapping) -> String {
        mapping.unmask(text)
    }
}

impl std::fmt::Debug for EntityMasker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMasker")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// Substitute candidates into `text`, longest name first
///
/// `next_suffix` supplies random token suffixes; a suffix is redrawn when
/// the token is already taken or already occurs in `text`.
pub fn mask_candidates<F>(
    text: &str,
    mut candidates: Vec<Candidate>,
    mut next_suffix: F,
) -> (String, EntityMapping, usize)
where
    F: FnMut() -> u32,
{
    // Stable sort keeps recognizer order among equal lengths.
    candidates.sort_by(|a, b| b.name.chars().count().cmp(&a.name.chars().count()));

    let mut masked = text.to_string();
    let mut mapping = EntityMapping::default();
    let mut replacements = 0;

    for candidate in candidates {
        let token = loop {
            let token = MaskToken::new(candidate.category, next_suffix());
            if !mapping.contains_token(&token) && !text.contains(token.as_str()) {
                break token;
            }
        };
        let (next, count) = replace_whole_word(&masked, &candidate.name, token.as_str());
        if count > 0 {
            masked = next;
            replacements += count;
            mapping.insert(token, candidate.name);
        }
    }

    (masked, mapping, replacements)
}
