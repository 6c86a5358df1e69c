//! Entity filtering
//!
//! Recognizers misclassify business acronyms and stray tokens as names.
//! [`EntityFilter`] drops that noise and deduplicates names across
//! categories before they become masking candidates.

use crate::mapping::EntityCategory;
use crate::recognizer::DetectedEntities;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Business acronyms that are never treated as names
pub const DEFAULT_DENY_LIST: &[&str] = &[
    "api", "apis", "bpa", "capex", "cio", "coo", "etl", "je", "jee", "labor", "ocr", "pdf", "po",
    "sow", "sox", "tnm", "uat", "vpa",
];

/// A name selected for masking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Exact text to mask
    pub name: String,
    /// Category used for the token prefix
    pub category: EntityCategory,
}

/// Drops noise from recognizer output
#[derive(Debug, Clone)]
pub struct EntityFilter {
    deny: HashSet<String>,
}

impl EntityFilter {
    /// Filter with the default deny list
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_deny_list(DEFAULT_DENY_LIST.iter().copied())
    }

    /// Filter with a custom deny list (matched case-insensitively)
    #[must_use]
    pub fn with_deny_list<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            deny: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// Whether a single name survives the filter
    #[must_use]
    pub fn accepts(&self, name: &str) -> bool {
        let char_count = name.chars().count();
        if char_count <= 1 || name.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        if self.deny.contains(&name.to_lowercase()) {
            return false;
        }
        let is_short_acronym = char_count <= 3
            && name.chars().any(char::is_alphabetic)
            && !name.chars().any(char::is_lowercase);
        !is_short_acronym
    }

    /// Filter and deduplicate detected names
    ///
    /// People win over organizations, organizations over locations, when
    /// the same text is reported in several categories.
    #[must_use]
    pub fn apply(&self, detected: &DetectedEntities) -> Vec<Candidate> {
        let mut selected: IndexMap<String, EntityCategory> = IndexMap::new();
        let groups = [
            (EntityCategory::Person, &detected.people),
            (EntityCategory::Organization, &detected.organizations),
            (EntityCategory::Location, &detected.locations),
        ];
        for (category, names) in groups {
            for raw in names {
                let name = raw.trim();
                if self.accepts(name) && !selected.contains_key(name) {
                    selected.insert(name.to_string(), category);
                }
            }
        }
        selected
            .into_iter()
            .map(|(name, category)| Candidate { name, category })
            .collect()
    }
}

impl Default for EntityFilter {
    fn default() -> Self {
        Self::new()
    }
}
