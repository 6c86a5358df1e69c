//! Entity mapping
//!
//! The token → original-name table for one submission. Built once by the
//! masker and read-only afterwards, so it can be shared across concurrent
//! branches behind an `Arc` without locking.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Category of a masked name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    /// Person name
    Person,
    /// Organization name
    Organization,
    /// Location name
    Location,
}

impl EntityCategory {
    /// Token prefix for this category
    #[inline]
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Organization => "ORG",
            Self::Location => "LOCATION",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "PERSON" => Some(Self::Person),
            "ORG" => Some(Self::Organization),
            "LOCATION" => Some(Self::Location),
            _ => None,
        }
    }
}

/// Opaque replacement token, `<PREFIX>_<8 uppercase hex>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaskToken(String);

impl MaskToken {
    /// Token for `category` with the given random suffix
    #[inline]
    #[must_use]
    pub fn new(category: EntityCategory, suffix: u32) -> Self {
        Self(format!("{}_{suffix:08X}", category.prefix()))
    }

    /// Token text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Category encoded in the prefix
    #[must_use]
    pub fn category(&self) -> Option<EntityCategory> {
        self.0
            .rsplit_once('_')
            .and_then(|(prefix, _)| EntityCategory::from_prefix(prefix))
    }
}

impl fmt::Display for MaskToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token → original name pairs for one submission
///
/// # Invariants
/// - Tokens are unique; no two names share a token
/// - No token occurs anywhere in the original corpus
/// - Only names that were actually replaced are recorded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EntityMapping {
    entries: BTreeMap<MaskToken, String>,
}

impl EntityMapping {
    pub(crate) fn insert(&mut self, token: MaskToken, original: String) {
        self.entries.insert(token, original);
    }

    pub(crate) fn contains_token(&self, token: &MaskToken) -> bool {
        self.entries.contains_key(token)
    }

    /// Number of recorded pairs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was masked
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Original name behind a token
    #[inline]
    #[must_use]
    pub fn original(&self, token: &str) -> Option<&str> {
        self.entries
            .get(&MaskToken(token.to_string()))
            .map(String::as_str)
    }

    /// Token assigned to an original name
    #[must_use]
    pub fn token_for(&self, original: &str) -> Option<&MaskToken> {
        self.entries
            .iter()
            .find(|(_, name)| name.as_str() == original)
            .map(|(token, _)| token)
    }

    /// Iterate over (token, original) pairs in token order
    pub fn iter(&self) -> impl Iterator<Item = (&MaskToken, &str)> {
        self.entries.iter().map(|(t, o)| (t, o.as_str()))
    }

    /// Restore every recorded name in `text`
    ///
    /// Tokens cannot collide with each other or with natural text, so the
    /// substitution order does not matter.
    #[must_use]
    pub fn unmask(&self, text: &str) -> String {
        let mut restored = text.to_string();
        for (token, original) in &self.entries {
            let (next, _) = replace_whole_word(&restored, token.as_str(), original);
            restored = next;
        }
        restored
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Replace case-sensitive whole-word occurrences of `needle`
///
/// An occurrence is whole-word when the characters directly around it are
/// not alphanumeric and not `_`. Returns the new text and the number of
/// replacements.
#[must_use]
pub fn replace_whole_word(text: &str, needle: &str, replacement: &str) -> (String, usize) {
    if needle.is_empty() {
        return (text.to_string(), 0);
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut search = 0;
    let mut count = 0;
    while let Some(offset) = text[search..].find(needle) {
        let start = search + offset;
        let end = start + needle.len();
        let before_ok = text[..start].chars().next_back().map_or(true, |c| !is_word_char(c));
        let after_ok = text[end..].chars().next().map_or(true, |c| !is_word_char(c));
        if before_ok && after_ok {
            out.push_str(&text[cursor..start]);
            out.push_str(replacement);
            cursor = end;
            search = end;
            count += 1;
        } else {
            // A rejected match may overlap a later whole-word one.
            search = start + text[start..].chars().next().map_or(1, char::len_utf8);
        }
    }
    out.push_str(&text[cursor..]);
    (out, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_format_and_category() {
        let token = MaskToken::new(EntityCategory::Organization, 0x00ab_12cd);
        assert_eq!(token.as_str(), "ORG_00AB12CD");
        assert_eq!(token.category(), Some(EntityCategory::Organization));
        assert_eq!(MaskToken("nonsense".into()).category(), None);
    }

    #[test]
    fn whole_word_only() {
        let (out, n) = replace_whole_word("Ann met Anna and Ann's team", "Ann", "X");
        assert_eq!(out, "X met Anna and X's team");
        assert_eq!(n, 2);
    }

    #[test]
    fn rejected_match_does_not_hide_overlapping_word() {
        let (out, n) = replace_whole_word("XLee Lee Lee", "Lee Lee", "PERSON_1");
        assert_eq!(out, "XLee PERSON_1");
        assert_eq!(n, 1);

        let (out, n) = replace_whole_word("éaa aa", "aa", "T");
        assert_eq!(out, "éaa T");
        assert_eq!(n, 1);
    }

    #[test]
    fn underscore_counts_as_word() {
        let (out, n) = replace_whole_word("ORG_1234 and ORG", "ORG", "Y");
        assert_eq!(out, "ORG_1234 and Y");
        assert_eq!(n, 1);
    }

    #[test]
    fn punctuated_names() {
        let (out, n) = replace_whole_word("Signed: Acme, Inc. (NY)", "Acme, Inc.", "ORG_1");
        assert_eq!(out, "Signed: ORG_1 (NY)");
        assert_eq!(n, 1);
    }

    #[test]
    fn unmask_restores_pairs() {
        let mut mapping = EntityMapping::default();
        mapping.insert(MaskToken::new(EntityCategory::Person, 1), "Jane Doe".into());
        mapping.insert(MaskToken::new(EntityCategory::Location, 2), "Berlin".into());
        let text = "PERSON_00000001 moved to LOCATION_00000002.";
        assert_eq!(mapping.unmask(text), "Jane Doe moved to Berlin.");
        assert_eq!(mapping.original("PERSON_00000001"), Some("Jane Doe"));
        assert_eq!(
            mapping.token_for("Berlin").map(MaskToken::as_str),
            Some("LOCATION_00000002")
        );
    }

    #[test]
    fn serializes_as_flat_object() {
        let mut mapping = EntityMapping::default();
        mapping.insert(MaskToken::new(EntityCategory::Person, 1), "Jane Doe".into());
        let json = serde_json::to_string(&mapping).unwrap();
        assert_eq!(json, r#"{"PERSON_00000001":"Jane Doe"}"#);
    }
}
