//! Submission corpus
//!
//! All uploaded files of one request concatenated into a single text, each
//! segment delimited and attributed to its file name.

use serde::{Deserialize, Serialize};

/// One uploaded file, already converted to text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Original file name
    pub name: String,
    /// Extracted text content
    pub content: String,
}

impl SourceFile {
    /// Create a new source file
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Immutable concatenation of every file in a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionCorpus {
    text: String,
    file_names: Vec<String>,
    blank: bool,
}

impl SubmissionCorpus {
    /// Build the corpus from uploaded files, in upload order
    #[must_use]
    pub fn from_files(files: &[SourceFile]) -> Self {
        let text = files
            .iter()
            .map(|file| {
                format!(
                    "--- START OF FILE: {name} ---\n{content}\n--- END OF FILE: {name} ---",
                    name = file.name,
                    content = file.content.trim_end(),
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        Self {
            text,
            file_names: files.iter().map(|f| f.name.clone()).collect(),
            blank: files.iter().all(|f| f.content.trim().is_empty()),
        }
    }

    /// Full corpus text
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Names of the contributing files
    #[inline]
    #[must_use]
    pub fn file_names(&self) -> &[String] {
        &self.file_names
    }

    /// Whether the corpus has no content besides delimiters
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.blank
    }
}
