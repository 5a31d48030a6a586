//! Citation scanning: find `Title N, Section M` references in document text.
//!
//! Matching is purely lexical. Nothing checks that the cited title or
//! section exists; the scanner reports whatever the text says.
//!
//! ## Canonical form
//!
//! The default pattern is case-insensitive and tolerates any amount of
//! whitespace (including none) between tokens and around the comma, so
//! `"Title 5, Section 552"` and `"title 5,section  552"` are the same
//! citation. Each match is reduced to its two digit runs and re-rendered as
//! `Title <n>, Section <m>`; that canonical string is both the
//! deduplication key and what lands in the output table. Digit runs are kept
//! verbatim (`Title 05` stays `05`).

use crate::error::HarvestError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Source of the default U.S. Code citation pattern.
pub const US_CODE_PATTERN: &str =
    r"(?i)\bTitle\s*(?P<title>\d+)\s*,\s*Section\s*(?P<section>\d+)\b";

static DEFAULT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(US_CODE_PATTERN).expect("built-in citation pattern compiles"));

/// A compiled citation pattern.
///
/// Any regex works as long as it exposes `title` and `section` named
/// groups; those two captures are all the scanner reads from a match.
#[derive(Debug, Clone)]
pub struct CitationPattern {
    regex: Regex,
}

impl CitationPattern {
    /// Compile `pattern`, checking for the required named groups.
    pub fn new(pattern: &str) -> Result<Self, HarvestError> {
        let regex = Regex::new(pattern).map_err(|e| {
            HarvestError::InvalidConfig(format!("citation pattern does not compile: {e}"))
        })?;
        Self::from_regex(regex)
    }

    /// Wrap an already-compiled regex, checking for the required named groups.
    pub fn from_regex(regex: Regex) -> Result<Self, HarvestError> {
        let names: Vec<&str> = regex.capture_names().flatten().collect();
        for required in ["title", "section"] {
            if !names.contains(&required) {
                return Err(HarvestError::InvalidConfig(format!(
                    "citation pattern must define a `(?P<{required}>…)` group"
                )));
            }
        }
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for CitationPattern {
    fn default() -> Self {
        Self {
            regex: DEFAULT_REGEX.clone(),
        }
    }
}

/// One U.S. Code citation, reduced to its title and section numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub section: String,
}

impl Citation {
    pub fn new(title: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            section: section.into(),
        }
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Title {}, Section {}", self.title, self.section)
    }
}

/// Applies a [`CitationPattern`] to text blobs.
#[derive(Debug, Clone, Default)]
pub struct CitationScanner {
    pattern: CitationPattern,
}

impl CitationScanner {
    pub fn new(pattern: CitationPattern) -> Self {
        Self { pattern }
    }

    /// Return the distinct citations in `text`, in order of first occurrence.
    pub fn scan(&self, text: &str) -> Vec<Citation> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for caps in self.pattern.regex.captures_iter(text) {
            let (Some(title), Some(section)) = (caps.name("title"), caps.name("section")) else {
                continue;
            };
            let citation = Citation::new(title.as_str(), section.as_str());
            if seen.insert(citation.clone()) {
                found.push(citation);
            }
        }

        found
    }
}
