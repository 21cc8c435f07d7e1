//! Keyword canonicalization.
//!
//! A raw keyword goes through two steps: [`Canonicalizer::normalize`] trims it and maps
//! it through the synonym table, then [`Canonicalizer::is_valid`] decides whether the
//! canonical form is kept. Validity is always judged on the canonical form, so a
//! harmless surface spelling that canonicalizes to a stopword is dropped.

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Shortest accepted keyword, in characters.
pub const MIN_KEYWORD_CHARS: usize = 2;
/// Longest accepted keyword, in characters.
pub const MAX_KEYWORD_CHARS: usize = 30;

/// A normalized keyword that passed validation.
///
/// Only [`Canonicalizer::canonicalize`] produces values of this type, so holding a
/// `Keyword` means it is 2..=30 characters, not all ASCII digits and not a stopword.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Keyword(String);

impl Keyword {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Borrow<str> for Keyword {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Keyword {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// On-disk shape of a lexicon file.
///
/// ```json
/// { "synonyms": { "AI": "인공지능" }, "stopwords": ["대통령"] }
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LexiconFile {
    pub synonyms: IndexMap<String, String>,
    pub stopwords: Vec<String>,
}

/// Synonym table plus stopword set.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    synonyms: HashMap<String, String>,
    stopwords: HashSet<String>,
}

impl Canonicalizer {
    /// Build from a synonym table and a stopword list.
    ///
    /// Keys and values are trimmed and synonym chains are collapsed (`a -> b -> c`
    /// becomes `a -> c`), which keeps `normalize` idempotent. A cycle resolves to its
    /// lexicographically smallest member.
    pub fn new<S, W>(synonyms: S, stopwords: W) -> Self
    where
        S: IntoIterator<Item = (String, String)>,
        W: IntoIterator<Item = String>,
    {
        let mut raw: IndexMap<String, String> = IndexMap::new();
        for (from, to) in synonyms {
            let from = from.trim().to_string();
            let to = to.trim().to_string();
            if from.is_empty() || to.is_empty() {
                continue;
            }
            raw.insert(from, to);
        }

        let mut resolved = HashMap::with_capacity(raw.len());
        for key in raw.keys() {
            let target = resolve_chain(&raw, key);
            if &target != key {
                resolved.insert(key.clone(), target);
            }
        }

        let stopwords = stopwords
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        Self {
            synonyms: resolved,
            stopwords,
        }
    }

    pub fn from_lexicon(file: LexiconFile) -> Self {
        Self::new(file.synonyms, file.stopwords)
    }

    /// Load a JSON lexicon file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let file: LexiconFile = serde_json::from_str(&text)?;
        Ok(Self::from_lexicon(file))
    }

    /// Add stopwords from a plain text file, one word per line.
    /// Blank lines and lines starting with `#` are skipped.
    pub fn add_stopwords_file(&mut self, path: &Path) -> Result<usize> {
        let text = fs::read_to_string(path)?;
        let before = self.stopwords.len();
        for line in text.lines() {
            let word = line.trim();
            if word.is_empty() || word.starts_with('#') {
                continue;
            }
            self.stopwords.insert(word.to_string());
        }
        Ok(self.stopwords.len() - before)
    }

    /// Trim and map through the synonym table (exact, case-sensitive match).
    pub fn normalize<'a>(&'a self, raw: &'a str) -> &'a str {
        let trimmed = raw.trim();
        match self.synonyms.get(trimmed) {
            Some(canonical) => canonical.as_str(),
            None => trimmed,
        }
    }

    pub fn is_valid(&self, candidate: &str) -> bool {
        if candidate.trim().is_empty() {
            return false;
        }
        let chars = candidate.chars().count();
        if !(MIN_KEYWORD_CHARS..=MAX_KEYWORD_CHARS).contains(&chars) {
            return false;
        }
        if candidate.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        !self.stopwords.contains(candidate)
    }

    /// Normalize then validate. `None` when the canonical form is rejected.
    pub fn canonicalize(&self, raw: &str) -> Option<Keyword> {
        let canonical = self.normalize(raw);
        self.is_valid(canonical)
            .then(|| Keyword(canonical.to_string()))
    }

    pub fn synonym_count(&self) -> usize {
        self.synonyms.len()
    }

    pub fn stopword_count(&self) -> usize {
        self.stopwords.len()
    }
}

fn resolve_chain(table: &IndexMap<String, String>, start: &str) -> String {
    let mut path: Vec<&str> = vec![start];
    let mut current = start;
    while let Some(next) = table.get(current) {
        if let Some(pos) = path.iter().position(|seen| *seen == next.as_str()) {
            let cycle_min = path[pos..].iter().min().copied().unwrap_or(next.as_str());
            return cycle_min.to_string();
        }
        path.push(next.as_str());
        current = next.as_str();
    }
    current.to_string()
}
