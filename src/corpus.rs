//! Per-document keyword sets.
//!
//! A raw keyword field is a comma separated string. Every token is canonicalized,
//! invalid tokens are dropped and repeats collapse, so each [`Document`] holds a set.
//! Documents that end up empty are not part of the corpus at all.

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::canon::{Canonicalizer, Keyword};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    News,
    Papers,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::News => f.write_str("news"),
            Source::Papers => f.write_str("papers"),
        }
    }
}

/// Identifies a document by its source and its position in the source's record list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DocId {
    pub source: Source,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct Document {
    id: DocId,
    keywords: IndexSet<Keyword>,
}

impl Document {
    pub fn id(&self) -> DocId {
        self.id
    }

    /// Keywords in first-seen order.
    pub fn keywords(&self) -> &IndexSet<Keyword> {
        &self.keywords
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.keywords.contains(keyword)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// The documents of one source, in source order.
#[derive(Debug, Clone)]
pub struct Corpus {
    source: Source,
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            documents: Vec::new(),
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Add the document at `index` if its field yields at least one keyword.
    /// Returns whether it was kept.
    pub fn push_field(&mut self, canon: &Canonicalizer, index: usize, field: Option<&str>) -> bool {
        let keywords = extract_keywords(canon, field);
        if keywords.is_empty() {
            return false;
        }
        self.documents.push(Document {
            id: DocId {
                source: self.source,
                index,
            },
            keywords,
        });
        true
    }
}

/// Canonical keyword set of one raw field. A missing field yields an empty set.
pub fn extract_keywords(canon: &Canonicalizer, field: Option<&str>) -> IndexSet<Keyword> {
    let Some(field) = field else {
        return IndexSet::new();
    };
    field
        .split(',')
        .filter_map(|token| canon.canonicalize(token))
        .collect()
}

/// Build a corpus from raw fields in source order. The position of a field in
/// `fields` becomes the document index.
pub fn extract_corpus<'a, I>(source: Source, canon: &Canonicalizer, fields: I) -> Corpus
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut corpus = Corpus::new(source);
    for (index, field) in fields.into_iter().enumerate() {
        corpus.push_field(canon, index, field);
    }
    corpus
}
