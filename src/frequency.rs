//! Frequency tables and TF-IDF ranking.

use indexmap::IndexMap;
use indexmap::map::Entry;
use rayon::prelude::*;
use serde::Serialize;

use crate::canon::Keyword;
use crate::corpus::Corpus;
use crate::error::{AnalysisError, Result};

/// Keyword counts with increment-on-absence semantics.
///
/// Keys keep first-seen order, which is the tie-break order of every ranking built
/// from a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FrequencyTable {
    counts: IndexMap<Keyword, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of `keyword`, 0 when absent.
    pub fn get(&self, keyword: &str) -> u64 {
        self.counts.get(keyword).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, keyword: &Keyword) {
        self.add(keyword, 1);
    }

    pub fn add(&mut self, keyword: &Keyword, by: u64) {
        match self.counts.entry(keyword.clone()) {
            Entry::Occupied(mut slot) => *slot.get_mut() += by,
            Entry::Vacant(slot) => {
                slot.insert(by);
            }
        }
    }

    /// Sum `other` into `self`. Keys new to `self` are appended in `other`'s order.
    pub fn merge(mut self, other: FrequencyTable) -> FrequencyTable {
        if self.counts.is_empty() {
            return other;
        }
        for (keyword, count) in other.counts {
            *self.counts.entry(keyword).or_insert(0) += count;
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Keyword, u64)> {
        self.counts.iter().map(|(k, v)| (k, *v))
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.counts.contains_key(keyword)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sub-table holding only `keywords` that have a nonzero count, in `keywords` order.
    pub fn restricted_to(&self, keywords: &[Keyword]) -> FrequencyTable {
        let mut out = FrequencyTable::new();
        for keyword in keywords {
            let count = self.get(keyword.as_str());
            if count > 0 && !out.contains(keyword.as_str()) {
                out.add(keyword, count);
            }
        }
        out
    }

    /// Entries by descending count, ties in first-seen order.
    pub fn ranked(&self) -> Vec<(Keyword, u64)> {
        let mut entries: Vec<(Keyword, u64)> =
            self.counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

impl FromIterator<(Keyword, u64)> for FrequencyTable {
    fn from_iter<T: IntoIterator<Item = (Keyword, u64)>>(iter: T) -> Self {
        let mut table = FrequencyTable::new();
        for (keyword, count) in iter {
            table.add(&keyword, count);
        }
        table
    }
}

/// Number of documents containing each keyword.
///
/// Documents are sets, so this is both the term frequency and the document
/// frequency. Partitions are counted in parallel and merged in order, giving the
/// same table (including key order) as a sequential pass.
pub fn term_and_doc_frequency(corpus: &Corpus) -> FrequencyTable {
    corpus
        .documents()
        .par_iter()
        .fold(FrequencyTable::new, |mut table, doc| {
            for keyword in doc.keywords() {
                table.increment(keyword);
            }
            table
        })
        .reduce(FrequencyTable::new, FrequencyTable::merge)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TfIdfRecord {
    pub keyword: Keyword,
    pub score: f64,
    pub freq: u64,
}

/// `idf = ln(total_docs / doc_freq) + 1`.
pub fn idf(total_docs: usize, doc_freq: u64) -> f64 {
    (total_docs as f64 / doc_freq as f64).ln() + 1.0
}

/// Score every keyword of `term_freq` against `corpus` and keep the best `top_n`.
///
/// `score = tf * (ln(N / df) + 1)` with `df` counted on `corpus`. Ranking is by
/// descending score; equal scores keep the order of `term_freq`.
///
/// Fails with [`AnalysisError::ZeroDocumentFrequency`] when a keyword of
/// `term_freq` occurs in no document of `corpus`.
pub fn tfidf(corpus: &Corpus, term_freq: &FrequencyTable, top_n: usize) -> Result<Vec<TfIdfRecord>> {
    if top_n == 0 {
        return Err(AnalysisError::InvalidConfig(
            "TF-IDF top-N must be at least 1".to_string(),
        ));
    }

    let doc_freq = term_and_doc_frequency(corpus);
    let total_docs = corpus.len();

    let mut records = Vec::with_capacity(term_freq.len());
    for (keyword, tf) in term_freq.iter() {
        if tf == 0 {
            continue;
        }
        let df = doc_freq.get(keyword.as_str());
        if df == 0 {
            return Err(AnalysisError::ZeroDocumentFrequency {
                keyword: keyword.to_string(),
            });
        }
        records.push(TfIdfRecord {
            keyword: keyword.clone(),
            score: tf as f64 * idf(total_docs, df),
            freq: tf,
        });
    }

    records.sort_by(|a, b| b.score.total_cmp(&a.score));
    records.truncate(top_n);
    Ok(records)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedKeyword {
    pub keyword: Keyword,
    pub news_freq: u64,
    pub paper_freq: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExclusiveKeyword {
    pub keyword: Keyword,
    pub freq: u64,
}

/// Which of the top TF-IDF keywords both corpora share and which are exclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VocabularyOverlap {
    /// Sorted by descending paper frequency.
    pub common: Vec<SharedKeyword>,
    /// Sorted by descending news frequency.
    pub news_only: Vec<ExclusiveKeyword>,
    /// Sorted by descending paper frequency.
    pub paper_only: Vec<ExclusiveKeyword>,
}

/// Compare the first `top_n` entries of two ranked TF-IDF lists.
/// Ties keep news TF-IDF rank order (paper rank order for `paper_only`).
pub fn vocabulary_overlap(
    news_tfidf: &[TfIdfRecord],
    paper_tfidf: &[TfIdfRecord],
    news_freq: &FrequencyTable,
    paper_freq: &FrequencyTable,
    top_n: usize,
) -> Result<VocabularyOverlap> {
    if top_n == 0 {
        return Err(AnalysisError::InvalidConfig(
            "common keyword top-N must be at least 1".to_string(),
        ));
    }

    let news_top: indexmap::IndexSet<&Keyword> =
        news_tfidf.iter().take(top_n).map(|r| &r.keyword).collect();
    let paper_top: indexmap::IndexSet<&Keyword> =
        paper_tfidf.iter().take(top_n).map(|r| &r.keyword).collect();

    let mut overlap = VocabularyOverlap::default();
    for keyword in &news_top {
        if paper_top.contains(*keyword) {
            overlap.common.push(SharedKeyword {
                keyword: (*keyword).clone(),
                news_freq: news_freq.get(keyword.as_str()),
                paper_freq: paper_freq.get(keyword.as_str()),
            });
        } else {
            overlap.news_only.push(ExclusiveKeyword {
                keyword: (*keyword).clone(),
                freq: news_freq.get(keyword.as_str()),
            });
        }
    }
    for keyword in &paper_top {
        if !news_top.contains(*keyword) {
            overlap.paper_only.push(ExclusiveKeyword {
                keyword: (*keyword).clone(),
                freq: paper_freq.get(keyword.as_str()),
            });
        }
    }

    overlap.common.sort_by(|a, b| b.paper_freq.cmp(&a.paper_freq));
    overlap.news_only.sort_by(|a, b| b.freq.cmp(&a.freq));
    overlap.paper_only.sort_by(|a, b| b.freq.cmp(&a.freq));
    Ok(overlap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::Canonicalizer;
    use crate::corpus::{Source, extract_corpus};

    fn corpus(fields: &[&str]) -> Corpus {
        extract_corpus(
            Source::News,
            &Canonicalizer::default(),
            fields.iter().map(|f| Some(*f)),
        )
    }

    #[test]
    fn counts_once_per_document() {
        let c = corpus(&["aa, bb", "aa, cc", "bb, cc", "aa, aa, aa"]);
        let table = term_and_doc_frequency(&c);
        assert_eq!(table.get("aa"), 3);
        assert_eq!(table.get("bb"), 2);
        assert_eq!(table.get("cc"), 2);
        assert_eq!(table.get("zz"), 0);
        let order: Vec<&str> = table.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(order, vec!["aa", "bb", "cc"]);
    }

    #[test]
    fn frequency_never_exceeds_document_count() {
        let fields: Vec<String> = (0..500)
            .map(|i| format!("k{}, k{}, shared", i % 7, i % 13))
            .collect();
        let c = corpus(&fields.iter().map(String::as_str).collect::<Vec<_>>());
        let table = term_and_doc_frequency(&c);
        for (keyword, count) in table.iter() {
            let holders = c.documents().iter().filter(|d| d.contains(keyword.as_str())).count();
            assert_eq!(count as usize, holders);
            assert!(count as usize <= c.len());
        }
        assert_eq!(table.get("shared"), 500);
    }

    #[test]
    fn tfidf_matches_reference_value() {
        let mut fields = vec!["term, other"; 4];
        fields.extend(vec!["other"; 6]);
        let c = corpus(&fields);
        let table = term_and_doc_frequency(&c);
        let ranked = tfidf(&c, &table, 10).unwrap();
        let term = ranked.iter().find(|r| r.keyword.as_str() == "term").unwrap();
        assert!((idf(10, 4) - 1.916_290_731_874_155).abs() < 1e-12);
        assert!((term.score - 7.665_162_927_496_62).abs() < 1e-9);
        assert_eq!(term.freq, 4);
        // "other": tf 10, idf 1.0
        assert_eq!(ranked[0].keyword.as_str(), "other");
        assert!((ranked[0].score - 10.0).abs() < 1e-12);
    }

    #[test]
    fn tfidf_truncates_and_breaks_ties_by_first_seen() {
        let c = corpus(&["bb, aa", "cc"]);
        let table = term_and_doc_frequency(&c);
        let ranked = tfidf(&c, &table, 2).unwrap();
        let names: Vec<&str> = ranked.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(names, vec!["bb", "aa"]);
    }

    #[test]
    fn tfidf_rejects_zero_top_n() {
        let c = corpus(&["aa"]);
        let table = term_and_doc_frequency(&c);
        assert!(matches!(
            tfidf(&c, &table, 0),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn tfidf_flags_foreign_frequency_table() {
        let c = corpus(&["aa"]);
        let other = term_and_doc_frequency(&corpus(&["zz"]));
        match tfidf(&c, &other, 5) {
            Err(AnalysisError::ZeroDocumentFrequency { keyword }) => assert_eq!(keyword, "zz"),
            other => panic!("expected invariant violation, got {other:?}"),
        }
    }

    #[test]
    fn overlap_splits_shared_and_exclusive() {
        let news = corpus(&["aa, bb", "aa, cc", "aa"]);
        let papers = corpus(&["bb, dd", "bb", "dd, aa"]);
        let nf = term_and_doc_frequency(&news);
        let pf = term_and_doc_frequency(&papers);
        let nt = tfidf(&news, &nf, 10).unwrap();
        let pt = tfidf(&papers, &pf, 10).unwrap();
        let overlap = vocabulary_overlap(&nt, &pt, &nf, &pf, 10).unwrap();

        let common: Vec<(&str, u64, u64)> = overlap
            .common
            .iter()
            .map(|s| (s.keyword.as_str(), s.news_freq, s.paper_freq))
            .collect();
        assert_eq!(common, vec![("bb", 1, 2), ("aa", 3, 1)]);
        assert_eq!(overlap.news_only.len(), 1);
        assert_eq!(overlap.news_only[0].keyword.as_str(), "cc");
        assert_eq!(overlap.paper_only[0].keyword.as_str(), "dd");
        assert_eq!(overlap.paper_only[0].freq, 2);
    }

    #[test]
    fn restricted_table_drops_absent_keywords() {
        let c = corpus(&["aa, bb", "bb"]);
        let table = term_and_doc_frequency(&c);
        let canon = Canonicalizer::default();
        let wanted: Vec<Keyword> = ["bb", "zz"]
            .iter()
            .filter_map(|k| canon.canonicalize(k))
            .collect();
        let sub = table.restricted_to(&wanted);
        assert_eq!(sub.len(), 1);
        assert_eq!(sub.get("bb"), 2);
    }
}
