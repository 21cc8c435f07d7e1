//! Co-occurrence of target keywords with everything else.
//!
//! For every document containing a target, each other keyword of that document
//! counts one for the target's row. Rows exist only for targets.

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;

use crate::canon::{Canonicalizer, Keyword};
use crate::corpus::{Corpus, DocId};
use crate::error::{AnalysisError, Result};
use crate::frequency::FrequencyTable;

/// Target keyword -> co-occurring keyword -> number of documents holding both.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CooccurrenceMatrix {
    rows: IndexMap<Keyword, FrequencyTable>,
}

impl CooccurrenceMatrix {
    fn with_targets(targets: &[Keyword]) -> Self {
        Self {
            rows: targets
                .iter()
                .map(|t| (t.clone(), FrequencyTable::new()))
                .collect(),
        }
    }

    /// Row of `target`, `None` when it was not requested.
    pub fn row(&self, target: &str) -> Option<&FrequencyTable> {
        self.rows.get(target)
    }

    /// Count for `(target, other)`, 0 when either is absent.
    pub fn get(&self, target: &str, other: &str) -> u64 {
        self.row(target).map(|row| row.get(other)).unwrap_or(0)
    }

    pub fn targets(&self) -> impl Iterator<Item = &Keyword> {
        self.rows.keys()
    }

    fn merge(mut self, other: CooccurrenceMatrix) -> CooccurrenceMatrix {
        for (target, row) in other.rows {
            let slot = self.rows.entry(target).or_default();
            *slot = std::mem::take(slot).merge(row);
        }
        self
    }
}

/// Canonicalize and validate target keywords, dropping repeats.
///
/// Fails on an empty list or on a target whose canonical form is not a valid keyword.
pub fn resolve_targets<S: AsRef<str>>(canon: &Canonicalizer, raw: &[S]) -> Result<Vec<Keyword>> {
    if raw.is_empty() {
        return Err(AnalysisError::InvalidConfig(
            "at least one target keyword is required".to_string(),
        ));
    }
    let mut out: Vec<Keyword> = Vec::with_capacity(raw.len());
    for target in raw {
        let keyword = canon
            .canonicalize(target.as_ref())
            .ok_or_else(|| AnalysisError::InvalidTarget {
                keyword: target.as_ref().to_string(),
            })?;
        if !out.contains(&keyword) {
            out.push(keyword);
        }
    }
    Ok(out)
}

/// Build the co-occurrence rows for `targets` over `corpus`.
///
/// One membership check per document and target; documents are processed in
/// parallel partitions whose partial matrices are summed in order.
pub fn cooccurrence(corpus: &Corpus, targets: &[Keyword]) -> CooccurrenceMatrix {
    corpus
        .documents()
        .par_iter()
        .fold(
            || CooccurrenceMatrix::with_targets(targets),
            |mut matrix, doc| {
                for target in targets {
                    if !doc.contains(target.as_str()) {
                        continue;
                    }
                    if let Some(row) = matrix.rows.get_mut(target.as_str()) {
                        for other in doc.keywords() {
                            if other != target {
                                row.increment(other);
                            }
                        }
                    }
                }
                matrix
            },
        )
        .reduce(|| CooccurrenceMatrix::with_targets(targets), CooccurrenceMatrix::merge)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CooccurrenceEntry {
    pub keyword: Keyword,
    pub count: u64,
}

/// The `k` keywords seen most often with `target`, descending by count, ties in
/// first-seen order. Empty when the target never co-occurs or was not requested.
pub fn top_k(matrix: &CooccurrenceMatrix, target: &str, k: usize) -> Result<Vec<CooccurrenceEntry>> {
    if k == 0 {
        return Err(AnalysisError::InvalidConfig(
            "co-occurrence top-k must be at least 1".to_string(),
        ));
    }
    let Some(row) = matrix.row(target) else {
        return Ok(Vec::new());
    };
    Ok(row
        .ranked()
        .into_iter()
        .take(k)
        .map(|(keyword, count)| CooccurrenceEntry { keyword, count })
        .collect())
}

/// A target with its document frequency and its strongest companions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSummary {
    pub keyword: Keyword,
    pub freq: u64,
    pub top: Vec<CooccurrenceEntry>,
}

impl TargetSummary {
    /// Share of the target's documents that also contain `entry`, in percent.
    pub fn rate(&self, entry: &CooccurrenceEntry) -> f64 {
        if self.freq == 0 {
            0.0
        } else {
            entry.count as f64 / self.freq as f64 * 100.0
        }
    }
}

pub fn target_summaries(
    matrix: &CooccurrenceMatrix,
    freq: &FrequencyTable,
    k: usize,
) -> Result<Vec<TargetSummary>> {
    matrix
        .targets()
        .map(|target| -> Result<TargetSummary> {
            Ok(TargetSummary {
                keyword: target.clone(),
                freq: freq.get(target.as_str()),
                top: top_k(matrix, target.as_str(), k)?,
            })
        })
        .collect()
}

/// Co-occurrence of two targets in both corpora.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairRecord {
    pub first: Keyword,
    pub second: Keyword,
    pub news_count: u64,
    pub paper_count: u64,
}

/// Every unordered pair of distinct targets (`first < second`), sorted by the
/// combined count of both corpora, descending.
pub fn pair_summary(
    news: &CooccurrenceMatrix,
    papers: &CooccurrenceMatrix,
    targets: &[Keyword],
) -> Vec<PairRecord> {
    let mut pairs = Vec::new();
    for a in targets {
        for b in targets {
            if a >= b {
                continue;
            }
            pairs.push(PairRecord {
                first: a.clone(),
                second: b.clone(),
                news_count: news.get(a.as_str(), b.as_str()),
                paper_count: papers.get(a.as_str(), b.as_str()),
            });
        }
    }
    pairs.sort_by(|x, y| (y.news_count + y.paper_count).cmp(&(x.news_count + x.paper_count)));
    pairs
}

/// Documents mentioning both keywords of a pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairMentions {
    pub first: Keyword,
    pub second: Keyword,
    pub documents: Vec<DocId>,
}

pub fn pair_mentions(corpus: &Corpus, pairs: &[(Keyword, Keyword)]) -> Vec<PairMentions> {
    pairs
        .iter()
        .map(|(a, b)| PairMentions {
            first: a.clone(),
            second: b.clone(),
            documents: corpus
                .documents()
                .iter()
                .filter(|doc| doc.contains(a.as_str()) && doc.contains(b.as_str()))
                .map(|doc| doc.id())
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Source, extract_corpus};
    use crate::frequency::term_and_doc_frequency;

    fn canon() -> Canonicalizer {
        Canonicalizer::default()
    }

    fn corpus(fields: &[&str]) -> Corpus {
        extract_corpus(Source::Papers, &canon(), fields.iter().map(|f| Some(*f)))
    }

    fn targets(raw: &[&str]) -> Vec<Keyword> {
        resolve_targets(&canon(), raw).unwrap()
    }

    #[test]
    fn three_document_scenario() {
        let c = corpus(&["aa, bb", "aa, cc", "bb, cc"]);
        let m = cooccurrence(&c, &targets(&["aa"]));
        assert_eq!(term_and_doc_frequency(&c).get("aa"), 2);
        assert_eq!(m.get("aa", "bb"), 1);
        assert_eq!(m.get("aa", "cc"), 1);
        assert!(!m.row("aa").unwrap().contains("aa"));
        assert!(m.row("bb").is_none());
    }

    #[test]
    fn matrix_is_symmetric_between_targets() {
        let c = corpus(&[
            "aa, bb, cc",
            "aa, bb",
            "bb, cc, dd",
            "aa, dd",
            "cc",
            "aa, bb, cc, dd",
        ]);
        let t = targets(&["aa", "bb", "cc", "dd"]);
        let m = cooccurrence(&c, &t);
        for a in &t {
            for b in &t {
                if a != b {
                    assert_eq!(m.get(a.as_str(), b.as_str()), m.get(b.as_str(), a.as_str()));
                }
            }
        }
        assert_eq!(m.get("aa", "bb"), 3);
    }

    #[test]
    fn parallel_matches_sequential_on_large_corpus() {
        let fields: Vec<String> = (0..2_000)
            .map(|i| format!("t{}, w{}, w{}", i % 3, i % 11, i % 17))
            .collect();
        let c = corpus(&fields.iter().map(String::as_str).collect::<Vec<_>>());
        let t = targets(&["t0", "t1"]);
        let m = cooccurrence(&c, &t);
        for target in &t {
            for doc in c.documents() {
                for other in doc.keywords() {
                    let expected = c
                        .documents()
                        .iter()
                        .filter(|d| d.contains(target.as_str()) && d.contains(other.as_str()))
                        .count() as u64;
                    if other != target {
                        assert_eq!(m.get(target.as_str(), other.as_str()), expected);
                    }
                }
            }
        }
    }

    #[test]
    fn top_k_orders_by_count_then_first_seen() {
        let c = corpus(&["aa, xx, yy", "aa, yy, zz", "aa, zz", "aa, ww"]);
        let m = cooccurrence(&c, &targets(&["aa"]));
        let top = top_k(&m, "aa", 3).unwrap();
        let got: Vec<(&str, u64)> = top.iter().map(|e| (e.keyword.as_str(), e.count)).collect();
        assert_eq!(got, vec![("yy", 2), ("zz", 2), ("xx", 1)]);
    }

    #[test]
    fn top_k_is_empty_for_isolated_target() {
        let c = corpus(&["aa", "bb, cc"]);
        let m = cooccurrence(&c, &targets(&["aa", "qq"]));
        assert!(top_k(&m, "aa", 5).unwrap().is_empty());
        assert!(top_k(&m, "qq", 5).unwrap().is_empty());
        assert!(top_k(&m, "not-a-target", 5).unwrap().is_empty());
        assert!(matches!(top_k(&m, "aa", 0), Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn invalid_targets_fail_fast() {
        let stop = Canonicalizer::new(Vec::<(String, String)>::new(), ["blocked".to_string()]);
        assert!(matches!(
            resolve_targets(&stop, &["ok", "blocked"]),
            Err(AnalysisError::InvalidTarget { keyword }) if keyword == "blocked"
        ));
        assert!(matches!(
            resolve_targets(&stop, &["x"]),
            Err(AnalysisError::InvalidTarget { .. })
        ));
        assert!(matches!(
            resolve_targets::<&str>(&stop, &[]),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn targets_resolve_through_synonyms() {
        let c = Canonicalizer::new(
            [("AI".to_string(), "인공지능".to_string())],
            Vec::<String>::new(),
        );
        let t = resolve_targets(&c, &["AI", "인공지능", "청년"]).unwrap();
        let names: Vec<&str> = t.iter().map(Keyword::as_str).collect();
        assert_eq!(names, vec!["인공지능", "청년"]);
    }

    #[test]
    fn pair_summary_and_mentions() {
        let news = corpus(&["aa, bb", "aa, bb, cc", "cc", "aa, bb"]);
        let papers = corpus(&["bb, cc", "aa, cc"]);
        let t = targets(&["cc", "aa", "bb"]);
        let nm = cooccurrence(&news, &t);
        let pm = cooccurrence(&papers, &t);
        let pairs = pair_summary(&nm, &pm, &t);
        let got: Vec<(&str, &str, u64, u64)> = pairs
            .iter()
            .map(|p| (p.first.as_str(), p.second.as_str(), p.news_count, p.paper_count))
            .collect();
        assert_eq!(
            got,
            vec![("aa", "bb", 3, 0), ("aa", "cc", 1, 1), ("bb", "cc", 1, 1)]
        );

        let mentions = pair_mentions(&news, &[(t[1].clone(), t[2].clone())]);
        let idx: Vec<usize> = mentions[0].documents.iter().map(|d| d.index).collect();
        assert_eq!(idx, vec![0, 1, 3]);
    }

    #[test]
    fn summaries_report_rates() {
        let c = corpus(&["aa, bb", "aa, bb", "aa, cc", "aa"]);
        let t = targets(&["aa"]);
        let m = cooccurrence(&c, &t);
        let f = term_and_doc_frequency(&c);
        let summaries = target_summaries(&m, &f, 5).unwrap();
        assert_eq!(summaries[0].freq, 4);
        let bb = &summaries[0].top[0];
        assert_eq!(bb.keyword.as_str(), "bb");
        assert!((summaries[0].rate(bb) - 50.0).abs() < 1e-12);
    }
}
