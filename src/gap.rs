//! Gap index between public (news) and academic (papers) attention.
//!
//! `ratio = freq / doc_count * 1000` per corpus and `gap_index = news_ratio - paper_ratio`.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::canon::Keyword;
use crate::error::{AnalysisError, Result};
use crate::frequency::FrequencyTable;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapRecord {
    pub keyword: Keyword,
    pub news_freq: u64,
    pub paper_freq: u64,
    pub news_ratio: f64,
    pub paper_ratio: f64,
    pub gap_index: f64,
}

/// Classification floors and thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapThresholds {
    /// Blue-ocean candidates need `news_freq` strictly above this.
    pub news_min_freq: u64,
    /// Academic-lead topics need `paper_freq` strictly above this.
    pub paper_min_freq: u64,
    /// Blue-ocean candidates need `gap_index` strictly above this.
    pub blue_ocean_threshold: f64,
    /// Academic-lead topics need `gap_index` strictly below this.
    pub academic_threshold: f64,
}

impl Default for GapThresholds {
    fn default() -> Self {
        Self {
            news_min_freq: 100,
            paper_min_freq: 50,
            blue_ocean_threshold: 5.0,
            academic_threshold: -1.0,
        }
    }
}

impl GapThresholds {
    pub fn validate(&self) -> Result<()> {
        if !self.blue_ocean_threshold.is_finite() || !self.academic_threshold.is_finite() {
            return Err(AnalysisError::InvalidConfig(
                "gap thresholds must be finite numbers".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-mille share of `doc_count` documents. 0 for an empty corpus.
pub fn per_mille(freq: u64, doc_count: usize) -> f64 {
    if doc_count == 0 {
        0.0
    } else {
        freq as f64 / doc_count as f64 * 1000.0
    }
}

/// One record per keyword of either table, sorted by descending `gap_index`.
///
/// A keyword missing on one side counts as frequency 0 there. Equal gap indices keep
/// first-seen order: news keywords first, then keywords only the papers have.
pub fn gap_analysis(
    news_freq: &FrequencyTable,
    paper_freq: &FrequencyTable,
    news_docs: usize,
    paper_docs: usize,
) -> Vec<GapRecord> {
    let vocabulary: IndexSet<&Keyword> = news_freq
        .iter()
        .chain(paper_freq.iter())
        .map(|(k, _)| k)
        .collect();

    let mut records: Vec<GapRecord> = vocabulary
        .into_iter()
        .map(|keyword| {
            let news = news_freq.get(keyword.as_str());
            let paper = paper_freq.get(keyword.as_str());
            let news_ratio = per_mille(news, news_docs);
            let paper_ratio = per_mille(paper, paper_docs);
            GapRecord {
                keyword: keyword.clone(),
                news_freq: news,
                paper_freq: paper,
                news_ratio,
                paper_ratio,
                gap_index: news_ratio - paper_ratio,
            }
        })
        .collect();

    records.sort_by(|a, b| b.gap_index.total_cmp(&a.gap_index));
    records
}

/// Topics with disproportionate public interest, in gap order.
pub fn blue_ocean(records: &[GapRecord], thresholds: &GapThresholds) -> Vec<GapRecord> {
    records
        .iter()
        .filter(|r| {
            r.news_freq > thresholds.news_min_freq && r.gap_index > thresholds.blue_ocean_threshold
        })
        .cloned()
        .collect()
}

/// Topics academia leads on, most academically skewed first.
pub fn academic_lead(records: &[GapRecord], thresholds: &GapThresholds) -> Vec<GapRecord> {
    let mut out: Vec<GapRecord> = records
        .iter()
        .filter(|r| {
            r.paper_freq > thresholds.paper_min_freq && r.gap_index < thresholds.academic_threshold
        })
        .cloned()
        .collect();
    out.sort_by(|a, b| a.gap_index.total_cmp(&b.gap_index));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::Canonicalizer;

    fn table(entries: &[(&str, u64)]) -> FrequencyTable {
        let canon = Canonicalizer::default();
        entries
            .iter()
            .map(|(k, v)| (canon.canonicalize(k).unwrap(), *v))
            .collect()
    }

    #[test]
    fn union_with_missing_side_as_zero() {
        let news = table(&[("aa", 30), ("bb", 10)]);
        let papers = table(&[("bb", 5), ("cc", 40)]);
        let records = gap_analysis(&news, &papers, 100, 50);
        let names: Vec<&str> = records.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(names, vec!["aa", "bb", "cc"]);

        let aa = &records[0];
        assert_eq!(aa.paper_freq, 0);
        assert_eq!(aa.news_ratio, 300.0);
        assert_eq!(aa.gap_index, 300.0);

        let bb = &records[1];
        assert_eq!(bb.news_ratio, 100.0);
        assert_eq!(bb.paper_ratio, 100.0);
        assert_eq!(bb.gap_index, 0.0);

        let cc = &records[2];
        assert_eq!(cc.news_freq, 0);
        assert_eq!(cc.gap_index, -800.0);
    }

    #[test]
    fn sign_follows_ratio_order() {
        let news = table(&[("aa", 7), ("bb", 3), ("cc", 1)]);
        let papers = table(&[("aa", 2), ("bb", 9), ("cc", 3)]);
        for r in gap_analysis(&news, &papers, 13, 39) {
            if r.news_ratio > r.paper_ratio {
                assert!(r.gap_index > 0.0);
            } else if r.news_ratio < r.paper_ratio {
                assert!(r.gap_index < 0.0);
            } else {
                assert_eq!(r.gap_index, 0.0, "{}", r.keyword);
            }
        }
    }

    #[test]
    fn empty_corpus_yields_zero_ratios() {
        let news = table(&[("aa", 3)]);
        let papers = FrequencyTable::new();
        let records = gap_analysis(&news, &papers, 0, 0);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].news_ratio, 0.0);
        assert_eq!(records[0].paper_ratio, 0.0);
        assert_eq!(records[0].gap_index, 0.0);
    }

    #[test]
    fn classification_filters() {
        let news = table(&[("hot", 200), ("both", 150), ("quiet", 20), ("rare", 101)]);
        let papers = table(&[("both", 100), ("quiet", 80), ("deep", 90), ("rare", 1)]);
        let records = gap_analysis(&news, &papers, 1000, 1000);
        let t = GapThresholds::default();

        let blue_rows = blue_ocean(&records, &t);
        let blue: Vec<&str> = blue_rows.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(blue, vec!["hot", "rare", "both"]);

        let lead_rows = academic_lead(&records, &t);
        let lead: Vec<&str> = lead_rows.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(lead, vec!["deep", "quiet"]);
    }

    #[test]
    fn thresholds_are_injectable() {
        let news = table(&[("aa", 5)]);
        let papers = table(&[("aa", 1)]);
        let records = gap_analysis(&news, &papers, 10, 10);
        let loose = GapThresholds {
            news_min_freq: 0,
            paper_min_freq: 0,
            blue_ocean_threshold: 0.0,
            academic_threshold: 0.0,
        };
        assert_eq!(blue_ocean(&records, &loose).len(), 1);
        assert!(blue_ocean(&records, &GapThresholds::default()).is_empty());
        assert!(GapThresholds { blue_ocean_threshold: f64::NAN, ..loose }.validate().is_err());
    }
}
