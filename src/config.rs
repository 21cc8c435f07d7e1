//! Analysis settings.
//!
//! Everything numeric the engines need is passed in through [`AnalysisConfig`];
//! nothing reads global state. Defaults match the cut-offs the news/paper study
//! was run with.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::gap::GapThresholds;

/// Which keywords enter the gap analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GapScope {
    /// Only the target keywords (that occur in at least one corpus).
    #[default]
    Targets,
    /// Every keyword of both frequency tables.
    All,
}

/// Column headers of the news table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsColumns {
    pub keywords: String,
    pub category: String,
    pub title: String,
}

impl Default for NewsColumns {
    fn default() -> Self {
        Self {
            keywords: "키워드".to_string(),
            category: "통합 분류1".to_string(),
            title: "제목".to_string(),
        }
    }
}

/// Field names of the paper JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperFields {
    pub list: String,
    pub keywords: String,
    pub title: String,
    pub authors: String,
}

impl Default for PaperFields {
    fn default() -> Self {
        Self {
            list: "NODE_LIST".to_string(),
            keywords: "KYWD".to_string(),
            title: "TITLE".to_string(),
            authors: "AUTHORS".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub news_tfidf_top_n: usize,
    pub paper_tfidf_top_n: usize,
    pub common_keyword_top_n: usize,
    pub cooccurrence_top_k: usize,
    /// Rows shown per section in the printed summary.
    pub report_top_n: usize,
    pub gap: GapThresholds,
    pub gap_scope: GapScope,
    /// Keywords whose co-occurrence rows are computed. Raw spellings are allowed;
    /// they are canonicalized before use.
    pub targets: Vec<String>,
    /// Keyword pairs whose shared documents are listed.
    pub pairs: Vec<(String, String)>,
    /// News rows in these categories are skipped before extraction.
    pub news_exclude_categories: Vec<String>,
    pub news_columns: NewsColumns,
    pub paper_fields: PaperFields,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            news_tfidf_top_n: 500,
            paper_tfidf_top_n: 500,
            common_keyword_top_n: 300,
            cooccurrence_top_k: 20,
            report_top_n: 20,
            gap: GapThresholds::default(),
            gap_scope: GapScope::default(),
            targets: Vec::new(),
            pairs: Vec::new(),
            news_exclude_categories: Vec::new(),
            news_columns: NewsColumns::default(),
            paper_fields: PaperFields::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Reject settings that would silently produce empty or misleading results.
    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("news_tfidf_top_n", self.news_tfidf_top_n),
            ("paper_tfidf_top_n", self.paper_tfidf_top_n),
            ("common_keyword_top_n", self.common_keyword_top_n),
            ("cooccurrence_top_k", self.cooccurrence_top_k),
            ("report_top_n", self.report_top_n),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{name} must be at least 1"
                )));
            }
        }
        if self.targets.is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "at least one target keyword is required".to_string(),
            ));
        }
        self.gap.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: AnalysisConfig = serde_json::from_str(
            r#"{ "news_tfidf_top_n": 50, "targets": ["AI"], "gap": { "news_min_freq": 3 }, "gap_scope": "all" }"#,
        )
        .unwrap();
        assert_eq!(cfg.news_tfidf_top_n, 50);
        assert_eq!(cfg.paper_tfidf_top_n, 500);
        assert_eq!(cfg.gap.news_min_freq, 3);
        assert_eq!(cfg.gap.paper_min_freq, 50);
        assert_eq!(cfg.gap_scope, GapScope::All);
        assert_eq!(cfg.news_columns.keywords, "키워드");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_counts_are_rejected() {
        let cfg = AnalysisConfig {
            targets: vec!["AI".to_string()],
            paper_tfidf_top_n: 0,
            ..AnalysisConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("paper_tfidf_top_n"));
    }

    #[test]
    fn missing_targets_are_rejected() {
        assert!(matches!(
            AnalysisConfig::default().validate(),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }
}
