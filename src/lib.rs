#![forbid(unsafe_code)]
//! # keyword_gap
//!
//! Compares keyword usage between a news corpus and an academic paper corpus to
//! find topics that get more public than academic attention, and the reverse.
//!
//! The engine is a chain of pure stages:
//! - [`canon`]: synonym canonicalization and stopword filtering
//! - [`corpus`]: per-document keyword sets
//! - [`frequency`]: document frequencies, TF-IDF ranking and vocabulary overlap
//! - [`cooccur`]: co-occurrence rows for target keywords
//! - [`gap`]: the per-mille gap index and its two candidate lists
//!
//! [`sources`] and [`report`] do the file I/O around it, [`pipeline`] wires
//! everything together.
//!
//! ## Example
//! ```
//! use keyword_gap::{Canonicalizer, Source, extract_corpus, term_and_doc_frequency, tfidf};
//!
//! let canon = Canonicalizer::new(
//!     [("AI".to_string(), "인공지능".to_string())],
//!     Vec::<String>::new(),
//! );
//! let corpus = extract_corpus(Source::News, &canon, [Some("AI, 청년"), Some("인공지능"), None]);
//! assert_eq!(corpus.len(), 2);
//!
//! let freq = term_and_doc_frequency(&corpus);
//! assert_eq!(freq.get("인공지능"), 2);
//!
//! let ranked = tfidf(&corpus, &freq, 10).unwrap();
//! assert_eq!(ranked[0].keyword.as_str(), "인공지능");
//! ```

pub mod canon;
pub mod config;
pub mod cooccur;
pub mod corpus;
pub mod error;
pub mod frequency;
pub mod gap;
pub mod office;
pub mod pipeline;
pub mod report;
pub mod sources;

pub use canon::{Canonicalizer, Keyword, LexiconFile};
pub use config::{AnalysisConfig, GapScope, NewsColumns, PaperFields};
pub use cooccur::{
    CooccurrenceEntry, CooccurrenceMatrix, PairMentions, PairRecord, TargetSummary, cooccurrence,
    pair_mentions, pair_summary, resolve_targets, target_summaries, top_k,
};
pub use corpus::{Corpus, DocId, Document, Source, extract_corpus, extract_keywords};
pub use error::{AnalysisError, Result};
pub use frequency::{
    FrequencyTable, TfIdfRecord, VocabularyOverlap, idf, term_and_doc_frequency, tfidf,
    vocabulary_overlap,
};
pub use gap::{GapRecord, GapThresholds, academic_lead, blue_ocean, gap_analysis, per_mille};
pub use office::read_xlsx_rows;
pub use pipeline::{AnalysisReport, analyze_paths, analyze_records};
pub use report::{ExportFormat, csv_safe_cell, export_report, render_summary};
pub use sources::{RawRecord, collect_news_files, load_news, load_papers};
