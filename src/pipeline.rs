//! Runs the whole analysis: raw records in, [`AnalysisReport`] out.

use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::canon::{Canonicalizer, Keyword};
use crate::config::{AnalysisConfig, GapScope};
use crate::cooccur::{
    CooccurrenceMatrix, PairMentions, PairRecord, TargetSummary, cooccurrence, pair_mentions,
    pair_summary, resolve_targets, target_summaries,
};
use crate::corpus::{Corpus, Source, extract_corpus};
use crate::error::{AnalysisError, Result};
use crate::frequency::{TfIdfRecord, VocabularyOverlap, term_and_doc_frequency, tfidf, vocabulary_overlap};
use crate::gap::{GapRecord, academic_lead, blue_ocean, gap_analysis};
use crate::sources::{RawRecord, load_news, load_papers};

/// Per-corpus view of the analysis.
#[derive(Debug, Clone, Serialize)]
pub struct CorpusReport {
    pub source: Source,
    /// Records handed in by the loader.
    pub records: usize,
    /// Documents left after extraction (records with at least one valid keyword).
    pub documents: usize,
    pub unique_keywords: usize,
    pub tfidf: Vec<TfIdfRecord>,
    pub targets: Vec<TargetSummary>,
}

/// A document that mentions both keywords of a pair, joined with its source row.
#[derive(Debug, Clone, Serialize)]
pub struct MentionedDocument {
    pub index: usize,
    pub title: Option<String>,
    pub category: Option<String>,
    pub authors: Option<String>,
    pub keywords: Vec<Keyword>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairMentionReport {
    pub first: Keyword,
    pub second: Keyword,
    pub news: Vec<MentionedDocument>,
    pub papers: Vec<MentionedDocument>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub news: CorpusReport,
    pub papers: CorpusReport,
    pub overlap: VocabularyOverlap,
    pub pairs: Vec<PairRecord>,
    /// Every gap record, descending by gap index.
    pub gap: Vec<GapRecord>,
    pub blue_ocean: Vec<GapRecord>,
    pub academic_lead: Vec<GapRecord>,
    pub mentions: Vec<PairMentionReport>,
}

/// Load both sources from disk and analyze them.
pub fn analyze_paths(
    news_paths: &[PathBuf],
    papers_path: &Path,
    canon: &Canonicalizer,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    config.validate()?;
    let news = load_news(
        news_paths,
        &config.news_columns,
        &config.news_exclude_categories,
    )?;
    let papers = load_papers(papers_path, &config.paper_fields)?;
    analyze_records(&news, &papers, canon, config)
}

/// Analyze already loaded records.
pub fn analyze_records(
    news_records: &[RawRecord],
    paper_records: &[RawRecord],
    canon: &Canonicalizer,
    config: &AnalysisConfig,
) -> Result<AnalysisReport> {
    config.validate()?;
    let targets = resolve_targets(canon, config.targets.as_slice())?;
    let pairs = resolve_pairs(canon, &config.pairs)?;

    let news = extract_corpus(Source::News, canon, keyword_fields(news_records));
    let papers = extract_corpus(Source::Papers, canon, keyword_fields(paper_records));
    info!(
        "documents: news {} of {}, papers {} of {}",
        news.len(),
        news_records.len(),
        papers.len(),
        paper_records.len()
    );

    let news_freq = term_and_doc_frequency(&news);
    let paper_freq = term_and_doc_frequency(&papers);
    let news_tfidf = tfidf(&news, &news_freq, config.news_tfidf_top_n)?;
    let paper_tfidf = tfidf(&papers, &paper_freq, config.paper_tfidf_top_n)?;
    let overlap = vocabulary_overlap(
        &news_tfidf,
        &paper_tfidf,
        &news_freq,
        &paper_freq,
        config.common_keyword_top_n,
    )?;

    let news_matrix = cooccurrence(&news, &targets);
    let paper_matrix = cooccurrence(&papers, &targets);
    let news_targets = target_summaries(&news_matrix, &news_freq, config.cooccurrence_top_k)?;
    let paper_targets = target_summaries(&paper_matrix, &paper_freq, config.cooccurrence_top_k)?;
    let pair_records = pair_summary(&news_matrix, &paper_matrix, &targets);

    let gap = match config.gap_scope {
        GapScope::Targets => gap_analysis(
            &news_freq.restricted_to(&connected_targets(&news_matrix)),
            &paper_freq.restricted_to(&connected_targets(&paper_matrix)),
            news.len(),
            papers.len(),
        ),
        GapScope::All => gap_analysis(&news_freq, &paper_freq, news.len(), papers.len()),
    };
    let blue = blue_ocean(&gap, &config.gap);
    let lead = academic_lead(&gap, &config.gap);
    info!(
        "gap analysis: {} keywords, {} blue-ocean, {} academic-lead",
        gap.len(),
        blue.len(),
        lead.len()
    );

    let news_mentions = pair_mentions(&news, &pairs);
    let paper_mentions = pair_mentions(&papers, &pairs);
    let mentions = news_mentions
        .into_iter()
        .zip(paper_mentions)
        .map(|(n, p)| PairMentionReport {
            first: n.first.clone(),
            second: n.second.clone(),
            news: join_mentions(&n, &news, news_records),
            papers: join_mentions(&p, &papers, paper_records),
        })
        .collect();

    Ok(AnalysisReport {
        news: CorpusReport {
            source: Source::News,
            records: news_records.len(),
            documents: news.len(),
            unique_keywords: news_freq.len(),
            tfidf: news_tfidf,
            targets: news_targets,
        },
        papers: CorpusReport {
            source: Source::Papers,
            records: paper_records.len(),
            documents: papers.len(),
            unique_keywords: paper_freq.len(),
            tfidf: paper_tfidf,
            targets: paper_targets,
        },
        overlap,
        pairs: pair_records,
        gap,
        blue_ocean: blue,
        academic_lead: lead,
        mentions,
    })
}

/// Targets that co-occur with at least one other keyword in the matrix's corpus.
/// A target seen only in single-keyword documents has nothing to compare and
/// stays out of that corpus's side of the gap table.
fn connected_targets(matrix: &CooccurrenceMatrix) -> Vec<Keyword> {
    matrix
        .targets()
        .filter(|t| matrix.row(t.as_str()).is_some_and(|row| !row.is_empty()))
        .cloned()
        .collect()
}

fn keyword_fields(records: &[RawRecord]) -> impl Iterator<Item = Option<&str>> {
    records.iter().map(|r| r.keywords.as_deref())
}

fn resolve_pairs(canon: &Canonicalizer, raw: &[(String, String)]) -> Result<Vec<(Keyword, Keyword)>> {
    raw.iter()
        .map(|(a, b)| -> Result<(Keyword, Keyword)> {
            let resolve = |k: &String| {
                canon
                    .canonicalize(k)
                    .ok_or_else(|| AnalysisError::InvalidTarget { keyword: k.clone() })
            };
            Ok((resolve(a)?, resolve(b)?))
        })
        .collect()
}

fn join_mentions(
    mentions: &PairMentions,
    corpus: &Corpus,
    records: &[RawRecord],
) -> Vec<MentionedDocument> {
    mentions
        .documents
        .iter()
        .filter_map(|id| {
            let docs = corpus.documents();
            let pos = docs.binary_search_by_key(&id.index, |d| d.id().index).ok()?;
            let doc = &docs[pos];
            let record = records.get(id.index)?;
            Some(MentionedDocument {
                index: id.index,
                title: record.title.clone(),
                category: record.category.clone(),
                authors: record.authors.clone(),
                keywords: doc.keywords().iter().cloned().collect(),
            })
        })
        .collect()
}
