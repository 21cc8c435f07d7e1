//! Printing and exporting an [`AnalysisReport`].

use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::prelude::*;
use clap::ValueEnum;
use log::info;

use crate::error::Result;
use crate::gap::GapRecord;
use crate::pipeline::{AnalysisReport, CorpusReport, MentionedDocument};

/// Output format for exported tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Txt,
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }
}

/// Neutralize spreadsheet formulas: text starting with `=`, `+`, `-` or `@` gets a
/// leading apostrophe.
pub fn csv_safe_cell(s: &str) -> String {
    if s.starts_with(['=', '+', '-', '@']) {
        format!("'{s}")
    } else {
        s.to_string()
    }
}

/// Human readable summary, the same text the CLI prints.
pub fn render_summary(report: &AnalysisReport, top_n: usize) -> String {
    let mut out = String::new();

    out.push_str("Corpus sizes:\n");
    for c in [&report.news, &report.papers] {
        let _ = writeln!(
            out,
            "  {}\t{} documents ({} records, {} unique keywords)",
            c.source, c.documents, c.records, c.unique_keywords
        );
    }

    for c in [&report.news, &report.papers] {
        let _ = writeln!(out, "\nTop {top_n} {} TF-IDF:", c.source);
        for r in c.tfidf.iter().take(top_n) {
            let _ = writeln!(out, "  {}\t{:.2}\t(freq {})", r.keyword, r.score, r.freq);
        }
    }

    let o = &report.overlap;
    let _ = writeln!(
        out,
        "\nVocabulary overlap: {} common, {} news only, {} papers only",
        o.common.len(),
        o.news_only.len(),
        o.paper_only.len()
    );
    for s in o.common.iter().take(top_n) {
        let _ = writeln!(out, "  {}\tnews {}\tpapers {}", s.keyword, s.news_freq, s.paper_freq);
    }
    let _ = writeln!(out, "News only:");
    for s in o.news_only.iter().take(top_n) {
        let _ = writeln!(out, "  {}\t{}", s.keyword, s.freq);
    }
    let _ = writeln!(out, "Papers only:");
    for s in o.paper_only.iter().take(top_n) {
        let _ = writeln!(out, "  {}\t{}", s.keyword, s.freq);
    }

    for c in [&report.news, &report.papers] {
        render_cooccurrence(&mut out, c);
    }

    out.push_str("\nTarget pairs:\n");
    for p in report
        .pairs
        .iter()
        .filter(|p| p.news_count > 0 || p.paper_count > 0)
        .take(top_n)
    {
        let _ = writeln!(
            out,
            "  ({}, {})\tnews {}\tpapers {}",
            p.first, p.second, p.news_count, p.paper_count
        );
    }

    out.push_str("\nBlue-ocean candidates:\n");
    render_gap_rows(&mut out, &report.blue_ocean, top_n);
    out.push_str("\nAcademic-lead topics:\n");
    render_gap_rows(&mut out, &report.academic_lead, top_n);

    if !report.mentions.is_empty() {
        out.push_str("\nKeyword pair mentions:\n");
        for m in &report.mentions {
            let _ = writeln!(
                out,
                "  {} - {}\tnews {}\tpapers {}",
                m.first,
                m.second,
                m.news.len(),
                m.papers.len()
            );
            for d in m.news.iter().take(5).chain(m.papers.iter().take(5)) {
                let _ = writeln!(out, "     - {}", describe(d));
            }
        }
    }

    out
}

fn render_cooccurrence(out: &mut String, c: &CorpusReport) {
    let _ = writeln!(out, "\nCo-occurrence ({}):", c.source);
    for t in &c.targets {
        let _ = writeln!(out, "  ▶ {} ({} documents)", t.keyword, t.freq);
        if t.top.is_empty() {
            out.push_str("     (none)\n");
        }
        for e in t.top.iter().take(5) {
            let _ = writeln!(out, "     - {}: {} ({:.1}%)", e.keyword, e.count, t.rate(e));
        }
    }
}

fn render_gap_rows(out: &mut String, rows: &[GapRecord], top_n: usize) {
    for g in rows.iter().take(top_n) {
        let _ = writeln!(
            out,
            "  {}\tnews {}\tpapers {}\t{:.2}\t{:.2}\tgap {:.2}",
            g.keyword, g.news_freq, g.paper_freq, g.news_ratio, g.paper_ratio, g.gap_index
        );
    }
}

fn describe(d: &MentionedDocument) -> String {
    let title = d.title.as_deref().unwrap_or("(untitled)");
    let keywords: Vec<&str> = d.keywords.iter().map(|k| k.as_str()).collect();
    match (&d.category, &d.authors) {
        (Some(category), _) => format!("{title} [{category}] {}", keywords.join(", ")),
        (None, Some(authors)) => format!("{title} ({authors}) {}", keywords.join(", ")),
        (None, None) => format!("{title} {}", keywords.join(", ")),
    }
}

/// Write the report into `dir` and return the created files.
///
/// `json` writes one `<stamp>_report.json`; `txt` writes the summary; `csv`/`tsv`
/// write one file per table.
pub fn export_report(
    report: &AnalysisReport,
    summary: &str,
    dir: &Path,
    format: ExportFormat,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let ext = format.extension();
    let path_for = |table: &str| dir.join(format!("{stamp}_{table}.{ext}"));

    let written = match format {
        ExportFormat::Json => {
            let path = path_for("report");
            write_file(&path, &serde_json::to_string_pretty(report)?)?;
            vec![path]
        }
        ExportFormat::Txt => {
            let path = path_for("summary");
            write_file(&path, summary)?;
            vec![path]
        }
        ExportFormat::Csv | ExportFormat::Tsv => {
            let delimiter = if format == ExportFormat::Tsv { b'\t' } else { b',' };
            let tables = tables(report);
            let mut paths = Vec::with_capacity(tables.len());
            for (name, rows) in tables {
                let path = path_for(name);
                let mut w = csv::WriterBuilder::new()
                    .delimiter(delimiter)
                    .from_path(&path)?;
                for row in rows {
                    w.write_record(&row)?;
                }
                w.flush()?;
                paths.push(path);
            }
            paths
        }
    };

    for p in &written {
        info!("wrote {}", p.display());
    }
    Ok(written)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

type Table = Vec<Vec<String>>;

fn tables(report: &AnalysisReport) -> Vec<(&'static str, Table)> {
    vec![
        ("news_tfidf", tfidf_table(&report.news)),
        ("paper_tfidf", tfidf_table(&report.papers)),
        ("overlap", overlap_table(report)),
        ("cooccurrence", cooccurrence_table(report)),
        ("pairs", pairs_table(report)),
        ("gap", gap_table(report)),
        ("mentions", mentions_table(report)),
    ]
}

fn header(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|c| c.to_string()).collect()
}

fn tfidf_table(c: &CorpusReport) -> Table {
    let mut rows = vec![header(&["rank", "keyword", "score", "freq"])];
    for (i, r) in c.tfidf.iter().enumerate() {
        rows.push(vec![
            (i + 1).to_string(),
            csv_safe_cell(r.keyword.as_str()),
            r.score.to_string(),
            r.freq.to_string(),
        ]);
    }
    rows
}

fn overlap_table(report: &AnalysisReport) -> Table {
    let o = &report.overlap;
    let mut rows = vec![header(&["set", "keyword", "news_freq", "paper_freq"])];
    for s in &o.common {
        rows.push(vec![
            "common".to_string(),
            csv_safe_cell(s.keyword.as_str()),
            s.news_freq.to_string(),
            s.paper_freq.to_string(),
        ]);
    }
    for s in &o.news_only {
        rows.push(vec![
            "news_only".to_string(),
            csv_safe_cell(s.keyword.as_str()),
            s.freq.to_string(),
            String::new(),
        ]);
    }
    for s in &o.paper_only {
        rows.push(vec![
            "paper_only".to_string(),
            csv_safe_cell(s.keyword.as_str()),
            String::new(),
            s.freq.to_string(),
        ]);
    }
    rows
}

fn cooccurrence_table(report: &AnalysisReport) -> Table {
    let mut rows = vec![header(&[
        "source", "target", "target_freq", "keyword", "count", "rate",
    ])];
    for c in [&report.news, &report.papers] {
        for t in &c.targets {
            for e in &t.top {
                rows.push(vec![
                    c.source.to_string(),
                    csv_safe_cell(t.keyword.as_str()),
                    t.freq.to_string(),
                    csv_safe_cell(e.keyword.as_str()),
                    e.count.to_string(),
                    format!("{:.4}", t.rate(e)),
                ]);
            }
        }
    }
    rows
}

fn pairs_table(report: &AnalysisReport) -> Table {
    let mut rows = vec![header(&["first", "second", "news_count", "paper_count"])];
    for p in &report.pairs {
        rows.push(vec![
            csv_safe_cell(p.first.as_str()),
            csv_safe_cell(p.second.as_str()),
            p.news_count.to_string(),
            p.paper_count.to_string(),
        ]);
    }
    rows
}

fn gap_table(report: &AnalysisReport) -> Table {
    let mut rows = vec![header(&[
        "keyword",
        "news_freq",
        "paper_freq",
        "news_ratio",
        "paper_ratio",
        "gap_index",
        "class",
    ])];
    let class_of = |g: &GapRecord| {
        if report.blue_ocean.iter().any(|b| b.keyword == g.keyword) {
            "blue_ocean"
        } else if report.academic_lead.iter().any(|a| a.keyword == g.keyword) {
            "academic_lead"
        } else {
            ""
        }
    };
    for g in &report.gap {
        rows.push(vec![
            csv_safe_cell(g.keyword.as_str()),
            g.news_freq.to_string(),
            g.paper_freq.to_string(),
            format!("{:.4}", g.news_ratio),
            format!("{:.4}", g.paper_ratio),
            format!("{:.4}", g.gap_index),
            class_of(g).to_string(),
        ]);
    }
    rows
}

fn mentions_table(report: &AnalysisReport) -> Table {
    let mut rows = vec![header(&["pair", "source", "index", "title", "keywords"])];
    for m in &report.mentions {
        let pair = format!("{}-{}", m.first, m.second);
        for (source, docs) in [("news", &m.news), ("papers", &m.papers)] {
            for d in docs {
                let keywords: Vec<&str> = d.keywords.iter().map(|k| k.as_str()).collect();
                rows.push(vec![
                    csv_safe_cell(&pair),
                    source.to_string(),
                    d.index.to_string(),
                    csv_safe_cell(d.title.as_deref().unwrap_or("")),
                    csv_safe_cell(&keywords.join(", ")),
                ]);
            }
        }
    }
    rows
}
