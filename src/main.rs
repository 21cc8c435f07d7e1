#![forbid(unsafe_code)]
//! # keyword_gap CLI
//!
//! Runs the news/paper keyword gap analysis from the command line.
//!
//! ## Features
//! - News from `.xlsx`/`.csv` files or directories, papers from a JSON export.
//! - Synonym table and stopwords from a lexicon file, extra stopwords from text files.
//! - TF-IDF ranking, vocabulary overlap, co-occurrence, gap index.
//! - Export as txt, csv, tsv or json.
//!
//! ## Example
//! ```bash
//! cargo run --release -- --news data/news.xlsx --papers data/papers.json \
//!     --lexicon data/lexicon.json --config data/config.json --export-format csv
//! ```
//!
//! See `--help` for all available options.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::{error, info};

use keyword_gap::{
    AnalysisConfig, Canonicalizer, ExportFormat, GapScope, analyze_paths, export_report,
    render_summary,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// News table (.xlsx or .csv) or a directory of them; repeatable
    #[arg(long, required = true, num_args = 1..)]
    news: Vec<PathBuf>,

    /// Paper JSON export
    #[arg(long)]
    papers: PathBuf,

    /// Analysis settings (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Synonym table and stopwords (JSON)
    #[arg(long)]
    lexicon: Option<PathBuf>,

    /// Additional stopword file (.txt, one word per line); repeatable
    #[arg(long)]
    stopwords: Vec<PathBuf>,

    /// Target keyword for co-occurrence analysis; repeatable, replaces configured targets
    #[arg(long = "target")]
    targets: Vec<String>,

    /// News TF-IDF top N
    #[arg(long)]
    news_top_n: Option<usize>,

    /// Paper TF-IDF top N
    #[arg(long)]
    paper_top_n: Option<usize>,

    /// Top N of each TF-IDF list compared for shared/exclusive keywords
    #[arg(long)]
    common_top_n: Option<usize>,

    /// Co-occurring keywords kept per target
    #[arg(long)]
    top_k: Option<usize>,

    /// Keywords entering the gap analysis
    #[arg(long)]
    gap_scope: Option<GapScope>,

    /// Output format for export (txt, csv, tsv, json)
    #[arg(long, default_value = "txt")]
    export_format: ExportFormat,

    /// Directory for exported files
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,
}

fn build_config(cli: &Cli) -> keyword_gap::Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_path(path)?,
        None => AnalysisConfig::default(),
    };
    if !cli.targets.is_empty() {
        config.targets = cli.targets.clone();
    }
    if let Some(n) = cli.news_top_n {
        config.news_tfidf_top_n = n;
    }
    if let Some(n) = cli.paper_top_n {
        config.paper_tfidf_top_n = n;
    }
    if let Some(n) = cli.common_top_n {
        config.common_keyword_top_n = n;
    }
    if let Some(k) = cli.top_k {
        config.cooccurrence_top_k = k;
    }
    if let Some(scope) = cli.gap_scope {
        config.gap_scope = scope;
    }
    config.validate()?;
    Ok(config)
}

fn build_canonicalizer(cli: &Cli) -> keyword_gap::Result<Canonicalizer> {
    let mut canon = match &cli.lexicon {
        Some(path) => Canonicalizer::from_path(path)?,
        None => Canonicalizer::default(),
    };
    for path in &cli.stopwords {
        let added = canon.add_stopwords_file(path)?;
        info!("{}: {} stopwords", path.display(), added);
    }
    info!(
        "lexicon: {} synonyms, {} stopwords",
        canon.synonym_count(),
        canon.stopword_count()
    );
    Ok(canon)
}

fn run(cli: &Cli) -> keyword_gap::Result<()> {
    let config = build_config(cli)?;
    let canon = build_canonicalizer(cli)?;
    let report = analyze_paths(&cli.news, &cli.papers, &canon, &config)?;
    let summary = render_summary(&report, config.report_top_n);
    println!("{summary}");
    export_report(&report, &summary, &cli.out_dir, cli.export_format)?;
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        error!("Error: {}", e);
        process::exit(1);
    }
}
