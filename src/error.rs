use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between loading the sources and exporting the report.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("target keyword {keyword:?} is not a valid keyword after normalization")]
    InvalidTarget { keyword: String },

    /// A keyword carries a term frequency but no document contains it.
    /// The frequency table was not built from the corpus it is scored against.
    #[error("keyword {keyword:?} has term frequency but document frequency 0")]
    ZeroDocumentFrequency { keyword: String },

    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("xlsx error: {0}")]
    Xlsx(String),

    #[error("column {column:?} not found in {}", .path.display())]
    MissingColumn { column: String, path: PathBuf },

    #[error("unsupported source file: {}", .0.display())]
    UnsupportedFile(PathBuf),
}

impl From<std::io::Error> for AnalysisError {
    fn from(error: std::io::Error) -> Self {
        AnalysisError::Io(Box::new(error))
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
