use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PennywiseError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Rules file line {line}: {source}")]
    RulesLine {
        line: u64,
        #[source]
        source: Box<PennywiseError>,
    },

    #[error("No rule with ID {0}")]
    UnknownRule(i64),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("No database found at {}\nRun `pennywise init` to create one.", .0.display())]
    NoDatabase(PathBuf),

    #[error("No rules file given and none configured in settings")]
    NoRulesFile,

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PennywiseError>;
