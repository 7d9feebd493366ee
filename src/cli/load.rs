use std::path::PathBuf;

use crate::cli::categorise::recategorise;
use crate::cli::open_db;
use crate::error::{PennywiseError, Result};
use crate::importer::{load_statement, LoadMode};

pub fn run(file: &str, append: bool) -> Result<()> {
    let path = PathBuf::from(file);
    if !path.exists() {
        return Err(PennywiseError::Other(format!("File '{file}' does not exist")));
    }
    let conn = open_db()?;
    let mode = if append { LoadMode::Append } else { LoadMode::Replace };

    println!("Loading data from: {}", path.display());
    let result = load_statement(&conn, &path, mode)?;
    if result.duplicate_file {
        println!("This file has already been loaded. Nothing to do.");
        return Ok(());
    }

    println!("{} loaded, {} skipped (duplicates)", result.loaded, result.skipped);
    recategorise(&conn)
}
