use crate::cli::open_db;
use crate::error::Result;
use crate::reports::get_status;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Data dir:    {}", settings.data_dir);
    println!("Database:    {}", db_path.display());
    println!(
        "Rules file:  {}",
        settings.rules_file.as_deref().unwrap_or("(not set)")
    );

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `pennywise init` to set up.");
        return Ok(());
    }

    let conn = open_db()?;
    let status = get_status(&conn)?;

    println!();
    println!("Transactions:   {}", status.transactions);
    println!("Uncategorised:  {}", status.uncategorised);
    println!("Rules:          {}", status.rules);
    println!("Imports:        {}", status.imports);
    if let Some(last) = status.last_import {
        let range = match (last.date_range_start, last.date_range_end) {
            (Some(start), Some(end)) => format!(" ({start} to {end})"),
            _ => String::new(),
        };
        println!("Last import:    {} on {}{range}", last.filename, last.import_date);
    }
    Ok(())
}
