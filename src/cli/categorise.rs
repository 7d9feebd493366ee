use rusqlite::Connection;

use crate::categoriser::categorise_transactions;
use crate::cli::open_db;
use crate::error::Result;

pub fn run() -> Result<()> {
    let conn = open_db()?;
    recategorise(&conn)
}

/// Re-apply every rule and print the outcome; shared by the commands that
/// change transactions or rules.
pub(crate) fn recategorise(conn: &Connection) -> Result<()> {
    let result = categorise_transactions(conn)?;
    println!(
        "{} categorised, {} uncategorised",
        result.categorised, result.uncategorised
    );
    Ok(())
}
