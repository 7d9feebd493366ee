pub mod text;

use crate::cli::{open_db, ReportCommands};
use crate::error::Result;

pub fn dispatch(cmd: ReportCommands) -> Result<()> {
    let conn = open_db()?;
    let out = match cmd {
        ReportCommands::Summary { filter } => text::summary(&conn, &filter.to_filter())?,
        ReportCommands::Category { name, filter } => {
            text::category(&conn, &name, &filter.to_filter())?
        }
    };
    println!("{out}");
    Ok(())
}

pub fn uncategorised() -> Result<()> {
    let conn = open_db()?;
    println!("{}", text::uncategorised(&conn)?);
    Ok(())
}
