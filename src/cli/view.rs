use std::io::IsTerminal;

use crate::browser::CategoryBrowser;
use crate::cli::report::text;
use crate::cli::{open_db, FilterArgs};
use crate::error::Result;
use crate::reports::get_categorised;
use crate::tui::run_view;

pub fn run(filter: FilterArgs) -> Result<()> {
    let conn = open_db()?;
    let filter = filter.to_filter();

    // Non-TTY: plain text summary to stdout
    if !std::io::stdout().is_terminal() {
        println!("{}", text::summary(&conn, &filter)?);
        return Ok(());
    }

    let rows = get_categorised(&conn)?;
    let mut browser = CategoryBrowser::new(rows, filter);
    run_view(&mut browser)
}
