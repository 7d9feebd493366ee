use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::error::{PennywiseError, Result};
use crate::fmt::{money, pct, share_bar};
use crate::reports::{self, CategoryTotal, DrillRow, ViewFilter};

const BAR_WIDTH: usize = 20;

// ---------------------------------------------------------------------------
// Data-fetching + formatting wrappers (used by dispatch)
// ---------------------------------------------------------------------------

pub fn summary(conn: &rusqlite::Connection, filter: &ViewFilter) -> Result<String> {
    let rows = reports::get_categorised(conn)?;
    let totals = reports::category_totals(&rows, filter);
    Ok(format_summary(&totals, filter))
}

pub fn category(conn: &rusqlite::Connection, name: &str, filter: &ViewFilter) -> Result<String> {
    let rows = reports::get_categorised(conn)?;
    let totals = reports::category_totals(&rows, filter);
    let label = totals
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
        .map(|t| t.name.clone())
        .ok_or_else(|| PennywiseError::UnknownCategory(name.to_string()))?;
    let mut drill = reports::category_rows(&rows, filter, &label);
    reports::sort_drill_rows(&mut drill, reports::SortColumn::Date, false);
    Ok(format_category(&label, &drill, filter))
}

pub fn uncategorised(conn: &rusqlite::Connection) -> Result<String> {
    let pairs = reports::get_uncategorised(conn)?;
    Ok(format_uncategorised(&pairs))
}

// ---------------------------------------------------------------------------
// Pure formatting functions (report data → String)
// ---------------------------------------------------------------------------

pub fn format_summary(totals: &[CategoryTotal], filter: &ViewFilter) -> String {
    if totals.is_empty() {
        return format!("{}\nNo data", filter.describe().bold());
    }

    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "Count", "Share", ""]);
    for t in totals {
        table.add_row(vec![
            Cell::new(&t.name),
            Cell::new(money(t.total)).set_alignment(CellAlignment::Right),
            Cell::new(t.count).set_alignment(CellAlignment::Right),
            Cell::new(pct(t.pct)).set_alignment(CellAlignment::Right),
            Cell::new(share_bar(t.pct, BAR_WIDTH)),
        ]);
    }
    let grand: f64 = totals.iter().map(|t| t.total).sum();
    let count: usize = totals.iter().map(|t| t.count).sum();
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(money(grand).bold()).set_alignment(CellAlignment::Right),
        Cell::new(count).set_alignment(CellAlignment::Right),
        Cell::new(""),
        Cell::new(""),
    ]);

    format!("{}\n{table}", filter.describe().bold())
}

pub fn format_category(label: &str, rows: &[DrillRow], filter: &ViewFilter) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Date", "Type", "Description", "Amount", "Essential"]);
    for r in rows {
        table.add_row(vec![
            Cell::new(&r.date),
            Cell::new(&r.transaction_type),
            Cell::new(&r.description),
            Cell::new(money(r.amount)).set_alignment(CellAlignment::Right),
            Cell::new(if r.essential { "yes" } else { "" }),
        ]);
    }
    let total: f64 = rows.iter().map(|r| r.amount).sum();
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(""),
        Cell::new(""),
        Cell::new(money(total).bold()).set_alignment(CellAlignment::Right),
        Cell::new(""),
    ]);

    format!(
        "{} ({} rows)\n{}\n{table}",
        label.bold(),
        rows.len(),
        filter.describe()
    )
}

pub fn format_uncategorised(pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return "All transactions are categorised!".to_string();
    }
    let mut out = String::from("Unique uncategorised transactions (transaction_type | description):");
    for (transaction_type, description) in pairs {
        out.push_str(&format!("\n- {transaction_type} | {description}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::tests::sample;
    use crate::reports::Direction;

    #[test]
    fn test_format_summary() {
        let filter = ViewFilter::default();
        let totals = reports::category_totals(&sample(), &filter);
        let out = format_summary(&totals, &filter);
        assert!(out.contains("Bills; Energy"));
        assert!(out.contains("\u{a3}65.00"));
        assert!(out.contains("\u{a3}110.00"));
        assert!(out.contains("59.1%"));
        assert!(!out.contains("Income"));
    }

    #[test]
    fn test_format_summary_empty() {
        let out = format_summary(&[], &ViewFilter::default());
        assert!(out.contains("No data"));
    }

    #[test]
    fn test_format_summary_paid_in() {
        let filter = ViewFilter {
            direction: Direction::PaidIn,
            ..Default::default()
        };
        let totals = reports::category_totals(&sample(), &filter);
        let out = format_summary(&totals, &filter);
        assert!(out.contains("Income"));
        assert!(out.contains("\u{a3}2,000.00"));
        assert!(out.contains("100.0%"));
    }

    #[test]
    fn test_format_category() {
        let filter = ViewFilter::default();
        let rows = reports::category_rows(&sample(), &filter, "Food; Groceries");
        let out = format_category("Food; Groceries", &rows, &filter);
        assert!(out.contains("TESCO"));
        assert!(out.contains("(1 rows)"));
        assert!(!out.contains("PRET"));
    }

    #[test]
    fn test_format_uncategorised() {
        let out = format_uncategorised(&[("DEB".into(), "MYSTERY SHOP".into())]);
        assert!(out.starts_with("Unique uncategorised transactions"));
        assert!(out.contains("- DEB | MYSTERY SHOP"));
        assert_eq!(format_uncategorised(&[]), "All transactions are categorised!");
    }
}
