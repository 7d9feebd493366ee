use std::collections::BTreeMap;

use rusqlite::Connection;

use crate::error::Result;
use crate::models::{CategoryPath, UNCATEGORISED};

// ---------------------------------------------------------------------------
// View filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    PaidOut,
    PaidIn,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PaidOut => "Paid out",
            Self::PaidIn => "Paid in",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::PaidOut => Self::PaidIn,
            Self::PaidIn => Self::PaidOut,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum EssentialFilter {
    #[default]
    All,
    #[value(aliases = ["yes", "y"])]
    Essential,
    #[value(aliases = ["no", "n"])]
    NonEssential,
}

impl EssentialFilter {
    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Essential => "Essential only",
            Self::NonEssential => "Non-essential only",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Essential,
            Self::Essential => Self::NonEssential,
            Self::NonEssential => Self::All,
        }
    }

    pub fn accepts(&self, essential: bool) -> bool {
        match self {
            Self::All => true,
            Self::Essential => essential,
            Self::NonEssential => !essential,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryLevel {
    /// Main category plus every sub-category.
    #[default]
    Full,
    TopLevel,
}

impl CategoryLevel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Full => "Full categories",
            Self::TopLevel => "Top-level categories",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Full => Self::TopLevel,
            Self::TopLevel => Self::Full,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewFilter {
    pub direction: Direction,
    pub essential: EssentialFilter,
    pub level: CategoryLevel,
}

impl ViewFilter {
    pub fn describe(&self) -> String {
        format!(
            "{} | {} | {}",
            self.direction.label(),
            self.essential.label(),
            self.level.label()
        )
    }
}

pub fn category_label(path: &CategoryPath, level: CategoryLevel) -> String {
    match level {
        CategoryLevel::Full => path.full_label(),
        CategoryLevel::TopLevel => path
            .main
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string(),
    }
}

// ---------------------------------------------------------------------------
// Categorised transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CategorisedRow {
    pub id: i64,
    pub date: String,
    pub transaction_type: String,
    pub description: String,
    pub paid_out: f64,
    pub paid_in: f64,
    pub category: CategoryPath,
    pub essential: bool,
}

impl CategorisedRow {
    pub fn amount(&self, direction: Direction) -> f64 {
        match direction {
            Direction::PaidOut => self.paid_out,
            Direction::PaidIn => self.paid_in,
        }
    }

    fn included(&self, filter: &ViewFilter) -> bool {
        self.amount(filter.direction) > 0.0 && filter.essential.accepts(self.essential)
    }
}

/// Every transaction with its categorisation. Transactions that have not
/// been categorised yet count as uncategorised and non-essential.
pub fn get_categorised(conn: &Connection) -> Result<Vec<CategorisedRow>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.date, t.transaction_type, t.description, t.paid_out, t.paid_in, \
                c.main_category, c.sub1, c.sub2, c.sub3, COALESCE(c.essential, 0) \
         FROM transactions t LEFT JOIN categorised c ON t.id = c.transaction_id \
         ORDER BY t.date, t.id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            let main: Option<String> = row.get(6)?;
            Ok(CategorisedRow {
                id: row.get(0)?,
                date: row.get(1)?,
                transaction_type: row.get(2)?,
                description: row.get(3)?,
                paid_out: row.get(4)?,
                paid_in: row.get(5)?,
                category: CategoryPath {
                    main: main.unwrap_or_else(|| UNCATEGORISED.to_string()),
                    sub1: row.get(7)?,
                    sub2: row.get(8)?,
                    sub3: row.get(9)?,
                },
                essential: row.get(10)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Category totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub name: String,
    pub total: f64,
    pub count: usize,
    pub pct: f64,
}

/// Group the rows that pass `filter` by category label, largest total first.
pub fn category_totals(rows: &[CategorisedRow], filter: &ViewFilter) -> Vec<CategoryTotal> {
    let mut groups: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.included(filter)) {
        let entry = groups
            .entry(category_label(&row.category, filter.level))
            .or_default();
        entry.0 += row.amount(filter.direction);
        entry.1 += 1;
    }

    let grand_total: f64 = groups.values().map(|(t, _)| t).sum();
    let mut totals: Vec<CategoryTotal> = groups
        .into_iter()
        .map(|(name, (total, count))| CategoryTotal {
            name,
            total,
            count,
            pct: if grand_total > 0.0 { total / grand_total * 100.0 } else { 0.0 },
        })
        .collect();
    // BTreeMap order keeps equal totals sorted by name.
    totals.sort_by(|a, b| b.total.total_cmp(&a.total));
    totals
}

// ---------------------------------------------------------------------------
// Drill-down
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DrillRow {
    pub id: i64,
    pub date: String,
    pub transaction_type: String,
    pub description: String,
    pub amount: f64,
    pub essential: bool,
}

/// The transactions behind one slice of `category_totals`.
pub fn category_rows(rows: &[CategorisedRow], filter: &ViewFilter, label: &str) -> Vec<DrillRow> {
    rows.iter()
        .filter(|r| r.included(filter) && category_label(&r.category, filter.level) == label)
        .map(|r| DrillRow {
            id: r.id,
            date: r.date.clone(),
            transaction_type: r.transaction_type.clone(),
            description: r.description.clone(),
            amount: r.amount(filter.direction),
            essential: r.essential,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    Date,
    Type,
    Description,
    Amount,
}

impl SortColumn {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Type => "Type",
            Self::Description => "Description",
            Self::Amount => "Amount",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Date => Self::Type,
            Self::Type => Self::Description,
            Self::Description => Self::Amount,
            Self::Amount => Self::Date,
        }
    }
}

pub fn sort_drill_rows(rows: &mut [DrillRow], column: SortColumn, descending: bool) {
    rows.sort_by(|a, b| {
        let ord = match column {
            SortColumn::Date => a.date.cmp(&b.date),
            SortColumn::Type => a.transaction_type.cmp(&b.transaction_type),
            SortColumn::Description => a.description.cmp(&b.description),
            SortColumn::Amount => a.amount.total_cmp(&b.amount),
        };
        let ord = if descending { ord.reverse() } else { ord };
        // Ties keep statement order.
        ord.then(a.id.cmp(&b.id))
    });
}

// ---------------------------------------------------------------------------
// Uncategorised & status
// ---------------------------------------------------------------------------

/// Distinct (transaction type, description) pairs that no rule matched.
pub fn get_uncategorised(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT t.transaction_type, t.description \
         FROM transactions t LEFT JOIN categorised c ON t.id = c.transaction_id \
         WHERE c.main_category = ?1 OR c.main_category IS NULL \
         ORDER BY t.transaction_type, t.description",
    )?;
    let rows = stmt
        .query_map([UNCATEGORISED], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct LastImport {
    pub filename: String,
    pub import_date: String,
    pub date_range_start: Option<String>,
    pub date_range_end: Option<String>,
}

pub struct Status {
    pub transactions: i64,
    pub uncategorised: i64,
    pub rules: i64,
    pub imports: i64,
    pub last_import: Option<LastImport>,
}

pub fn get_status(conn: &Connection) -> Result<Status> {
    let count = |sql: &str| -> Result<i64> { Ok(conn.query_row(sql, [], |r| r.get(0))?) };
    let mut stmt = conn.prepare(
        "SELECT filename, import_date, date_range_start, date_range_end \
         FROM imports ORDER BY id DESC LIMIT 1",
    )?;
    let last_import = stmt
        .query_map([], |row| {
            Ok(LastImport {
                filename: row.get(0)?,
                import_date: row.get(1)?,
                date_range_start: row.get(2)?,
                date_range_end: row.get(3)?,
            })
        })?
        .next()
        .transpose()?;

    Ok(Status {
        transactions: count("SELECT count(*) FROM transactions")?,
        uncategorised: count(
            "SELECT count(*) FROM transactions t LEFT JOIN categorised c ON t.id = c.transaction_id \
             WHERE c.main_category = 'Uncategorised' OR c.main_category IS NULL",
        )?,
        rules: count("SELECT count(*) FROM rules")?,
        imports: count("SELECT count(*) FROM imports")?,
        last_import,
    })
}
