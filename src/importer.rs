use std::path::Path;

use log::{info, warn};
use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::db::clear_statements;
use crate::error::{PennywiseError, Result};
use crate::models::StatementRow;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a money cell. Currency symbols, thousands separators and quotes are
/// ignored, `(x)` is negative and anything unparseable (including an empty
/// cell) counts as zero.
pub fn parse_amount(raw: &str) -> f64 {
    let s: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '(' | ')'))
        .collect();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return -inner.parse::<f64>().unwrap_or(0.0);
    }
    s.parse().unwrap_or(0.0)
}

const DATE_FORMATS: &[&str] = &["%d %b %Y", "%d %B %Y", "%d/%m/%Y", "%Y-%m-%d"];

/// Normalise a statement date to YYYY-MM-DD. Unrecognised dates are kept as
/// written so no row is lost.
pub fn parse_date(raw: &str) -> String {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| chrono::NaiveDate::parse_from_str(raw, fmt).ok())
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// Whether `row` was already stored by an earlier import. Rows from the
/// import in progress are ignored so repeated purchases within one
/// statement are kept.
fn is_duplicate_row(conn: &Connection, row: &StatementRow, import_id: i64) -> Result<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM transactions WHERE date = ?1 AND transaction_type = ?2 AND description = ?3 \
         AND paid_out = ?4 AND paid_in = ?5 AND balance = ?6 AND import_id IS NOT ?7",
    )?;
    Ok(stmt.exists(rusqlite::params![
        row.date,
        row.transaction_type,
        row.description,
        row.paid_out,
        row.paid_in,
        row.balance,
        import_id,
    ])?)
}

// ---------------------------------------------------------------------------
// Statement CSV parser
// ---------------------------------------------------------------------------

const COL_DATE: &str = "date";
const COL_TYPE: &str = "transaction type";
const COL_DESCRIPTION: &str = "description";
const COL_PAID_OUT: &str = "paid out";
const COL_PAID_IN: &str = "paid in";
const COL_BALANCE: &str = "balance";

struct Columns {
    date: usize,
    txn_type: usize,
    description: usize,
    paid_out: usize,
    paid_in: usize,
    balance: usize,
}

impl Columns {
    fn is_header(fields: &[String]) -> bool {
        let has = |name: &str| fields.iter().any(|f| f.trim().eq_ignore_ascii_case(name));
        has(COL_DATE) && has(COL_TYPE)
    }

    fn from_header(fields: &[String]) -> Result<Self> {
        let find = |name: &str| {
            fields
                .iter()
                .position(|f| f.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| PennywiseError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            date: find(COL_DATE)?,
            txn_type: find(COL_TYPE)?,
            description: find(COL_DESCRIPTION)?,
            paid_out: find(COL_PAID_OUT)?,
            paid_in: find(COL_PAID_IN)?,
            balance: find(COL_BALANCE)?,
        })
    }
}

fn cell(fields: &[String], idx: usize) -> &str {
    fields.get(idx).map(|s| s.trim()).unwrap_or("")
}

/// Parse a statement export. Preamble lines before the header row are
/// skipped. Fields are decoded lossily since bank exports are not always
/// UTF-8.
pub fn parse_statement(file_path: &Path) -> Result<Vec<StatementRow>> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let mut columns: Option<Columns> = None;
    let mut rows = Vec::new();

    for (line, result) in rdr.byte_records().enumerate() {
        let record = result?;
        let fields: Vec<String> = record
            .iter()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect();

        let Some(cols) = &columns else {
            if Columns::is_header(&fields) {
                columns = Some(Columns::from_header(&fields)?);
            }
            continue;
        };

        if fields.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let date = cell(&fields, cols.date);
        if date.is_empty() {
            warn!("skipping line {}: no date", line + 1);
            continue;
        }
        rows.push(StatementRow {
            date: parse_date(date),
            transaction_type: cell(&fields, cols.txn_type).to_string(),
            description: cell(&fields, cols.description).to_string(),
            paid_out: parse_amount(cell(&fields, cols.paid_out)),
            paid_in: parse_amount(cell(&fields, cols.paid_in)),
            balance: parse_amount(cell(&fields, cols.balance)),
        });
    }

    if columns.is_none() {
        return Err(PennywiseError::MissingColumn(
            "header row (Date, Transaction type, Description, Paid out, Paid in, Balance)"
                .to_string(),
        ));
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// load_statement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LoadMode {
    /// Start over: previously loaded statements are discarded.
    #[default]
    Replace,
    /// Keep existing rows and skip anything already loaded.
    Append,
}

#[derive(Debug)]
pub struct LoadResult {
    pub loaded: usize,
    pub skipped: usize,
    pub duplicate_file: bool,
}

pub fn load_statement(conn: &Connection, file_path: &Path, mode: LoadMode) -> Result<LoadResult> {
    let checksum = compute_checksum(file_path)?;
    if mode == LoadMode::Append {
        let mut stmt = conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1")?;
        if stmt.exists([&checksum])? {
            return Ok(LoadResult {
                loaded: 0,
                skipped: 0,
                duplicate_file: true,
            });
        }
    }

    let parsed_rows = parse_statement(file_path)?;

    let tx = conn.unchecked_transaction()?;
    if mode == LoadMode::Replace {
        clear_statements(&tx)?;
    }

    tx.execute(
        "INSERT INTO imports (filename, record_count, checksum) VALUES (?1, 0, ?2)",
        rusqlite::params![
            file_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            checksum,
        ],
    )?;
    let import_id = tx.last_insert_rowid();

    let mut loaded = 0usize;
    let mut skipped = 0usize;
    for row in &parsed_rows {
        if mode == LoadMode::Append && is_duplicate_row(&tx, row, import_id)? {
            skipped += 1;
            continue;
        }
        tx.execute(
            "INSERT INTO transactions (date, transaction_type, description, paid_out, paid_in, balance, import_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                row.date,
                row.transaction_type,
                row.description,
                row.paid_out,
                row.paid_in,
                row.balance,
                import_id,
            ],
        )?;
        loaded += 1;
    }
    // Count and date range cover only the rows actually stored.
    tx.execute(
        "UPDATE imports SET record_count = ?1, \
         date_range_start = (SELECT min(date) FROM transactions WHERE import_id = ?2), \
         date_range_end = (SELECT max(date) FROM transactions WHERE import_id = ?2) \
         WHERE id = ?2",
        rusqlite::params![loaded as i64, import_id],
    )?;
    tx.commit()?;

    info!("loaded {loaded} rows from {} ({skipped} duplicates)", file_path.display());
    Ok(LoadResult {
        loaded,
        skipped,
        duplicate_file: false,
    })
}
