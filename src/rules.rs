use std::path::Path;

use log::info;
use rusqlite::Connection;
use serde::Deserialize;

use crate::categoriser::compile_pattern;
use crate::error::{PennywiseError, Result};
use crate::models::{CategoryPath, NewRule, Rule};

/// One row of a rules CSV. Both the single `category` layout and the
/// `main_category`/`sub1..3` layout are accepted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RuleRecord {
    transaction_type_pattern: Option<String>,
    description_pattern: Option<String>,
    category: Option<String>,
    main_category: Option<String>,
    sub1: Option<String>,
    sub2: Option<String>,
    sub3: Option<String>,
    essential: Option<String>,
    notes: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn parse_essential(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "true" | "1"
    )
}

impl RuleRecord {
    fn into_new_rule(self) -> Result<NewRule> {
        let type_pattern = self.transaction_type_pattern.unwrap_or_default();
        let description_pattern = self.description_pattern.unwrap_or_default();
        compile_pattern(&type_pattern)?;
        compile_pattern(&description_pattern)?;

        let category = match non_empty(self.main_category) {
            Some(main) => CategoryPath {
                main,
                sub1: non_empty(self.sub1),
                sub2: non_empty(self.sub2),
                sub3: non_empty(self.sub3),
            },
            None => match non_empty(self.category) {
                Some(label) => CategoryPath::parse(&label),
                None => CategoryPath::uncategorised(),
            },
        };

        Ok(NewRule {
            type_pattern,
            description_pattern,
            category,
            essential: self.essential.as_deref().is_some_and(parse_essential),
            notes: non_empty(self.notes),
        })
    }
}

/// Read and validate a rules CSV. Nothing is written; any bad row fails the
/// whole file.
pub fn parse_rules_csv(path: &Path) -> Result<Vec<NewRule>> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(std::io::BufReader::new(file));

    let headers = rdr.headers()?.clone();
    let has = |name: &str| headers.iter().any(|h| h == name);
    for required in ["transaction_type_pattern", "description_pattern"] {
        if !has(required) {
            return Err(PennywiseError::MissingColumn(required.to_string()));
        }
    }
    if !has("category") && !has("main_category") {
        return Err(PennywiseError::MissingColumn(
            "category or main_category".to_string(),
        ));
    }

    let mut rules = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let parsed = record
            .deserialize::<RuleRecord>(Some(&headers))
            .map_err(PennywiseError::from)
            .and_then(RuleRecord::into_new_rule)
            .map_err(|e| PennywiseError::RulesLine {
                line,
                source: Box::new(e),
            })?;
        rules.push(parsed);
    }
    Ok(rules)
}

fn insert_rule(conn: &Connection, rule: &NewRule) -> Result<i64> {
    conn.execute(
        "INSERT INTO rules (transaction_type_pattern, description_pattern, main_category, sub1, sub2, sub3, essential, notes) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            rule.type_pattern,
            rule.description_pattern,
            rule.category.main,
            rule.category.sub1,
            rule.category.sub2,
            rule.category.sub3,
            rule.essential,
            rule.notes,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Append the rules in `path` after any existing ones, or replace them all
/// when `truncate` is set. Returns the number of rules added.
pub fn load_rules(conn: &Connection, path: &Path, truncate: bool) -> Result<usize> {
    let rules = parse_rules_csv(path)?;

    let tx = conn.unchecked_transaction()?;
    if truncate {
        info!("truncating existing rules");
        tx.execute_batch("DELETE FROM categorised; DELETE FROM rules;")?;
    }
    for rule in &rules {
        insert_rule(&tx, rule)?;
    }
    tx.commit()?;

    info!("loaded {} rules from {}", rules.len(), path.display());
    Ok(rules.len())
}

/// Append a single rule; it is evaluated after every existing rule.
pub fn add_rule(conn: &Connection, rule: &NewRule) -> Result<i64> {
    compile_pattern(&rule.type_pattern)?;
    compile_pattern(&rule.description_pattern)?;
    insert_rule(conn, rule)
}

fn rule_from_row(row: &rusqlite::Row) -> rusqlite::Result<Rule> {
    Ok(Rule {
        id: row.get(0)?,
        type_pattern: row.get(1)?,
        description_pattern: row.get(2)?,
        category: CategoryPath {
            main: row.get(3)?,
            sub1: row.get(4)?,
            sub2: row.get(5)?,
            sub3: row.get(6)?,
        },
        essential: row.get(7)?,
        notes: row.get(8)?,
        hit_count: row.get(9)?,
    })
}

const RULE_COLUMNS: &str = "id, transaction_type_pattern, description_pattern, main_category, \
     sub1, sub2, sub3, essential, notes, hit_count";

/// All rules in evaluation order.
pub fn list_rules(conn: &Connection) -> Result<Vec<Rule>> {
    let mut stmt = conn.prepare(&format!("SELECT {RULE_COLUMNS} FROM rules ORDER BY id"))?;
    let rules = stmt
        .query_map([], rule_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rules)
}

pub fn delete_rule(conn: &Connection, id: i64) -> Result<Rule> {
    let rule = conn
        .query_row(
            &format!("SELECT {RULE_COLUMNS} FROM rules WHERE id = ?1"),
            [id],
            rule_from_row,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => PennywiseError::UnknownRule(id),
            other => other.into(),
        })?;
    conn.execute("DELETE FROM rules WHERE id = ?1", [id])?;
    Ok(rule)
}
