use std::path::PathBuf;

use comfy_table::{Cell, Table};

use crate::cli::categorise::recategorise;
use crate::cli::open_db;
use crate::error::{PennywiseError, Result};
use crate::models::{CategoryPath, NewRule, Rule};
use crate::rules;
use crate::settings::{load_settings, shellexpand_path};

pub fn load(file: Option<String>, truncate: bool) -> Result<()> {
    let path = match file.or_else(|| load_settings().rules_file) {
        Some(f) => PathBuf::from(shellexpand_path(&f)),
        None => return Err(PennywiseError::NoRulesFile),
    };
    if !path.exists() {
        return Err(PennywiseError::Other(format!(
            "Rules file '{}' does not exist",
            path.display()
        )));
    }

    let conn = open_db()?;
    let count = rules::load_rules(&conn, &path, truncate)?;
    println!("Loaded {count} rules from {}", path.display());
    recategorise(&conn)
}

pub fn add(
    description_pattern: &str,
    type_pattern: &str,
    category: &str,
    essential: bool,
    notes: Option<String>,
) -> Result<()> {
    let conn = open_db()?;
    let rule = NewRule {
        type_pattern: type_pattern.to_string(),
        description_pattern: description_pattern.to_string(),
        category: CategoryPath::parse(category),
        essential,
        notes,
    };
    let id = rules::add_rule(&conn, &rule)?;
    println!(
        "Added rule {id}: '{description_pattern}' \u{2192} {}",
        rule.category.full_label()
    );
    recategorise(&conn)
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let rows = rules::list_rules(&conn)?;
    if rows.is_empty() {
        println!("No rules loaded. Use `pennywise rules load` or `pennywise rules add`.");
        return Ok(());
    }
    println!("Rules (first match wins)\n{}", format_rules(&rows));
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_db()?;
    let rule = rules::delete_rule(&conn, id)?;
    println!(
        "Deleted rule {id}: '{}' \u{2192} {}",
        rule.description_pattern,
        rule.category.full_label()
    );
    recategorise(&conn)
}

fn format_rules(rows: &[Rule]) -> String {
    let mut table = Table::new();
    table.set_header(vec![
        "ID",
        "Type pattern",
        "Description pattern",
        "Category",
        "Essential",
        "Notes",
        "Hits",
    ]);
    for rule in rows {
        table.add_row(vec![
            Cell::new(rule.id),
            Cell::new(&rule.type_pattern),
            Cell::new(&rule.description_pattern),
            Cell::new(rule.category.full_label()),
            Cell::new(if rule.essential { "yes" } else { "" }),
            Cell::new(rule.notes.as_deref().unwrap_or_default()),
            Cell::new(rule.hit_count),
        ]);
    }
    table.to_string()
}
