use std::collections::HashMap;

use log::{debug, info, warn};
use regex::{Regex, RegexBuilder};
use rusqlite::Connection;

use crate::error::{PennywiseError, Result};
use crate::models::{CategoryPath, Rule, UNCATEGORISED};
use crate::rules::list_rules;

/// Compile a rule pattern. Matching is case-insensitive and unanchored, so
/// a pattern only has to occur somewhere in the field.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| PennywiseError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

pub struct CompiledRule {
    pub rule: Rule,
    type_re: Regex,
    description_re: Regex,
}

impl CompiledRule {
    pub fn new(rule: Rule) -> Result<Self> {
        Ok(Self {
            type_re: compile_pattern(&rule.type_pattern)?,
            description_re: compile_pattern(&rule.description_pattern)?,
            rule,
        })
    }

    /// Both patterns have to match.
    pub fn matches(&self, transaction_type: &str, description: &str) -> bool {
        self.type_re.is_match(transaction_type) && self.description_re.is_match(description)
    }
}

/// Rules in evaluation order.
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    pub fn compile(rules: Vec<Rule>) -> Result<Self> {
        let rules = rules
            .into_iter()
            .map(CompiledRule::new)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// First rule that matches wins; rules after it are never consulted.
    pub fn classify(&self, transaction_type: &str, description: &str) -> Option<&CompiledRule> {
        self.rules
            .iter()
            .find(|r| r.matches(transaction_type, description))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Debug)]
pub struct CategoriseResult {
    pub categorised: usize,
    pub uncategorised: usize,
}

/// Recompute the categorisation of every transaction from scratch.
pub fn categorise_transactions(conn: &Connection) -> Result<CategoriseResult> {
    let rule_set = RuleSet::compile(list_rules(conn)?)?;
    if rule_set.is_empty() {
        warn!("no rules loaded; every transaction will be {UNCATEGORISED}");
    }

    let mut txn_stmt =
        conn.prepare("SELECT id, transaction_type, description FROM transactions ORDER BY id")?;
    let transactions: Vec<(i64, String, String)> = txn_stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch("DELETE FROM categorised; UPDATE rules SET hit_count = 0;")?;

    let mut categorised = 0usize;
    let mut uncategorised = 0usize;
    let mut hits: HashMap<i64, i64> = HashMap::new();
    let fallback = CategoryPath::uncategorised();

    {
        let mut insert = tx.prepare(
            "INSERT INTO categorised (transaction_id, rule_id, main_category, sub1, sub2, sub3, essential, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for (txn_id, txn_type, description) in &transactions {
            match rule_set.classify(txn_type, description) {
                Some(compiled) => {
                    let rule = &compiled.rule;
                    debug!(
                        "match: [type='{txn_type}'] [desc='{description}'] rule {} ('{}', '{}') -> {}",
                        rule.id,
                        rule.type_pattern,
                        rule.description_pattern,
                        rule.category.full_label()
                    );
                    insert.execute(rusqlite::params![
                        txn_id,
                        rule.id,
                        rule.category.main,
                        rule.category.sub1,
                        rule.category.sub2,
                        rule.category.sub3,
                        rule.essential,
                        rule.notes,
                    ])?;
                    *hits.entry(rule.id).or_default() += 1;
                    categorised += 1;
                }
                None => {
                    debug!("no match: [type='{txn_type}'] [desc='{description}']");
                    insert.execute(rusqlite::params![
                        txn_id,
                        None::<i64>,
                        fallback.main,
                        None::<String>,
                        None::<String>,
                        None::<String>,
                        false,
                        None::<String>,
                    ])?;
                    uncategorised += 1;
                }
            }
        }

        let mut bump = tx.prepare("UPDATE rules SET hit_count = ?1 WHERE id = ?2")?;
        for (rule_id, count) in &hits {
            bump.execute([count, rule_id])?;
        }
    }
    tx.commit()?;

    info!(
        "categorised {categorised} transactions against {} rules, {uncategorised} uncategorised",
        rule_set.len()
    );
    Ok(CategoriseResult {
        categorised,
        uncategorised,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;
    use crate::models::NewRule;
    use crate::rules::add_rule;

    fn rule(id: i64, type_pattern: &str, description_pattern: &str, category: &str) -> Rule {
        Rule {
            id,
            type_pattern: type_pattern.to_string(),
            description_pattern: description_pattern.to_string(),
            category: CategoryPath::parse(category),
            essential: false,
            notes: None,
            hit_count: 0,
        }
    }

    fn add_txns(conn: &Connection, txns: &[(&str, &str)]) {
        for (txn_type, desc) in txns {
            conn.execute(
                "INSERT INTO transactions (date, transaction_type, description, paid_out) \
                 VALUES ('2025-01-15', ?1, ?2, 10.0)",
                rusqlite::params![txn_type, desc],
            )
            .unwrap();
        }
    }

    fn new_rule(type_pattern: &str, description_pattern: &str, category: &str, essential: bool) -> NewRule {
        NewRule {
            type_pattern: type_pattern.to_string(),
            description_pattern: description_pattern.to_string(),
            category: CategoryPath::parse(category),
            essential,
            notes: None,
        }
    }

    fn category_of(conn: &Connection, description: &str) -> (String, Option<String>, bool) {
        conn.query_row(
            "SELECT c.main_category, c.sub1, c.essential FROM categorised c \
             JOIN transactions t ON t.id = c.transaction_id WHERE t.description = ?1",
            [description],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap()
    }

    #[test]
    fn test_classify_is_case_insensitive_search() {
        let set = RuleSet::compile(vec![rule(1, "payment", "tesco", "Food")]).unwrap();
        let hit = set.classify("Contactless PAYMENT", "TESCO STORES 1234").unwrap();
        assert_eq!(hit.rule.id, 1);
    }

    #[test]
    fn test_classify_requires_both_patterns() {
        let set = RuleSet::compile(vec![rule(1, "^Direct debit$", "COUNCIL", "Bills")]).unwrap();
        assert!(set.classify("Direct debit", "CITY COUNCIL TAX").is_some());
        assert!(set.classify("Contactless Payment", "CITY COUNCIL TAX").is_none());
        assert!(set.classify("Direct debit", "NETFLIX").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let set = RuleSet::compile(vec![
            rule(1, "", "AMAZON PRIME", "Subscriptions"),
            rule(2, "", "AMAZON", "Shopping"),
        ])
        .unwrap();
        assert_eq!(set.classify("Card", "AMAZON PRIME*2K").unwrap().rule.id, 1);
        assert_eq!(set.classify("Card", "AMAZON MKTPLACE").unwrap().rule.id, 2);
    }

    #[test]
    fn test_empty_patterns_match_everything() {
        let set = RuleSet::compile(vec![rule(1, "", "", "Misc")]).unwrap();
        assert!(set.classify("", "").is_some());
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = RuleSet::compile(vec![rule(1, "(", "", "X")]).err().unwrap();
        assert!(matches!(err, PennywiseError::InvalidPattern { .. }));
    }

    #[test]
    fn test_categorise_writes_one_row_per_transaction() {
        let (_dir, conn) = test_db();
        add_txns(&conn, &[("Card", "TESCO"), ("Card", "UNKNOWN SHOP"), ("DD", "EDF ENERGY")]);
        add_rule(&conn, &new_rule("", "tesco", "Food; Groceries", true)).unwrap();
        add_rule(&conn, &new_rule("^DD$", "energy", "Bills", true)).unwrap();

        let result = categorise_transactions(&conn).unwrap();
        assert_eq!(result.categorised, 2);
        assert_eq!(result.uncategorised, 1);

        let rows: i64 = conn
            .query_row("SELECT count(*) FROM categorised", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 3);
        assert_eq!(
            category_of(&conn, "TESCO"),
            ("Food".to_string(), Some("Groceries".to_string()), true)
        );
        assert_eq!(
            category_of(&conn, "UNKNOWN SHOP"),
            ("Uncategorised".to_string(), None, false)
        );
    }

    #[test]
    fn test_categorise_without_rules() {
        let (_dir, conn) = test_db();
        add_txns(&conn, &[("Card", "ANYTHING")]);
        assert!(RuleSet::compile(list_rules(&conn).unwrap()).unwrap().is_empty());
        let result = categorise_transactions(&conn).unwrap();
        assert_eq!(result.categorised, 0);
        assert_eq!(result.uncategorised, 1);
    }

    #[test]
    fn test_recategorise_replaces_previous_results() {
        let (_dir, conn) = test_db();
        add_txns(&conn, &[("Card", "NETFLIX.COM")]);
        categorise_transactions(&conn).unwrap();
        add_rule(&conn, &new_rule("", "netflix", "Entertainment", false)).unwrap();
        let result = categorise_transactions(&conn).unwrap();
        assert_eq!(result.categorised, 1);
        assert_eq!(category_of(&conn, "NETFLIX.COM").0, "Entertainment");
    }

    #[test]
    fn test_hit_counts_reflect_latest_run() {
        let (_dir, conn) = test_db();
        add_txns(&conn, &[("Card", "TFL TRAVEL"), ("Card", "TFL TRAVEL CH")]);
        let id = add_rule(&conn, &new_rule("", "^TFL", "Transport", true)).unwrap();
        categorise_transactions(&conn).unwrap();
        categorise_transactions(&conn).unwrap();
        let hits: i64 = conn
            .query_row("SELECT hit_count FROM rules WHERE id = ?1", [id], |r| r.get(0))
            .unwrap();
        assert_eq!(hits, 2);
    }
}
