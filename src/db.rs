use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    date_range_start TEXT,
    date_range_end TEXT,
    checksum TEXT
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    date TEXT NOT NULL,
    transaction_type TEXT NOT NULL,
    description TEXT NOT NULL,
    paid_out REAL NOT NULL DEFAULT 0,
    paid_in REAL NOT NULL DEFAULT 0,
    balance REAL NOT NULL DEFAULT 0,
    import_id INTEGER,
    FOREIGN KEY (import_id) REFERENCES imports(id)
);

CREATE TABLE IF NOT EXISTS rules (
    id INTEGER PRIMARY KEY,
    transaction_type_pattern TEXT NOT NULL,
    description_pattern TEXT NOT NULL,
    main_category TEXT NOT NULL,
    sub1 TEXT,
    sub2 TEXT,
    sub3 TEXT,
    essential INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    hit_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS categorised (
    transaction_id INTEGER PRIMARY KEY,
    rule_id INTEGER,
    main_category TEXT NOT NULL,
    sub1 TEXT,
    sub2 TEXT,
    sub3 TEXT,
    essential INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    FOREIGN KEY (transaction_id) REFERENCES transactions(id) ON DELETE CASCADE
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Remove every loaded statement row along with its categorisation and
/// import record. Rules are left in place.
pub fn clear_statements(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DELETE FROM categorised; DELETE FROM transactions; DELETE FROM imports;",
    )?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = get_connection(&dir.path().join("test.db")).unwrap();
    init_db(&conn).unwrap();
    (dir, conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["transactions", "rules", "categorised", "imports"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_clear_statements_keeps_rules() {
        let (_dir, conn) = test_db();
        conn.execute(
            "INSERT INTO transactions (date, transaction_type, description) VALUES ('2025-01-01', 'DEB', 'SHOP')",
            [],
        ).unwrap();
        let txn_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO categorised (transaction_id, main_category) VALUES (?1, 'Food')",
            [txn_id],
        ).unwrap();
        conn.execute(
            "INSERT INTO rules (transaction_type_pattern, description_pattern, main_category) VALUES ('', 'SHOP', 'Food')",
            [],
        ).unwrap();

        clear_statements(&conn).unwrap();
        assert_eq!(count(&conn, "transactions"), 0);
        assert_eq!(count(&conn, "categorised"), 0);
        assert_eq!(count(&conn, "rules"), 1);
    }

    #[test]
    fn test_categorised_rows_cascade_with_transactions() {
        let (_dir, conn) = test_db();
        conn.execute(
            "INSERT INTO transactions (date, transaction_type, description) VALUES ('2025-01-01', 'DEB', 'SHOP')",
            [],
        ).unwrap();
        let txn_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO categorised (transaction_id, main_category) VALUES (?1, 'Food')",
            [txn_id],
        ).unwrap();
        conn.execute("DELETE FROM transactions", []).unwrap();
        assert_eq!(count(&conn, "categorised"), 0);
    }
}
