use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, Row};

use crate::error::{LedgerError, Result};
use crate::models::{Category, Ledger, Payee, Subcategory, Transaction};
use crate::summarize::DateRange;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    is_expense INTEGER NOT NULL,
    \"order\" INTEGER NOT NULL,
    exclude_from_reports INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS subcategories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    category_id INTEGER NOT NULL,
    FOREIGN KEY (category_id) REFERENCES categories(id)
);

CREATE TABLE IF NOT EXISTS payees (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    subcategory_id INTEGER,
    note TEXT DEFAULT '',
    FOREIGN KEY (subcategory_id) REFERENCES subcategories(id)
);

CREATE TABLE IF NOT EXISTS transactions (
    id TEXT PRIMARY KEY,
    date TEXT NOT NULL,
    amount REAL NOT NULL,
    account_id INTEGER NOT NULL,
    payee_id INTEGER NOT NULL,
    subcategory_id INTEGER,
    override_subcategory INTEGER NOT NULL DEFAULT 0,
    note TEXT DEFAULT '',
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (payee_id) REFERENCES payees(id),
    FOREIGN KEY (subcategory_id) REFERENCES subcategories(id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
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

/// A table that can be loaded whole into typed records.
pub trait Record: Sized {
    const TABLE: &'static str;
    const COLUMNS: &'static str;
    const ORDER_BY: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl Record for Category {
    const TABLE: &'static str = "categories";
    const COLUMNS: &'static str = "id, name, is_expense, \"order\", exclude_from_reports";
    const ORDER_BY: &'static str = "\"order\", id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            is_expense: row.get(2)?,
            order: row.get(3)?,
            exclude_from_reports: row.get(4)?,
        })
    }
}

impl Record for Subcategory {
    const TABLE: &'static str = "subcategories";
    const COLUMNS: &'static str = "id, name, category_id";
    const ORDER_BY: &'static str = "id";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Subcategory {
            id: row.get(0)?,
            name: row.get(1)?,
            category_id: row.get(2)?,
        })
    }
}

impl Record for Payee {
    const TABLE: &'static str = "payees";
    const COLUMNS: &'static str = "id, name, subcategory_id";
    const ORDER_BY: &'static str = "name";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Payee {
            id: row.get(0)?,
            name: row.get(1)?,
            subcategory_id: row.get(2)?,
        })
    }
}

pub fn get_all<T: Record>(conn: &Connection) -> Result<Vec<T>> {
    let sql = format!(
        "SELECT {} FROM {} ORDER BY {}",
        T::COLUMNS,
        T::TABLE,
        T::ORDER_BY
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], T::from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Transactions dated within `range`, inclusive, oldest first.
pub fn get_transactions(conn: &Connection, range: DateRange) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, amount, account_id, payee_id, subcategory_id, override_subcategory, \
         COALESCE(note, '') FROM transactions WHERE date BETWEEN ?1 AND ?2 ORDER BY date, id",
    )?;
    let raw: Vec<(String, String, f64, i64, i64, Option<i64>, bool, String)> = stmt
        .query_map(
            [
                range.start.format("%Y-%m-%d").to_string(),
                range.end.format("%Y-%m-%d").to_string(),
            ],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                ))
            },
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(
            |(id, date, amount, account_id, payee_id, subcategory_id, override_subcategory, note)| -> Result<Transaction> {
                let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                    .map_err(|_| LedgerError::InvalidDate(date.clone()))?;
                Ok(Transaction {
                    id,
                    date,
                    amount,
                    account_id,
                    payee_id,
                    subcategory_id,
                    override_subcategory,
                    note,
                })
            },
        )
        .collect()
}

/// The full taxonomy plus the transactions in `range`.
pub fn load_ledger(conn: &Connection, range: DateRange) -> Result<Ledger> {
    let ledger = Ledger {
        categories: get_all(conn)?,
        subcategories: get_all(conn)?,
        payees: get_all(conn)?,
        transactions: get_transactions(conn, range)?,
    };
    tracing::debug!(
        %range,
        categories = ledger.categories.len(),
        subcategories = ledger.subcategories.len(),
        payees = ledger.payees.len(),
        transactions = ledger.transactions.len(),
        "loaded ledger"
    );
    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarize::parse_date;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn seed(conn: &Connection) {
        conn.execute_batch(
            "INSERT INTO accounts (id, name) VALUES (1, 'Checking');
             INSERT INTO categories (id, name, is_expense, \"order\") VALUES (1, 'Home', 1, 2), (2, 'Salary', 0, 1);
             INSERT INTO subcategories (id, name, category_id) VALUES (10, 'Rent', 1), (20, 'Paycheck', 2);
             INSERT INTO payees (id, name, subcategory_id) VALUES (1, 'Landlord', 10), (2, 'Employer', 20), (3, 'Corner shop', NULL);
             INSERT INTO transactions (id, date, amount, account_id, payee_id, subcategory_id, override_subcategory)
               VALUES ('a', '2022-01-03', -500.0, 1, 1, NULL, 0),
                      ('b', '2022-01-25', 2000.0, 1, 2, NULL, 0),
                      ('c', '2022-02-10', -12.5, 1, 3, 10, 1),
                      ('d', '2022-03-01', -500.0, 1, 1, NULL, 0);",
        )
        .unwrap();
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
        for expected in &["accounts", "categories", "subcategories", "payees", "transactions"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_categories_load_in_display_order() {
        let (_dir, conn) = test_db();
        seed(&conn);
        let categories: Vec<Category> = get_all(&conn).unwrap();
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Salary", "Home"]);
        assert!(categories[1].is_expense);
        assert!(!categories[1].exclude_from_reports);
    }

    #[test]
    fn test_load_ledger_filters_by_date() {
        let (_dir, conn) = test_db();
        seed(&conn);
        let range = DateRange::new(parse_date("2022-01-01").unwrap(), parse_date("2022-02-28").unwrap());
        let ledger = load_ledger(&conn, range).unwrap();
        let ids: Vec<&str> = ledger.transactions.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(ledger.payees.len(), 3);
        let corner_shop = ledger.payees.iter().find(|p| p.id == 3).unwrap();
        assert_eq!(corner_shop.subcategory_id, None);

        let overridden = &ledger.transactions[2];
        assert!(overridden.override_subcategory);
        assert_eq!(overridden.subcategory_id, Some(10));
        assert_eq!(overridden.note, "");
    }

    #[test]
    fn test_bad_date_in_store_is_reported() {
        let (_dir, conn) = test_db();
        seed(&conn);
        conn.execute(
            "INSERT INTO transactions (id, date, amount, account_id, payee_id) VALUES ('x', '2022-01-1x', 1.0, 1, 1)",
            [],
        )
        .unwrap();
        let range = DateRange::new(parse_date("2022-01-01").unwrap(), parse_date("2022-01-31").unwrap());
        assert!(matches!(load_ledger(&conn, range), Err(LedgerError::InvalidDate(_))));
    }
}
