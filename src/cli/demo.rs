use chrono::{Datelike, Local, NaiveDate};
use rusqlite::Connection;

use ledgerview::db::{get_connection, init_db};
use ledgerview::error::{LedgerError, Result};
use ledgerview::settings::Settings;
use ledgerview::summarize::parse_date;

const ACCOUNT_NAME: &str = "Everyday Checking";

// (id, name, is_expense, order, exclude_from_reports)
const CATEGORIES: &[(i64, &str, bool, i64, bool)] = &[
    (1, "Salary", false, 1, false),
    (2, "Side Income", false, 2, false),
    (3, "Housing", true, 3, false),
    (4, "Food", true, 4, false),
    (5, "Transport", true, 5, false),
    (6, "Leisure", true, 6, false),
    (7, "Transfers", true, 7, true),
];

// (id, name, category_id)
const SUBCATEGORIES: &[(i64, &str, i64)] = &[
    (10, "Paycheck", 1),
    (11, "Bonus", 1),
    (20, "Freelance", 2),
    (21, "Interest", 2),
    (30, "Rent", 3),
    (31, "Utilities", 3),
    (40, "Groceries", 4),
    (41, "Restaurants", 4),
    (50, "Fuel", 5),
    (51, "Transit", 5),
    (60, "Streaming", 6),
    (61, "Books", 6),
    (70, "Between accounts", 7),
];

// (id, name, subcategory_id)
const PAYEES: &[(i64, &str, Option<i64>)] = &[
    (1, "ACME CORP PAYROLL", Some(10)),
    (2, "UPWORK ESCROW", Some(20)),
    (3, "SAVINGS INTEREST", Some(21)),
    (4, "OAK STREET PROPERTIES", Some(30)),
    (5, "CITY POWER & WATER", Some(31)),
    (6, "GREEN GROCER", Some(40)),
    (7, "CORNER BISTRO", Some(41)),
    (8, "SHELL STATION", Some(50)),
    (9, "METRO CARD", Some(51)),
    (10, "STREAMFLIX", Some(60)),
    (11, "PAGE TURNER BOOKS", Some(61)),
    (12, "TRANSFER TO SAVINGS", Some(70)),
    (13, "MARKETPLACE", None),
];

/// (day, payee_id, base amount) repeated every month.
const MONTHLY: &[(u32, i64, f64)] = &[
    (1, 1, 4200.00),
    (2, 4, -1450.00),
    (5, 10, -12.99),
    (9, 5, -96.40),
    (12, 6, -184.35),
    (19, 6, -142.10),
    (21, 9, -45.00),
    (26, 7, -38.50),
    (28, 12, -500.00),
    (28, 3, 3.12),
];

struct DemoTxn {
    date: NaiveDate,
    payee_id: i64,
    amount: f64,
    subcategory_id: Option<i64>,
    override_subcategory: bool,
    note: &'static str,
}

fn clamp_day(year: i32, month: u32, day: u32) -> NaiveDate {
    (1..=day)
        .rev()
        .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
        .unwrap_or_default()
}

fn plain(date: NaiveDate, payee_id: i64, amount: f64) -> DemoTxn {
    DemoTxn {
        date,
        payee_id,
        amount,
        subcategory_id: None,
        override_subcategory: false,
        note: "",
    }
}

/// Twelve months of transactions ending with the month of `end`.
fn generate_transactions(end: NaiveDate) -> Vec<DemoTxn> {
    let mut txns = Vec::new();

    for i in 0..12u32 {
        let target = end - chrono::Months::new(11 - i);
        let (year, month) = (target.year(), target.month());
        let idx = i as usize;
        let vary = 1.0 + ((idx % 5) as f64 - 2.0) * 0.02;

        for (day, payee_id, base) in MONTHLY {
            let amount = if *payee_id == 1 || *payee_id == 4 {
                *base
            } else {
                (base * vary * 100.0).round() / 100.0
            };
            txns.push(plain(clamp_day(year, month, *day), *payee_id, amount));
        }

        if idx % 3 == 0 {
            txns.push(plain(clamp_day(year, month, 15), 2, 850.0 + idx as f64 * 25.0));
            txns.push(plain(clamp_day(year, month, 16), 8, -61.75));
        }
        if idx % 4 == 1 {
            txns.push(plain(clamp_day(year, month, 23), 11, -24.99));
        }

        // Marketplace purchases have no payee default: one is categorized by
        // hand, the other is explicitly left uncategorized.
        txns.push(DemoTxn {
            subcategory_id: Some(61),
            override_subcategory: true,
            note: "paperbacks",
            ..plain(clamp_day(year, month, 14), 13, -17.80)
        });
        txns.push(DemoTxn {
            note: "unknown seller",
            override_subcategory: true,
            ..plain(clamp_day(year, month, 20), 13, -9.99)
        });

        // A dinner out paid at the grocer, re-filed under restaurants.
        if idx % 2 == 0 {
            txns.push(DemoTxn {
                subcategory_id: Some(41),
                override_subcategory: true,
                note: "deli dinner",
                ..plain(clamp_day(year, month, 24), 6, -27.30)
            });
        }

        if month == 12 {
            txns.push(plain(clamp_day(year, month, 20), 1, 2500.0));
        }
    }

    txns
}

fn insert_demo_data(conn: &Connection, end: NaiveDate) -> Result<usize> {
    conn.execute("INSERT INTO accounts (name) VALUES (?1)", [ACCOUNT_NAME])?;
    let account_id = conn.last_insert_rowid();

    for (id, name, is_expense, order, exclude) in CATEGORIES {
        conn.execute(
            "INSERT INTO categories (id, name, is_expense, \"order\", exclude_from_reports) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![id, name, is_expense, order, exclude],
        )?;
    }
    for (id, name, category_id) in SUBCATEGORIES {
        conn.execute(
            "INSERT INTO subcategories (id, name, category_id) VALUES (?1, ?2, ?3)",
            rusqlite::params![id, name, category_id],
        )?;
    }
    for (id, name, subcategory_id) in PAYEES {
        conn.execute(
            "INSERT INTO payees (id, name, subcategory_id) VALUES (?1, ?2, ?3)",
            rusqlite::params![id, name, subcategory_id],
        )?;
    }

    let txns = generate_transactions(end);
    for (n, txn) in txns.iter().enumerate() {
        conn.execute(
            "INSERT INTO transactions \
             (id, date, amount, account_id, payee_id, subcategory_id, override_subcategory, note) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                format!("demo-{n:05}"),
                txn.date.format("%Y-%m-%d").to_string(),
                txn.amount,
                account_id,
                txn.payee_id,
                txn.subcategory_id,
                txn.override_subcategory,
                txn.note,
            ],
        )?;
    }

    Ok(txns.len())
}

pub fn run(settings: &Settings, end: Option<String>) -> Result<()> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(LedgerError::Other(
            "No database found. Run `ledgerview init` first.".to_string(),
        ));
    }

    let end = match end {
        Some(s) => parse_date(&s)?,
        None => Local::now().date_naive(),
    };

    let conn = get_connection(&db_path)?;
    init_db(&conn)?;

    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM accounts WHERE name = ?1)",
        [ACCOUNT_NAME],
        |r| r.get(0),
    )?;
    if exists {
        println!("Demo data already loaded (account '{ACCOUNT_NAME}' exists).");
        return Ok(());
    }

    let txn_count = insert_demo_data(&conn, end)?;
    let start = end - chrono::Months::new(11);

    println!("Demo data loaded!");
    println!("  Account:       {ACCOUNT_NAME}");
    println!("  Categories:    {}", CATEGORIES.len());
    println!("  Subcategories: {}", SUBCATEGORIES.len());
    println!("  Transactions:  {txn_count}");
    println!();
    println!("Try these next:");
    println!(
        "  ledgerview report transactions --from {} --to {} --expense",
        start.with_day(1).unwrap_or(start).format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    );
    println!(
        "  ledgerview report balance --from {} --to {}",
        start.with_day(1).unwrap_or(start).format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    );

    Ok(())
}
