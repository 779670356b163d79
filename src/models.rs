use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub is_expense: bool,
    pub order: i64,
    pub exclude_from_reports: bool,
}

#[derive(Debug, Clone)]
pub struct Subcategory {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
}

#[derive(Debug, Clone)]
pub struct Payee {
    pub id: i64,
    pub name: String,
    pub subcategory_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub amount: f64,
    pub account_id: i64,
    pub payee_id: i64,
    pub subcategory_id: Option<i64>,
    /// When set, `subcategory_id` is used verbatim (even if `None`) instead of
    /// the payee's subcategory.
    pub override_subcategory: bool,
    pub note: String,
}

/// A materialized, read-only snapshot of everything a report needs.
///
/// Categories are expected in display order; subcategories keep the order in
/// which they were supplied.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
    pub payees: Vec<Payee>,
    pub transactions: Vec<Transaction>,
}
