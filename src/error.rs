use thiserror::Error;

use crate::summarize::report::GroupId;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Group {0} is not part of the report")]
    UnknownGroup(GroupId),

    #[error("Transaction dated {date} falls outside the report range {range}")]
    DateOutOfRange { date: String, range: String },

    #[error("Income and expense reports have different buckets")]
    BucketMismatch,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
