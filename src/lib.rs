pub mod db;
pub mod error;
pub mod fmt;
pub mod models;
pub mod settings;
pub mod summarize;
