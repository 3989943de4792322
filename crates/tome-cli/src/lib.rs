//! Feature databases for the `tome` command-line tool.
//!
//! Each feature module owns one SQLite file: its table, view and index
//! descriptors, its schema version, its row types and its own error enum.
//! All storage goes through `tome-store-sqlite`.

pub mod config;
pub mod features;

pub use config::CliConfig;
