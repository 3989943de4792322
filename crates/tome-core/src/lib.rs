//! Schema descriptors and the SQL statement builder for Tome.
//!
//! This crate has no database or runtime dependencies.
//! Everything here is a pure description or a pure string producer; the
//! `tome-store-sqlite` crate is what actually talks to a database file.

pub mod error;
pub mod query;
pub mod schema;
pub mod sql;
pub mod version;

pub use error::{Error, Result};
pub use query::{
  Assignment, ColumnRef, Filter, InnerJoin, Order, OrderBy, Page, SelectOptions, Selection,
};
pub use schema::{
  Column, ColumnOptions, ColumnType, ForeignKey, ForeignKeyAction, Index, Table, View,
};
pub use version::{ChangeKind, ChangeRecord, Version};
