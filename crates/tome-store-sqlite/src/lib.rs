//! SQLite request executor and schema setup engine for Tome.
//!
//! Every request opens a fresh [`tokio_rusqlite`] handle, runs exactly one
//! statement and closes the handle again before returning. There is no pool
//! and no long-lived connection; serialisation between writers is left to
//! SQLite's own file locking.

mod connection;
mod request;
mod setup;

pub mod error;

pub use connection::{Handle, OpenMode, create, exists, remove};
pub use error::{Error, Result, is_database_error};
pub use request::{FromRow, Params, PostResult, check_exists, get_all, get_each, post};
pub use rusqlite::{self, Row, types::Value};
pub use setup::{Schema, SetupHooks, SetupOutcome, VERSION_TABLE, setup};

/// Build a positional parameter list.
///
/// Each argument is converted with [`Value::from`], so strings must be
/// owned (`String`) rather than `&str`.
#[macro_export]
macro_rules! values {
  () => {
    ::std::vec::Vec::<$crate::Value>::new()
  };
  ($($value:expr),+ $(,)?) => {
    ::std::vec![$($crate::Value::from($value)),+]
  };
}
