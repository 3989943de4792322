//! One-statement requests: `get_each`, `get_all`, `post`.

use std::path::Path;

use rusqlite::{OptionalExtension as _, Row, params_from_iter, types::FromSql};
use tome_core::Version;
use tracing::{debug, warn};

use crate::{
  Result, Value,
  connection::{OpenMode, with_handle},
};

/// Positional parameters, bound to `?` placeholders in order.
pub type Params = Vec<Value>;

/// Decode a value from a result row by column position.
///
/// Implementations read columns by index, so the order of the `SELECT` list
/// is the contract between a statement and its row type.
pub trait FromRow: Sized + Send + 'static {
  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

macro_rules! scalar_from_row {
  ($($t:ty),+) => {
    $(
      impl FromRow for $t {
        fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> { row.get(0) }
      }
    )+
  };
}

scalar_from_row!(i64, f64, bool, String, Vec<u8>, Value);

macro_rules! tuple_from_row {
  ($($idx:tt $t:ident),+) => {
    impl<$($t: FromSql + Send + 'static),+> FromRow for ($($t,)+) {
      fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(($(row.get::<_, $t>($idx)?,)+))
      }
    }
  };
}

tuple_from_row!(0 A);
tuple_from_row!(0 A, 1 B);
tuple_from_row!(0 A, 1 B, 2 C);
tuple_from_row!(0 A, 1 B, 2 C, 3 D);
tuple_from_row!(0 A, 1 B, 2 C, 3 D, 4 E);
tuple_from_row!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F);

/// Columns `major, minor, patch`.
impl FromRow for Version {
  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Version {
      major: row.get(0)?,
      minor: row.get(1)?,
      patch: row.get(2)?,
    })
  }
}

/// Outcome of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostResult {
  pub last_insert_id: i64,
  pub rows_affected:  usize,
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// Run a query read-only and return its first row, or `None` if it produced
/// no rows.
pub async fn get_each<T: FromRow>(
  path: impl AsRef<Path>,
  sql: impl Into<String>,
  params: Params,
) -> Result<Option<T>> {
  let path = path.as_ref();
  let sql = sql.into();
  debug!(section = "database", subsection = "request", path = %path.display(), %sql, "get_each");

  with_handle(path, OpenMode::ReadOnly, move |conn| {
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row(params_from_iter(params.iter()), T::from_row).optional();
    row
  })
  .await
}

/// Run a query read-only and return every row in statement order.
pub async fn get_all<T: FromRow>(
  path: impl AsRef<Path>,
  sql: impl Into<String>,
  params: Params,
) -> Result<Vec<T>> {
  let path = path.as_ref();
  let sql = sql.into();
  debug!(section = "database", subsection = "request", path = %path.display(), %sql, "get_all");

  with_handle(path, OpenMode::ReadOnly, move |conn| {
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
      .query_map(params_from_iter(params.iter()), T::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>();
    rows
  })
  .await
}

/// Run a statement read-write. Each call commits on its own.
pub async fn post(
  path: impl AsRef<Path>,
  sql: impl Into<String>,
  params: Params,
) -> Result<PostResult> {
  let path = path.as_ref();
  let sql = sql.into();
  debug!(section = "database", subsection = "request", path = %path.display(), %sql, "post");

  with_handle(path, OpenMode::ReadWrite, move |conn| {
    let rows_affected = conn.execute(&sql, params_from_iter(params.iter()))?;
    Ok(PostResult {
      last_insert_id: conn.last_insert_rowid(),
      rows_affected,
    })
  })
  .await
}

/// Evaluate an existence probe such as [`tome_core::sql::exists`].
///
/// Never fails: a driver error is logged and reported as `false`.
pub async fn check_exists(path: impl AsRef<Path>, sql: impl Into<String>, params: Params) -> bool {
  let path = path.as_ref();
  match get_each::<i64>(path, sql, params).await {
    Ok(found) => found.is_some_and(|v| v != 0),
    Err(error) => {
      warn!(
        section = "database",
        subsection = "request",
        path = %path.display(),
        %error,
        "existence check failed"
      );
      false
    }
  }
}
