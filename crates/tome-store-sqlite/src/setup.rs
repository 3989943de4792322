//! Database bootstrap and version migration.
//!
//! [`setup`] is called once per database at startup. A fresh file gets the
//! reserved version table, the caller's tables, views and indices (in that
//! order, each `IF NOT EXISTS`), its version row and any seed data. An
//! existing file has its stored version compared against the running one;
//! on drift the caller's migration hook runs and the version row is
//! replaced.
//!
//! The read-compare-replace sequence is not wrapped in a transaction: two
//! concurrent `setup` calls for the same path can race. Callers run one
//! sequential setup per database.

use std::{future::Future, path::Path};

use tome_core::{
  ChangeRecord, Column, ColumnType, Index, SelectOptions, Selection, Table, Version, View, sql,
};
use tracing::{error, info};

use crate::{Error, Result, connection, get_all, post, values};

/// Name of the reserved single-row version table.
pub const VERSION_TABLE: &str = "version";

const VERSION_COLUMNS: [&str; 3] = ["major", "minor", "patch"];

fn version_table() -> Table {
  VERSION_COLUMNS.iter().fold(Table::new(VERSION_TABLE), |table, name| {
    table.column(Column::new(*name, ColumnType::Integer).not_null())
  })
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Everything a feature declares about its database.
#[derive(Debug, Clone, Default)]
pub struct Schema {
  pub tables:  Vec<Table>,
  pub views:   Vec<View>,
  pub indices: Vec<Index>,
}

impl Schema {
  pub fn new() -> Self { Self::default() }

  pub fn table(mut self, table: Table) -> Self {
    self.tables.push(table);
    self
  }

  pub fn view(mut self, view: View) -> Self {
    self.views.push(view);
    self
  }

  pub fn index(mut self, index: Index) -> Self {
    self.indices.push(index);
    self
  }
}

/// Optional callbacks invoked by [`setup`].
///
/// Both return values are only logged. The hooks themselves must perform any
/// writes they need through the request functions before returning.
pub trait SetupHooks: Send + Sync {
  /// Seed a freshly created database; returns log lines.
  fn setup_initial_data(
    &self,
    _path: &Path,
  ) -> impl Future<Output = Result<Vec<String>>> + Send {
    async { Ok(Vec::new()) }
  }

  /// Bring the data from `previous` up to `current`; returns change records.
  fn migrate_version(
    &self,
    _path: &Path,
    _previous: Version,
    _current: Version,
  ) -> impl Future<Output = Result<Vec<ChangeRecord>>> + Send {
    async { Ok(Vec::new()) }
  }
}

/// No seed data and no migration.
impl SetupHooks for () {}

/// What [`setup`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupOutcome {
  /// The file did not exist and was created.
  pub created:  bool,
  /// The version migrated away from, if a migration ran.
  pub previous: Option<Version>,
  pub version:  Version,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Create, seed and version-check the database at `path`.
///
/// Any error propagates as-is; nothing is rolled back. A version table with
/// zero or several rows is fatal and is never repaired automatically.
pub async fn setup<H: SetupHooks>(
  path: impl AsRef<Path>,
  schema: &Schema,
  current: Version,
  hooks: &H,
) -> Result<SetupOutcome> {
  let path = path.as_ref();

  let created = if connection::exists(path).await? {
    false
  } else {
    connection::create(path).await?.close().await?;
    true
  };

  if created {
    info!(
      section = "database",
      subsection = "setup",
      path = %path.display(),
      %current,
      "creating database"
    );
    create_schema(path, schema).await?;
    insert_version(path, current).await?;

    for line in hooks.setup_initial_data(path).await? {
      info!(section = "database", subsection = "setup", path = %path.display(), "{line}");
    }
  }

  let stored = read_version(path).await?;
  if stored == current {
    return Ok(SetupOutcome { created, previous: None, version: current });
  }

  info!(
    section = "database",
    subsection = "setup",
    path = %path.display(),
    %stored,
    %current,
    "migrating database"
  );
  for change in hooks.migrate_version(path, stored, current).await? {
    info!(section = "database", subsection = "setup", path = %path.display(), "{change}");
  }

  post(path, sql::remove(VERSION_TABLE, None), values![]).await?;
  insert_version(path, current).await?;

  Ok(SetupOutcome { created, previous: Some(stored), version: current })
}

/// Tables before views and indices, which may reference them.
async fn create_schema(path: &Path, schema: &Schema) -> Result<()> {
  post(path, sql::create_table(&version_table(), true), values![]).await?;
  for table in &schema.tables {
    post(path, sql::create_table(table, true), values![]).await?;
  }
  for view in &schema.views {
    post(path, sql::create_view(view, true), values![]).await?;
  }
  for index in &schema.indices {
    post(path, sql::create_index(index, true), values![]).await?;
  }
  Ok(())
}

async fn insert_version(path: &Path, version: Version) -> Result<()> {
  post(
    path,
    sql::insert(VERSION_TABLE, &VERSION_COLUMNS),
    values![version.major, version.minor, version.patch],
  )
  .await?;
  Ok(())
}

async fn read_version(path: &Path) -> Result<Version> {
  let columns = VERSION_COLUMNS.map(Selection::from);
  let rows: Vec<Version> = get_all(
    path,
    sql::select(VERSION_TABLE, &columns, &SelectOptions::new()),
    values![],
  )
  .await?;

  match rows.as_slice() {
    [version] => Ok(*version),
    _ => {
      error!(
        section = "database",
        subsection = "setup",
        path = %path.display(),
        found = rows.len(),
        "version table must hold exactly one row"
      );
      Err(Error::VersionRowCount { path: path.to_owned(), found: rows.len() })
    }
  }
}
