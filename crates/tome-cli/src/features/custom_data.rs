//! Named numeric values that commands can read and adjust.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tome_core::{
  Assignment, Column, ColumnType, Filter, OrderBy, SelectOptions, Selection, Table, Version, sql,
};
use tome_store_sqlite::{self as store, FromRow, Row, Schema, SetupOutcome, rusqlite, values};

pub const DATABASE_FILE: &str = "custom_data.db";
pub const VERSION: Version = Version::new(0, 0, 1);

const TABLE: &str = "custom_data";
const COLUMNS: [&str; 3] = ["id", "name", "value"];

#[derive(Debug, Error)]
pub enum Error {
  #[error("no custom data named {0:?}")]
  NotFound(String),

  #[error("no custom data with id {0}")]
  IdNotFound(i64),

  #[error("custom data named {0:?} already exists")]
  AlreadyExists(String),

  #[error("store request failed")]
  Store(#[from] store::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub fn schema() -> Schema {
  Schema::new().table(
    Table::new(TABLE)
      .column(Column::new("id", ColumnType::Integer).primary_key())
      .column(Column::new("name", ColumnType::Text).not_null().unique())
      .column(Column::new("value", ColumnType::Numeric).not_null()),
  )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
  pub id:    i64,
  pub name:  String,
  pub value: f64,
}

impl FromRow for Entry {
  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:    row.get(0)?,
      name:  row.get(1)?,
      value: row.get(2)?,
    })
  }
}

/// How to change a stored value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueUpdate {
  Set(f64),
  Increase(f64),
  Decrease(f64),
}

impl ValueUpdate {
  fn assignment(self) -> (Assignment, f64) {
    let column = "value".to_owned();
    match self {
      Self::Set(v) => (Assignment::Set(column), v),
      Self::Increase(v) => (Assignment::Increase(column), v),
      Self::Decrease(v) => (Assignment::Decrease(column), v),
    }
  }
}

#[derive(Debug, Clone)]
pub struct CustomData {
  path: PathBuf,
}

impl CustomData {
  pub fn new(data_dir: &Path) -> Self {
    Self { path: data_dir.join(DATABASE_FILE) }
  }

  pub fn path(&self) -> &Path { &self.path }

  pub async fn setup(&self) -> Result<SetupOutcome> {
    Ok(store::setup(&self.path, &schema(), VERSION, &()).await?)
  }

  pub async fn exists_entry(&self, name: &str) -> bool {
    store::check_exists(
      &self.path,
      sql::exists(TABLE, Some(&Filter::equals("name"))),
      values![name.to_owned()],
    )
    .await
  }

  pub async fn create_entry(&self, name: &str, value: f64) -> Result<Entry> {
    if self.exists_entry(name).await {
      return Err(Error::AlreadyExists(name.to_owned()));
    }
    let posted = store::post(
      &self.path,
      sql::insert(TABLE, &["name", "value"]),
      values![name.to_owned(), value],
    )
    .await?;
    Ok(Entry { id: posted.last_insert_id, name: name.to_owned(), value })
  }

  pub async fn get_entry(&self, name: &str) -> Result<Entry> {
    let columns = COLUMNS.map(Selection::from);
    store::get_each(
      &self.path,
      sql::select(TABLE, &columns, &SelectOptions::new().filter(Filter::equals("name"))),
      values![name.to_owned()],
    )
    .await?
    .ok_or_else(|| Error::NotFound(name.to_owned()))
  }

  pub async fn list(&self) -> Result<Vec<Entry>> {
    let columns = COLUMNS.map(Selection::from);
    let options = SelectOptions::new().order_by(OrderBy::asc("name"));
    Ok(store::get_all(&self.path, sql::select(TABLE, &columns, &options), values![]).await?)
  }

  /// Apply `update` to the row with `id` in a single statement.
  pub async fn update_entry(&self, id: i64, update: ValueUpdate) -> Result<()> {
    let (assignment, operand) = update.assignment();
    let posted = store::post(
      &self.path,
      sql::update(TABLE, &[assignment], Some(&Filter::equals("id"))),
      values![operand, id],
    )
    .await?;
    if posted.rows_affected == 0 {
      return Err(Error::IdNotFound(id));
    }
    Ok(())
  }

  /// Set, or adjust relative to the current value, and return the new row.
  pub async fn update_by_name(&self, name: &str, update: ValueUpdate) -> Result<Entry> {
    let entry = self.get_entry(name).await?;
    self.update_entry(entry.id, update).await?;
    self.get_entry(name).await
  }

  pub async fn remove_entry(&self, name: &str) -> Result<()> {
    let posted = store::post(
      &self.path,
      sql::remove(TABLE, Some(&Filter::equals("name"))),
      values![name.to_owned()],
    )
    .await?;
    if posted.rows_affected == 0 {
      return Err(Error::NotFound(name.to_owned()));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;

  async fn data() -> (TempDir, CustomData) {
    let dir = tempfile::tempdir().unwrap();
    let data = CustomData::new(dir.path());
    data.setup().await.unwrap();
    (dir, data)
  }

  #[test]
  fn increase_renders_relative_update() {
    let (assignment, _) = ValueUpdate::Increase(5.0).assignment();
    assert_eq!(
      sql::update(TABLE, &[assignment], Some(&Filter::equals("id"))),
      "UPDATE custom_data SET value = value + ? WHERE id=?"
    );
  }

  #[tokio::test]
  async fn increase_adds_exactly_the_delta() {
    let (_dir, data) = data().await;
    let entry = data.create_entry("deaths", 10.0).await.unwrap();

    data.update_entry(entry.id, ValueUpdate::Increase(5.0)).await.unwrap();
    assert_eq!(data.get_entry("deaths").await.unwrap().value, 15.0);

    data.update_entry(entry.id, ValueUpdate::Decrease(0.5)).await.unwrap();
    assert_eq!(data.get_entry("deaths").await.unwrap().value, 14.5);

    let set = data.update_by_name("deaths", ValueUpdate::Set(2.0)).await.unwrap();
    assert_eq!(set.value, 2.0);
  }

  #[tokio::test]
  async fn concurrent_increases_do_not_lose_updates() {
    let (_dir, data) = data().await;
    let id = data.create_entry("hits", 0.0).await.unwrap().id;

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..8 {
      let data = data.clone();
      tasks.spawn(async move { data.update_entry(id, ValueUpdate::Increase(1.0)).await });
    }
    while let Some(joined) = tasks.join_next().await {
      joined.unwrap().unwrap();
    }
    assert_eq!(data.get_entry("hits").await.unwrap().value, 8.0);
  }

  #[tokio::test]
  async fn missing_rows_are_domain_errors() {
    let (_dir, data) = data().await;
    assert!(matches!(data.get_entry("x").await, Err(Error::NotFound(_))));
    assert!(matches!(
      data.update_entry(404, ValueUpdate::Set(1.0)).await,
      Err(Error::IdNotFound(404))
    ));
    assert!(matches!(data.remove_entry("x").await, Err(Error::NotFound(_))));
  }

  #[tokio::test]
  async fn store_failures_surface_as_database_errors() {
    let (_dir, data) = data().await;
    let err = store::post(data.path(), "SELECT missing FROM custom_data", values![])
      .await
      .map_err(Error::from)
      .unwrap_err();

    assert!(matches!(err, Error::Store(store::Error::StatementError(_))), "{err:?}");
    assert!(store::is_database_error(&err));
    assert!(!store::is_database_error(&Error::IdNotFound(1)));
  }

  #[tokio::test]
  async fn duplicate_names_are_rejected_before_writing() {
    let (_dir, data) = data().await;
    data.create_entry("a", 1.0).await.unwrap();
    assert!(matches!(data.create_entry("a", 2.0).await, Err(Error::AlreadyExists(_))));
    assert_eq!(data.list().await.unwrap().len(), 1);
  }
}
