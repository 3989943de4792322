//! Named counters with a ranked leaderboard view.
//!
//! Rank is computed by SQLite inside the `counter_leaderboard` view, so a
//! changed count or timestamp is reflected on the next read without any
//! re-ranking step.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tome_core::{
  Assignment, ChangeKind, ChangeRecord, Column, ColumnType, Filter, Index, OrderBy, Page,
  SelectOptions, Selection, Table, Version, View, sql,
};
use tome_store_sqlite::{
  self as store, FromRow, Row, Schema, SetupHooks, SetupOutcome, rusqlite, values,
};
use tracing::info;

pub const DATABASE_FILE: &str = "leaderboard.db";
pub const VERSION: Version = Version::new(0, 0, 1);

const TABLE: &str = "counter";
const VIEW: &str = "counter_leaderboard";

#[derive(Debug, Error)]
pub enum Error {
  #[error("no counter named {0:?}")]
  NotFound(String),

  #[error("a counter named {0:?} already exists")]
  AlreadyExists(String),

  #[error("store request failed")]
  Store(#[from] store::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Schema ──────────────────────────────────────────────────────────────────

/// The ranking order. The view and every paginated read use this same list,
/// otherwise rank and page boundaries disagree.
fn rank_order() -> Vec<OrderBy> {
  vec![OrderBy::desc("count"), OrderBy::asc("timestamp"), OrderBy::asc("name")]
}

fn table() -> Table {
  Table::new(TABLE)
    .column(Column::new("id", ColumnType::Integer).primary_key())
    .column(Column::new("name", ColumnType::Text).not_null().unique())
    .column(Column::new("count", ColumnType::Integer).not_null())
    .column(Column::new("timestamp", ColumnType::Integer).not_null())
}

fn view() -> View {
  View::new(VIEW, TABLE)
    .select("id")
    .select("name")
    .select("count")
    .select("timestamp")
    .select(Selection::expression(sql::row_number_over(&rank_order()), "rank"))
}

pub fn schema() -> Schema {
  Schema::new()
    .table(table())
    .view(view())
    .index(Index::new("counter_count_idx", TABLE, ["count", "timestamp"]))
}

// ─── Rows ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
  pub id:        i64,
  pub name:      String,
  pub count:     i64,
  pub timestamp: i64,
}

const ENTRY_COLUMNS: [&str; 4] = ["id", "name", "count", "timestamp"];

impl FromRow for Entry {
  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      name:      row.get(1)?,
      count:     row.get(2)?,
      timestamp: row.get(3)?,
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked {
  pub rank:  i64,
  #[serde(flatten)]
  pub entry: Entry,
}

/// Columns `rank, id, name, count, timestamp`.
impl FromRow for Ranked {
  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      rank:  row.get(0)?,
      entry: Entry {
        id:        row.get(1)?,
        name:      row.get(2)?,
        count:     row.get(3)?,
        timestamp: row.get(4)?,
      },
    })
  }
}

fn ranked_columns() -> Vec<Selection> {
  std::iter::once("rank").chain(ENTRY_COLUMNS).map(Selection::from).collect()
}

fn entry_columns() -> Vec<Selection> { ENTRY_COLUMNS.map(Selection::from).to_vec() }

// ─── Setup hooks ─────────────────────────────────────────────────────────────

struct Hooks {
  seed: bool,
}

const DEMO_ROWS: [(&str, i64); 3] = [("alice", 3), ("bob", 5), ("carol", 1)];

impl SetupHooks for Hooks {
  async fn setup_initial_data(&self, path: &Path) -> store::Result<Vec<String>> {
    if !self.seed {
      return Ok(Vec::new());
    }
    let now = Utc::now().timestamp_millis();
    let mut lines = Vec::with_capacity(DEMO_ROWS.len());
    for (name, count) in DEMO_ROWS {
      store::post(
        path,
        sql::insert(TABLE, &["name", "count", "timestamp"]),
        values![name.to_owned(), count, now],
      )
      .await?;
      lines.push(format!("seeded counter {name} = {count}"));
    }
    Ok(lines)
  }

  /// The view is the only derived object; rebuild it so its ranking matches
  /// the running code.
  async fn migrate_version(
    &self,
    path: &Path,
    _previous: Version,
    current: Version,
  ) -> store::Result<Vec<ChangeRecord>> {
    store::post(path, sql::drop_view(VIEW, true), values![]).await?;
    store::post(path, sql::create_view(&view(), false), values![]).await?;
    Ok(vec![ChangeRecord {
      name:            VIEW.to_owned(),
      related_version: current,
      kind:            ChangeKind::Updated,
    }])
  }
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// Handle to the leaderboard database inside a data directory.
#[derive(Debug, Clone)]
pub struct Leaderboard {
  path: PathBuf,
  seed: bool,
}

impl Leaderboard {
  pub fn new(data_dir: &Path) -> Self {
    Self { path: data_dir.join(DATABASE_FILE), seed: false }
  }

  /// Seed demo rows when the database is first created.
  pub fn with_demo_data(mut self) -> Self {
    self.seed = true;
    self
  }

  pub fn path(&self) -> &Path { &self.path }

  pub async fn setup(&self) -> Result<SetupOutcome> {
    let hooks = Hooks { seed: self.seed };
    Ok(store::setup(&self.path, &schema(), VERSION, &hooks).await?)
  }

  /// Never fails; an unreadable database answers `false`.
  pub async fn exists_entry(&self, name: &str) -> bool {
    store::check_exists(
      &self.path,
      sql::exists(TABLE, Some(&Filter::equals("name"))),
      values![name.to_owned()],
    )
    .await
  }

  pub async fn create_entry(&self, name: &str, count: i64) -> Result<i64> {
    if self.exists_entry(name).await {
      return Err(Error::AlreadyExists(name.to_owned()));
    }
    let posted = store::post(
      &self.path,
      sql::insert(TABLE, &["name", "count", "timestamp"]),
      values![name.to_owned(), count, Utc::now().timestamp_millis()],
    )
    .await?;
    Ok(posted.last_insert_id)
  }

  pub async fn get_entry(&self, name: &str) -> Result<Entry> {
    let options = SelectOptions::new().filter(Filter::equals("name"));
    store::get_each(
      &self.path,
      sql::select(TABLE, &entry_columns(), &options),
      values![name.to_owned()],
    )
    .await?
    .ok_or_else(|| Error::NotFound(name.to_owned()))
  }

  /// Add `by` to a counter and stamp it with the current time.
  pub async fn add_count(&self, name: &str, by: i64) -> Result<()> {
    self.add_count_at(name, by, Utc::now().timestamp_millis()).await
  }

  pub async fn add_count_at(&self, name: &str, by: i64, timestamp: i64) -> Result<()> {
    let posted = store::post(
      &self.path,
      sql::update(
        TABLE,
        &[Assignment::Increase("count".to_owned()), "timestamp".into()],
        Some(&Filter::equals("name")),
      ),
      values![by, timestamp, name.to_owned()],
    )
    .await?;
    if posted.rows_affected == 0 {
      return Err(Error::NotFound(name.to_owned()));
    }
    Ok(())
  }

  /// Increment a counter, creating it on first use.
  pub async fn count(&self, name: &str, by: i64) -> Result<Entry> {
    if self.exists_entry(name).await {
      self.add_count(name, by).await?;
    } else {
      self.create_entry(name, by).await?;
      info!(counter = name, "created counter");
    }
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

  /// Ranked listing, optionally one page of it.
  pub async fn ranking(&self, page: Option<Page>) -> Result<Vec<Ranked>> {
    let mut options = SelectOptions::new();
    options.order_by = rank_order();
    options.page = page;
    Ok(
      store::get_all(&self.path, sql::select(VIEW, &ranked_columns(), &options), values![])
        .await?,
    )
  }

  pub async fn rank_of(&self, name: &str) -> Result<Ranked> {
    let options = SelectOptions::new().filter(Filter::equals("name"));
    store::get_each(
      &self.path,
      sql::select(VIEW, &ranked_columns(), &options),
      values![name.to_owned()],
    )
    .await?
    .ok_or_else(|| Error::NotFound(name.to_owned()))
  }
}
