//! Shapes of read and write statements.

use serde::{Deserialize, Serialize};

// ─── Column references ───────────────────────────────────────────────────────

/// A column, optionally qualified with the table it belongs to.
///
/// An unqualified reference is assumed to live on the statement's primary
/// table and is qualified with it once joins make the name ambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
  pub table:  Option<String>,
  pub column: String,
}

impl ColumnRef {
  pub fn new(column: impl Into<String>) -> Self {
    Self { table: None, column: column.into() }
  }

  pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
    Self { table: Some(table.into()), column: column.into() }
  }
}

impl From<&str> for ColumnRef {
  fn from(column: &str) -> Self { Self::new(column) }
}

impl From<String> for ColumnRef {
  fn from(column: String) -> Self { Self::new(column) }
}

impl From<(&str, &str)> for ColumnRef {
  fn from((table, column): (&str, &str)) -> Self { Self::qualified(table, column) }
}

/// One entry of a select list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
  Column {
    column: ColumnRef,
    alias:  Option<String>,
  },
  /// A raw SQL expression; it always needs a name to be addressable.
  Expression { sql: String, alias: String },
}

impl Selection {
  pub fn column(column: impl Into<ColumnRef>) -> Self {
    Self::Column { column: column.into(), alias: None }
  }

  pub fn aliased(column: impl Into<ColumnRef>, alias: impl Into<String>) -> Self {
    Self::Column {
      column: column.into(),
      alias:  Some(alias.into()),
    }
  }

  pub fn expression(sql: impl Into<String>, alias: impl Into<String>) -> Self {
    Self::Expression { sql: sql.into(), alias: alias.into() }
  }
}

impl From<&str> for Selection {
  fn from(column: &str) -> Self { Self::column(column) }
}

impl From<ColumnRef> for Selection {
  fn from(column: ColumnRef) -> Self { Self::column(column) }
}

// ─── Predicates ──────────────────────────────────────────────────────────────

/// The `WHERE` clause of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Filter {
  /// `column=?`, bound to one positional parameter.
  Equals(ColumnRef),
  /// Verbatim predicate text, placeholders included.
  Raw(String),
}

impl Filter {
  pub fn equals(column: impl Into<ColumnRef>) -> Self { Self::Equals(column.into()) }

  pub fn raw(sql: impl Into<String>) -> Self { Self::Raw(sql.into()) }
}

// ─── Select options ──────────────────────────────────────────────────────────

/// `INNER JOIN table ON table.column = <primary>.this_column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerJoin {
  pub table:       String,
  pub column:      String,
  pub this_column: String,
}

impl InnerJoin {
  pub fn new(
    table: impl Into<String>,
    column: impl Into<String>,
    this_column: impl Into<String>,
  ) -> Self {
    Self {
      table:       table.into(),
      column:      column.into(),
      this_column: this_column.into(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Order {
  Asc,
  Desc,
}

impl Order {
  pub fn as_sql(self) -> &'static str {
    match self {
      Self::Asc => "ASC",
      Self::Desc => "DESC",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
  pub column: ColumnRef,
  pub order:  Order,
}

impl OrderBy {
  pub fn asc(column: impl Into<ColumnRef>) -> Self {
    Self { column: column.into(), order: Order::Asc }
  }

  pub fn desc(column: impl Into<ColumnRef>) -> Self {
    Self { column: column.into(), order: Order::Desc }
  }
}

/// `LIMIT n [OFFSET m]`. An offset only exists alongside a limit. Values
/// above `i64::MAX` render as `i64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
  pub limit:  u64,
  pub offset: Option<u64>,
}

impl Page {
  pub fn new(limit: u64) -> Self { Self { limit, offset: None } }

  pub fn offset(mut self, offset: u64) -> Self {
    self.offset = Some(offset);
    self
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOptions {
  pub inner_joins: Vec<InnerJoin>,
  pub filter:      Option<Filter>,
  pub unique:      bool,
  pub order_by:    Vec<OrderBy>,
  pub page:        Option<Page>,
}

impl SelectOptions {
  pub fn new() -> Self { Self::default() }

  pub fn join(mut self, join: InnerJoin) -> Self {
    self.inner_joins.push(join);
    self
  }

  pub fn filter(mut self, filter: Filter) -> Self {
    self.filter = Some(filter);
    self
  }

  pub fn distinct(mut self) -> Self {
    self.unique = true;
    self
  }

  pub fn order_by(mut self, order: OrderBy) -> Self {
    self.order_by.push(order);
    self
  }

  pub fn page(mut self, page: Page) -> Self {
    self.page = Some(page);
    self
  }
}

// ─── Updates ─────────────────────────────────────────────────────────────────

/// One `SET` entry. Relative variants are evaluated by SQLite itself, so
/// there is no read-modify-write window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "column", rename_all = "snake_case")]
pub enum Assignment {
  /// `column=?`
  Set(String),
  /// `column = column + ?`
  Increase(String),
  /// `column = column - ?`
  Decrease(String),
}

impl Assignment {
  pub fn column(&self) -> &str {
    match self {
      Self::Set(c) | Self::Increase(c) | Self::Decrease(c) => c,
    }
  }
}

impl From<&str> for Assignment {
  fn from(column: &str) -> Self { Self::Set(column.to_owned()) }
}
