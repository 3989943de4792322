//! Table, view and index descriptors.
//!
//! Descriptors are declared once by the feature that owns a database and are
//! handed by reference to the setup engine. Nothing here validates its input;
//! a malformed descriptor produces malformed SQL.

use serde::{Deserialize, Serialize};

use crate::query::{SelectOptions, Selection};

// ─── Columns ─────────────────────────────────────────────────────────────────

/// SQLite storage classes accepted in column declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
  Text,
  Numeric,
  Integer,
  Real,
  Blob,
}

impl ColumnType {
  pub fn as_sql(self) -> &'static str {
    match self {
      Self::Text => "TEXT",
      Self::Numeric => "NUMERIC",
      Self::Integer => "INTEGER",
      Self::Real => "REAL",
      Self::Blob => "BLOB",
    }
  }
}

/// Per-column constraints rendered inline in `CREATE TABLE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnOptions {
  pub not_null:    bool,
  pub unique:      bool,
  pub primary_key: bool,
}

/// Referential action for `ON DELETE` / `ON UPDATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyAction {
  NoAction,
  Restrict,
  SetNull,
  SetDefault,
  Cascade,
}

impl ForeignKeyAction {
  pub fn as_sql(self) -> &'static str {
    match self {
      Self::NoAction => "NO ACTION",
      Self::Restrict => "RESTRICT",
      Self::SetNull => "SET NULL",
      Self::SetDefault => "SET DEFAULT",
      Self::Cascade => "CASCADE",
    }
  }
}

/// A single-column foreign key. Multi-column keys are not supported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
  pub table:     String,
  pub column:    String,
  pub on_delete: Option<ForeignKeyAction>,
  pub on_update: Option<ForeignKeyAction>,
}

impl ForeignKey {
  pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
    Self {
      table:     table.into(),
      column:    column.into(),
      on_delete: None,
      on_update: None,
    }
  }

  pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
    self.on_delete = Some(action);
    self
  }

  pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
    self.on_update = Some(action);
    self
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
  pub name:        String,
  pub kind:        ColumnType,
  pub options:     ColumnOptions,
  pub foreign_key: Option<ForeignKey>,
}

impl Column {
  pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
    Self {
      name: name.into(),
      kind,
      options: ColumnOptions::default(),
      foreign_key: None,
    }
  }

  pub fn not_null(mut self) -> Self {
    self.options.not_null = true;
    self
  }

  pub fn unique(mut self) -> Self {
    self.options.unique = true;
    self
  }

  pub fn primary_key(mut self) -> Self {
    self.options.primary_key = true;
    self
  }

  pub fn references(mut self, foreign_key: ForeignKey) -> Self {
    self.foreign_key = Some(foreign_key);
    self
  }
}

// ─── Relations ───────────────────────────────────────────────────────────────

/// A physical relation. Column order is declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
  pub name:    String,
  pub columns: Vec<Column>,
}

impl Table {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), columns: Vec::new() }
  }

  pub fn column(mut self, column: Column) -> Self {
    self.columns.push(column);
    self
  }

  /// The column declared as primary key, if exactly one is.
  pub fn primary_key(&self) -> Option<&Column> {
    let mut keys = self.columns.iter().filter(|c| c.options.primary_key);
    match (keys.next(), keys.next()) {
      (Some(key), None) => Some(key),
      _ => None,
    }
  }
}

/// A read-only relation derived from `table` at query time.
///
/// If the column list contains a ranking expression, any paginated read
/// against the view must order by the same keys the ranking uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
  pub name:    String,
  pub table:   String,
  pub columns: Vec<Selection>,
  pub options: SelectOptions,
}

impl View {
  pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
    Self {
      name:    name.into(),
      table:   table.into(),
      columns: Vec::new(),
      options: SelectOptions::default(),
    }
  }

  pub fn select(mut self, selection: impl Into<Selection>) -> Self {
    self.columns.push(selection.into());
    self
  }

  pub fn options(mut self, options: SelectOptions) -> Self {
    self.options = options;
    self
  }
}

/// A named access path, optionally partial (`WHERE predicate`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
  pub name:      String,
  pub table:     String,
  pub columns:   Vec<String>,
  pub unique:    bool,
  pub predicate: Option<String>,
}

impl Index {
  pub fn new(
    name: impl Into<String>,
    table: impl Into<String>,
    columns: impl IntoIterator<Item = impl Into<String>>,
  ) -> Self {
    Self {
      name:      name.into(),
      table:     table.into(),
      columns:   columns.into_iter().map(Into::into).collect(),
      unique:    false,
      predicate: None,
    }
  }

  pub fn unique(mut self) -> Self {
    self.unique = true;
    self
  }

  pub fn partial(mut self, predicate: impl Into<String>) -> Self {
    self.predicate = Some(predicate.into());
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn primary_key_requires_exactly_one() {
    let none = Table::new("t").column(Column::new("a", ColumnType::Text));
    assert!(none.primary_key().is_none());

    let one = Table::new("t")
      .column(Column::new("id", ColumnType::Integer).primary_key())
      .column(Column::new("a", ColumnType::Text));
    assert_eq!(one.primary_key().map(|c| c.name.as_str()), Some("id"));

    let two = Table::new("t")
      .column(Column::new("a", ColumnType::Integer).primary_key())
      .column(Column::new("b", ColumnType::Integer).primary_key());
    assert!(two.primary_key().is_none());
  }
}
