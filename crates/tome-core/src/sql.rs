//! SQL statement builder.
//!
//! Every function here turns a structural description into SQLite-flavoured
//! SQL text. Values are never interpolated: data always travels as positional
//! `?` parameters, in the order the placeholders appear. Identifiers are
//! written verbatim and are expected to be developer-controlled constants.

use crate::{
  query::{Assignment, ColumnRef, Filter, OrderBy, SelectOptions, Selection},
  schema::{Column, Index, Table, View},
};

/// Alias of the single column returned by [`exists`].
pub const EXISTS_COLUMN: &str = "exists_value";

// ─── Fragments ───────────────────────────────────────────────────────────────

fn column_ref(column: &ColumnRef, primary: &str, qualify: bool) -> String {
  match (&column.table, qualify) {
    (Some(table), _) => format!("{table}.{}", column.column),
    (None, true) => format!("{primary}.{}", column.column),
    (None, false) => column.column.clone(),
  }
}

fn selection(sel: &Selection, primary: &str, qualify: bool) -> String {
  match sel {
    Selection::Column { column, alias: None } => column_ref(column, primary, qualify),
    Selection::Column { column, alias: Some(alias) } => {
      format!("{} AS {alias}", column_ref(column, primary, qualify))
    }
    Selection::Expression { sql, alias } => format!("{sql} AS {alias}"),
  }
}

fn order_list(order: &[OrderBy], primary: &str, qualify: bool) -> String {
  order
    .iter()
    .map(|o| format!("{} {}", column_ref(&o.column, primary, qualify), o.order.as_sql()))
    .collect::<Vec<_>>()
    .join(", ")
}

fn where_clause(filter: Option<&Filter>, primary: &str, qualify: bool) -> String {
  match filter {
    None => String::new(),
    Some(Filter::Equals(column)) => {
      format!(" WHERE {}=?", column_ref(column, primary, qualify))
    }
    Some(Filter::Raw(sql)) => format!(" WHERE {sql}"),
  }
}

fn if_not_exists(flag: bool) -> &'static str {
  if flag { "IF NOT EXISTS " } else { "" }
}

fn if_exists(flag: bool) -> &'static str {
  if flag { "IF EXISTS " } else { "" }
}

// ─── DML ─────────────────────────────────────────────────────────────────────

/// `SELECT [DISTINCT] cols FROM table [joins] [WHERE] [ORDER BY] [LIMIT]`.
///
/// Unqualified columns are qualified with `table` once any join is present.
/// An empty column list selects `*`.
pub fn select(table: &str, columns: &[Selection], options: &SelectOptions) -> String {
  let qualify = !options.inner_joins.is_empty();

  let mut sql = String::from("SELECT ");
  if options.unique {
    sql.push_str("DISTINCT ");
  }
  if columns.is_empty() {
    sql.push('*');
  } else {
    let list = columns
      .iter()
      .map(|c| selection(c, table, qualify))
      .collect::<Vec<_>>()
      .join(", ");
    sql.push_str(&list);
  }
  sql.push_str(" FROM ");
  sql.push_str(table);

  for join in &options.inner_joins {
    sql.push_str(&format!(
      " INNER JOIN {t} ON {t}.{c} = {table}.{this}",
      t = join.table,
      c = join.column,
      this = join.this_column,
    ));
  }

  sql.push_str(&where_clause(options.filter.as_ref(), table, qualify));

  if !options.order_by.is_empty() {
    sql.push_str(" ORDER BY ");
    sql.push_str(&order_list(&options.order_by, table, qualify));
  }

  if let Some(page) = options.page {
    sql.push_str(&format!(" LIMIT {}", clamp_to_integer(page.limit)));
    if let Some(offset) = page.offset {
      sql.push_str(&format!(" OFFSET {}", clamp_to_integer(offset)));
    }
  }

  sql
}

/// SQLite reads integer literals above `i64::MAX` as REAL, which `LIMIT` and
/// `OFFSET` reject.
fn clamp_to_integer(n: u64) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

/// `INSERT INTO table(c1,c2) VALUES(?,?)`; parameters follow column order.
pub fn insert(table: &str, columns: &[&str]) -> String {
  let placeholders = vec!["?"; columns.len()].join(",");
  format!("INSERT INTO {table}({}) VALUES({placeholders})", columns.join(","))
}

/// `UPDATE table SET ... [WHERE]`. Parameters: one per assignment, in
/// order, then the filter's parameters.
pub fn update(table: &str, assignments: &[Assignment], filter: Option<&Filter>) -> String {
  let set = assignments
    .iter()
    .map(|a| match a {
      Assignment::Set(c) => format!("{c}=?"),
      Assignment::Increase(c) => format!("{c} = {c} + ?"),
      Assignment::Decrease(c) => format!("{c} = {c} - ?"),
    })
    .collect::<Vec<_>>()
    .join(", ");
  format!("UPDATE {table} SET {set}{}", where_clause(filter, table, false))
}

/// `DELETE FROM table [WHERE]`.
pub fn remove(table: &str, filter: Option<&Filter>) -> String {
  format!("DELETE FROM {table}{}", where_clause(filter, table, false))
}

/// `SELECT EXISTS(SELECT 1 FROM table [WHERE]) AS exists_value`.
///
/// SQLite returns the result as an integer, `0` or `1`.
pub fn exists(table: &str, filter: Option<&Filter>) -> String {
  format!(
    "SELECT EXISTS(SELECT 1 FROM {table}{}) AS {EXISTS_COLUMN}",
    where_clause(filter, table, false)
  )
}

/// `ROW_NUMBER() OVER (ORDER BY ...)`, for use as a view column.
///
/// The ordering given here defines rank; paginated reads of the view must
/// order by exactly the same list.
pub fn row_number_over(order: &[OrderBy]) -> String {
  format!("ROW_NUMBER() OVER (ORDER BY {})", order_list(order, "", false))
}

// ─── DDL ─────────────────────────────────────────────────────────────────────

fn column_definition(column: &Column, emit_primary_key: bool) -> String {
  let mut def = format!("{} {}", column.name, column.kind.as_sql());
  if column.options.not_null {
    def.push_str(" NOT NULL");
  }
  if column.options.unique {
    def.push_str(" UNIQUE");
  }
  if emit_primary_key && column.options.primary_key {
    def.push_str(" PRIMARY KEY");
  }
  def
}

/// `CREATE TABLE [IF NOT EXISTS] table (...)`.
///
/// `PRIMARY KEY` is emitted only when exactly one column declares it;
/// composite keys are not supported. Foreign keys are rendered as trailing
/// table constraints in column order.
pub fn create_table(table: &Table, if_not_exists_flag: bool) -> String {
  let single_key = table.primary_key().is_some();

  let mut parts: Vec<String> = table
    .columns
    .iter()
    .map(|c| column_definition(c, single_key))
    .collect();

  for column in &table.columns {
    let Some(fk) = &column.foreign_key else { continue };
    let mut clause = format!(
      "FOREIGN KEY ({}) REFERENCES {}({})",
      column.name, fk.table, fk.column
    );
    if let Some(action) = fk.on_delete {
      clause.push_str(&format!(" ON DELETE {}", action.as_sql()));
    }
    if let Some(action) = fk.on_update {
      clause.push_str(&format!(" ON UPDATE {}", action.as_sql()));
    }
    parts.push(clause);
  }

  format!(
    "CREATE TABLE {}{} ({})",
    if_not_exists(if_not_exists_flag),
    table.name,
    parts.join(", ")
  )
}

pub fn drop_table(name: &str, if_exists_flag: bool) -> String {
  format!("DROP TABLE {}{name}", if_exists(if_exists_flag))
}

/// `CREATE VIEW [IF NOT EXISTS] view AS SELECT ...`.
pub fn create_view(view: &View, if_not_exists_flag: bool) -> String {
  format!(
    "CREATE VIEW {}{} AS {}",
    if_not_exists(if_not_exists_flag),
    view.name,
    select(&view.table, &view.columns, &view.options)
  )
}

pub fn drop_view(name: &str, if_exists_flag: bool) -> String {
  format!("DROP VIEW {}{name}", if_exists(if_exists_flag))
}

/// `CREATE [UNIQUE] INDEX [IF NOT EXISTS] name ON table(cols) [WHERE ...]`.
pub fn create_index(index: &Index, if_not_exists_flag: bool) -> String {
  let mut sql = format!(
    "CREATE {}INDEX {}{} ON {}({})",
    if index.unique { "UNIQUE " } else { "" },
    if_not_exists(if_not_exists_flag),
    index.name,
    index.table,
    index.columns.join(",")
  );
  if let Some(predicate) = &index.predicate {
    sql.push_str(" WHERE ");
    sql.push_str(predicate);
  }
  sql
}

pub fn drop_index(name: &str, if_exists_flag: bool) -> String {
  format!("DROP INDEX {}{name}", if_exists(if_exists_flag))
}
