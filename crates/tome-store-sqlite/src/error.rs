//! Error type for `tome-store-sqlite`.
//!
//! Driver failures are normalised into a small taxonomy. Only
//! [`Error::ConstraintViolation`] and [`Error::StatementError`] count as
//! "database errors" in the sense of [`Error::is_database_error`]: the data
//! conflicted, or the statement itself is wrong. Everything else means the
//! infrastructure is broken.

use std::path::{Path, PathBuf};

use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A write was rejected by a UNIQUE, NOT NULL, CHECK or FOREIGN KEY rule.
  #[error("constraint violation: {0}")]
  ConstraintViolation(#[source] rusqlite::Error),

  /// Malformed SQL, unknown table/column, or a parameter/column mismatch.
  #[error("statement error: {0}")]
  StatementError(#[source] rusqlite::Error),

  #[error("failed to open database {path:?}: {source}")]
  OpenFailure {
    path:   PathBuf,
    source: rusqlite::Error,
  },

  #[error("driver misuse: {0}")]
  MisuseFailure(#[source] rusqlite::Error),

  /// Any other driver failure (busy, locked, read-only, I/O, ...).
  #[error("database error: {0}")]
  Driver(#[source] rusqlite::Error),

  /// The connection worker thread went away.
  #[error("connection error: {0}")]
  Connection(#[source] tokio_rusqlite::Error),

  #[error("failed to close database {path:?}: {source}")]
  CloseFailure {
    path:   PathBuf,
    source: rusqlite::Error,
  },

  #[error("io error on {path:?}: {source}")]
  Io {
    path:   PathBuf,
    source: std::io::Error,
  },

  #[error("database file {0:?} is still present after removal")]
  NotRemoved(PathBuf),

  #[error("expected exactly one version row in {path:?}, found {found}")]
  VersionRowCount { path: PathBuf, found: usize },
}

impl Error {
  /// True for data conflicts and statement errors, false for anything that
  /// indicates broken infrastructure.
  pub fn is_database_error(&self) -> bool {
    matches!(self, Self::ConstraintViolation(_) | Self::StatementError(_))
  }

  pub(crate) fn from_driver(error: rusqlite::Error, path: &Path) -> Self {
    use rusqlite::Error as E;

    // Prepare-time failures carry their code inside `SqlInputError`, which
    // `sqlite_error_code` does not look into.
    let code = match &error {
      E::SqlInputError { error: inner, .. } => Some(inner.code),
      other => other.sqlite_error_code(),
    };

    match code {
      Some(ErrorCode::ConstraintViolation) => Self::ConstraintViolation(error),
      // SQLITE_ERROR: syntax errors, missing tables and columns.
      Some(ErrorCode::Unknown) => Self::StatementError(error),
      Some(ErrorCode::ApiMisuse) => Self::MisuseFailure(error),
      Some(ErrorCode::CannotOpen | ErrorCode::NotADatabase) => {
        Self::OpenFailure { path: path.to_owned(), source: error }
      }
      Some(_) => Self::Driver(error),
      None => match error {
        E::InvalidParameterCount(..)
        | E::InvalidParameterName(_)
        | E::InvalidColumnIndex(_)
        | E::InvalidColumnName(_)
        | E::InvalidColumnType(..)
        | E::MultipleStatement
        | E::ExecuteReturnedResults => Self::StatementError(error),
        other => Self::Driver(other),
      },
    }
  }

  pub(crate) fn from_connection(error: tokio_rusqlite::Error, path: &Path) -> Self {
    match error {
      tokio_rusqlite::Error::Rusqlite(e) => Self::from_driver(e, path),
      tokio_rusqlite::Error::Close((_, e)) => {
        Self::CloseFailure { path: path.to_owned(), source: e }
      }
      other => Self::Connection(other),
    }
  }

  pub(crate) fn io(error: std::io::Error, path: &Path) -> Self {
    Self::Io { path: path.to_owned(), source: error }
  }
}

/// Classify an arbitrary error.
///
/// Walks the source chain looking for an [`Error`]; any other error shape
/// answers `false`.
pub fn is_database_error(error: &(dyn std::error::Error + 'static)) -> bool {
  let mut current = Some(error);
  while let Some(e) = current {
    if let Some(store) = e.downcast_ref::<Error>() {
      return store.is_database_error();
    }
    current = e.source();
  }
  false
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
