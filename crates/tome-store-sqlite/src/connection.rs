//! Short-lived database handles and raw file operations.
//!
//! A [`Handle`] moves through `opening → open → executing → closing →
//! closed`. [`Handle::close`] consumes the handle, so a handle is closed at
//! most once; [`with_handle`] guarantees it is closed at least once on every
//! exit path that returns.

use std::path::{Path, PathBuf};

use rusqlite::OpenFlags;
use tracing::{debug, warn};

use crate::{Error, Result};

/// How a [`Handle`] opens its file. Neither mode creates a missing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
  ReadOnly,
  ReadWrite,
}

impl OpenMode {
  fn flags(self) -> OpenFlags {
    let base = OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI;
    match self {
      Self::ReadOnly => base | OpenFlags::SQLITE_OPEN_READ_ONLY,
      Self::ReadWrite => base | OpenFlags::SQLITE_OPEN_READ_WRITE,
    }
  }
}

// ─── Handle ──────────────────────────────────────────────────────────────────

/// One open connection to one database file.
pub struct Handle {
  conn: Option<tokio_rusqlite::Connection>,
  path: PathBuf,
  mode: OpenMode,
}

impl Handle {
  /// Open an existing database file. Fails with [`Error::OpenFailure`] if
  /// the file is missing.
  pub async fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
    Self::open_with_flags(path.as_ref(), mode, mode.flags()).await
  }

  async fn open_with_flags(path: &Path, mode: OpenMode, flags: OpenFlags) -> Result<Self> {
    debug!(
      section = "database",
      subsection = "connection",
      path = %path.display(),
      ?mode,
      "opening handle"
    );
    let conn = tokio_rusqlite::Connection::open_with_flags(path, flags)
      .await
      .map_err(|e| Error::from_connection(e, path))?;
    #[cfg(test)]
    probe::record_open();
    Ok(Self { conn: Some(conn), path: path.to_owned(), mode })
  }

  pub fn path(&self) -> &Path { &self.path }

  pub fn mode(&self) -> OpenMode { self.mode }

  /// Run `f` against the connection on its worker thread.
  pub async fn call<R, F>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
    R: Send + 'static,
  {
    let Some(conn) = &self.conn else {
      return Err(Error::Connection(tokio_rusqlite::Error::ConnectionClosed));
    };
    conn
      .call(move |c| f(c).map_err(tokio_rusqlite::Error::from))
      .await
      .map_err(|e| Error::from_connection(e, &self.path))
  }

  /// Close the handle, surfacing any error SQLite reports while doing so.
  pub async fn close(mut self) -> Result<()> {
    let Some(conn) = self.conn.take() else { return Ok(()) };
    debug!(
      section = "database",
      subsection = "connection",
      path = %self.path.display(),
      "closing handle"
    );
    #[cfg(test)]
    probe::record_close();
    conn
      .close()
      .await
      .map_err(|e| Error::from_connection(e, &self.path))
  }
}

impl Drop for Handle {
  fn drop(&mut self) {
    // Dropping the connection stops its worker thread, which releases the
    // SQLite handle; this only happens when a request future is cancelled.
    if self.conn.is_some() {
      warn!(
        section = "database",
        subsection = "connection",
        path = %self.path.display(),
        "handle dropped without being closed"
      );
    }
  }
}

/// Open `path`, run `f` once, and close the handle before returning.
///
/// If `f` fails, its error wins and a close failure is only logged. If `f`
/// succeeds but closing fails, the close failure is returned.
pub(crate) async fn with_handle<R, F>(path: &Path, mode: OpenMode, f: F) -> Result<R>
where
  F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
  R: Send + 'static,
{
  let handle = Handle::open(path, mode).await?;
  let outcome = handle
    .call(move |conn| {
      if mode == OpenMode::ReadWrite {
        conn.pragma_update(None, "foreign_keys", true)?;
      }
      f(conn)
    })
    .await;
  let closed = handle.close().await;

  match (outcome, closed) {
    (Ok(value), Ok(())) => Ok(value),
    (Ok(_), Err(close_err)) => Err(close_err),
    (Err(err), Ok(())) => Err(err),
    (Err(err), Err(close_err)) => {
      warn!(
        section = "database",
        subsection = "connection",
        path = %path.display(),
        error = %close_err,
        "failed to close handle after a failed request"
      );
      Err(err)
    }
  }
}

// ─── Files ───────────────────────────────────────────────────────────────────

/// Whether a database file is present at `path`.
pub async fn exists(path: impl AsRef<Path>) -> Result<bool> {
  let path = path.as_ref();
  tokio::fs::try_exists(path).await.map_err(|e| Error::io(e, path))
}

/// Create the database file if absent and return an open read-write handle.
pub async fn create(path: impl AsRef<Path>) -> Result<Handle> {
  let path = path.as_ref();
  let flags = OpenMode::ReadWrite.flags() | OpenFlags::SQLITE_OPEN_CREATE;
  Handle::open_with_flags(path, OpenMode::ReadWrite, flags).await
}

/// Delete the database file and verify it is really gone.
pub async fn remove(path: impl AsRef<Path>) -> Result<()> {
  let path = path.as_ref();
  tokio::fs::remove_file(path).await.map_err(|e| Error::io(e, path))?;
  // Some platforms report success while the directory entry lingers.
  if exists(path).await? {
    return Err(Error::NotRemoved(path.to_owned()));
  }
  debug!(
    section = "database",
    subsection = "connection",
    path = %path.display(),
    "removed database file"
  );
  Ok(())
}

// ─── Test probe ──────────────────────────────────────────────────────────────

/// Per-thread open/close counters. `#[tokio::test]` runs each test on its own
/// current-thread runtime, so counts never leak between tests.
#[cfg(test)]
pub(crate) mod probe {
  use std::cell::Cell;

  thread_local! {
    static OPENED: Cell<usize> = const { Cell::new(0) };
    static CLOSED: Cell<usize> = const { Cell::new(0) };
  }

  pub(crate) fn record_open() { OPENED.with(|c| c.set(c.get() + 1)); }

  pub(crate) fn record_close() { CLOSED.with(|c| c.set(c.get() + 1)); }

  /// `(opened, closed)` so far on this thread.
  pub(crate) fn counts() -> (usize, usize) {
    (OPENED.with(Cell::get), CLOSED.with(Cell::get))
  }
}
