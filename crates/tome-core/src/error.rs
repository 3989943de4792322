//! Error types for `tome-core`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("invalid version {0:?}: expected MAJOR.MINOR.PATCH")]
  InvalidVersion(String),

  #[error("unknown change kind: {0:?}")]
  UnknownChangeKind(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
