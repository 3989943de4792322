//! Semantic schema versions and migration change records.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// The schema version stamped into a database file.
///
/// Ordering compares major, then minor, then patch.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Version {
  pub major: u32,
  pub minor: u32,
  pub patch: u32,
}

impl Version {
  pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
    Self { major, minor, patch }
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
  }
}

impl FromStr for Version {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || Error::InvalidVersion(s.to_owned());
    let mut parts = s.trim().split('.').map(|p| p.parse::<u32>());
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
      (Some(Ok(major)), Some(Ok(minor)), Some(Ok(patch)), None) => {
        Ok(Self::new(major, minor, patch))
      }
      _ => Err(invalid()),
    }
  }
}

/// What a migration did to one named thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
  Added,
  Updated,
  Fixed,
  Removed,
}

impl ChangeKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Added => "added",
      Self::Updated => "updated",
      Self::Fixed => "fixed",
      Self::Removed => "removed",
    }
  }
}

impl FromStr for ChangeKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "added" => Ok(Self::Added),
      "updated" => Ok(Self::Updated),
      "fixed" => Ok(Self::Fixed),
      "removed" => Ok(Self::Removed),
      other => Err(Error::UnknownChangeKind(other.to_owned())),
    }
  }
}

/// A log-only record returned by a migration callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
  pub name:            String,
  pub related_version: Version,
  #[serde(rename = "type")]
  pub kind:            ChangeKind,
}

impl fmt::Display for ChangeRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}] {} ({})", self.kind.as_str(), self.name, self.related_version)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ordering_prioritises_major_then_minor_then_patch() {
    assert!(Version::new(1, 0, 0) > Version::new(0, 9, 9));
    assert!(Version::new(0, 2, 0) > Version::new(0, 1, 7));
    assert!(Version::new(0, 0, 2) > Version::new(0, 0, 1));
    assert_eq!(Version::new(0, 0, 1), Version::new(0, 0, 1));
  }

  #[test]
  fn parse_and_display() {
    let v: Version = "1.12.3".parse().unwrap();
    assert_eq!(v, Version::new(1, 12, 3));
    assert_eq!(v.to_string(), "1.12.3");
  }

  #[test]
  fn parse_rejects_malformed() {
    for bad in ["", "1", "1.2", "1.2.3.4", "a.b.c", "1.-2.3"] {
      assert!(matches!(bad.parse::<Version>(), Err(Error::InvalidVersion(_))), "{bad}");
    }
  }

  #[test]
  fn change_kind_roundtrips_through_str() {
    for kind in [ChangeKind::Added, ChangeKind::Updated, ChangeKind::Fixed, ChangeKind::Removed] {
      assert_eq!(kind.as_str().parse::<ChangeKind>(), Ok(kind));
    }
    assert!("renamed".parse::<ChangeKind>().is_err());
  }
}
