//! Runtime configuration, read from `tome.toml` and `TOME_*` variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
  /// Directory holding one database file per feature.
  pub data_dir:       PathBuf,
  /// Seed a newly created leaderboard with demo rows.
  pub seed_demo_data: bool,
}

impl CliConfig {
  /// Layer the optional TOML file at `path` under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("data_dir", "~/.tome")?
      .set_default("seed_demo_data", true)?
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("TOME"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise CliConfig")?;
    cfg.data_dir = expand_tilde(&cfg.data_dir);
    Ok(cfg)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("tome.toml");
    std::fs::write(&file, "data_dir = \"/srv/tome\"\nseed_demo_data = false\n").unwrap();

    let cfg = CliConfig::load(&file).unwrap();
    assert_eq!(cfg.data_dir, PathBuf::from("/srv/tome"));
    assert!(!cfg.seed_demo_data);
  }

  #[test]
  fn missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = CliConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert!(cfg.seed_demo_data);
    assert!(cfg.data_dir.ends_with(".tome"));
  }

  #[test]
  fn tilde_only_expands_as_prefix() {
    assert_eq!(expand_tilde(Path::new("/a/~/b")), PathBuf::from("/a/~/b"));
  }
}
