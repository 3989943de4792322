//! `tome` command-line tool.
//!
//! Reads `tome.toml` (or the path given with `--config`), sets up the
//! feature databases under `data_dir` and runs one command against them.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tome_cli::{
  CliConfig,
  features::{CustomData, Leaderboard, custom_data::ValueUpdate},
};
use tome_core::Page;
use tome_store_sqlite::SetupOutcome;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tome feature databases")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tome.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create or migrate every feature database.
  Setup,
  /// Add to a named counter, creating it if needed.
  Count {
    name: String,
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    by:   i64,
  },
  /// Print the ranked counter leaderboard.
  Leaderboard {
    #[arg(long)]
    limit:  Option<u64>,
    #[arg(long, requires = "limit")]
    offset: Option<u64>,
    /// Emit JSON instead of a table.
    #[arg(long)]
    json:   bool,
  },
  /// Read or change custom data values.
  Data {
    #[command(subcommand)]
    action: DataAction,
  },
  /// Delete a feature's database file.
  Reset { feature: Feature },
}

#[derive(Subcommand)]
enum DataAction {
  Get { name: String },
  List,
  Set { name: String, value: f64 },
  Add {
    name:  String,
    #[arg(allow_negative_numbers = true)]
    delta: f64,
  },
  Remove { name: String },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Feature {
  Leaderboard,
  CustomData,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = CliConfig::load(&cli.config)?;

  tokio::fs::create_dir_all(&cfg.data_dir)
    .await
    .with_context(|| format!("failed to create data directory {:?}", cfg.data_dir))?;

  let mut leaderboard = Leaderboard::new(&cfg.data_dir);
  if cfg.seed_demo_data {
    leaderboard = leaderboard.with_demo_data();
  }
  let custom_data = CustomData::new(&cfg.data_dir);

  match cli.command {
    Command::Setup => {
      let (board_outcome, data_outcome) = setup_all(&leaderboard, &custom_data).await?;
      for (name, outcome) in [("leaderboard", board_outcome), ("custom data", data_outcome)] {
        match (outcome.created, outcome.previous) {
          (true, _) => println!("{name}: created at {}", outcome.version),
          (false, Some(previous)) => {
            println!("{name}: migrated {previous} -> {}", outcome.version)
          }
          (false, None) => println!("{name}: up to date at {}", outcome.version),
        }
      }
    }

    Command::Count { name, by } => {
      setup_all(&leaderboard, &custom_data).await?;
      let entry = leaderboard.count(&name, by).await?;
      println!("{} = {}", entry.name, entry.count);
    }

    Command::Leaderboard { limit, offset, json } => {
      setup_all(&leaderboard, &custom_data).await?;
      let page = limit.map(|l| {
        let page = Page::new(l);
        match offset {
          Some(o) => page.offset(o),
          None => page,
        }
      });
      let rows = leaderboard.ranking(page).await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
      } else {
        for row in rows {
          println!("{:>4}. {:<24} {:>8}", row.rank, row.entry.name, row.entry.count);
        }
      }
    }

    Command::Data { action } => {
      setup_all(&leaderboard, &custom_data).await?;
      match action {
        DataAction::Get { name } => {
          let entry = custom_data.get_entry(&name).await?;
          println!("{} = {}", entry.name, entry.value);
        }
        DataAction::List => {
          for entry in custom_data.list().await? {
            println!("{} = {}", entry.name, entry.value);
          }
        }
        DataAction::Set { name, value } => {
          let entry = if custom_data.exists_entry(&name).await {
            custom_data.update_by_name(&name, ValueUpdate::Set(value)).await?
          } else {
            custom_data.create_entry(&name, value).await?
          };
          println!("{} = {}", entry.name, entry.value);
        }
        DataAction::Add { name, delta } => {
          let update = if delta < 0.0 {
            ValueUpdate::Decrease(-delta)
          } else {
            ValueUpdate::Increase(delta)
          };
          let entry = custom_data.update_by_name(&name, update).await?;
          println!("{} = {}", entry.name, entry.value);
        }
        DataAction::Remove { name } => {
          custom_data.remove_entry(&name).await?;
          println!("removed {name}");
        }
      }
    }

    Command::Reset { feature } => {
      let path = match feature {
        Feature::Leaderboard => leaderboard.path(),
        Feature::CustomData => custom_data.path(),
      };
      tome_store_sqlite::remove(path)
        .await
        .with_context(|| format!("failed to remove {path:?}"))?;
      println!("removed {}", path.display());
    }
  }

  Ok(())
}

/// Set up both databases concurrently. They are independent, so one failing
/// does not hold up the other.
async fn setup_all(
  leaderboard: &Leaderboard,
  custom_data: &CustomData,
) -> anyhow::Result<(SetupOutcome, SetupOutcome)> {
  let (board, data) = tokio::join!(leaderboard.setup(), custom_data.setup());
  Ok((
    board.context("leaderboard setup failed")?,
    data.context("custom data setup failed")?,
  ))
}
