//! Per-feature request modules.

pub mod custom_data;
pub mod leaderboard;

pub use custom_data::CustomData;
pub use leaderboard::Leaderboard;
