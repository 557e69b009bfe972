pub mod database;
pub mod error;
pub mod profile;
pub mod runner;

pub use database::{Database, LeaderboardRow};
pub use error::{Result, TournamentError};
pub use profile::Profile;
pub use runner::{run_game, run_tournament, GameResult, KingdomResult, TournamentPlan};
