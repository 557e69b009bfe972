pub mod agent;
pub mod host;
pub mod config;
pub mod context;
pub mod ledger;
pub mod region;
pub mod scan;
pub mod danger;
pub mod roles;
pub mod table;
pub mod cache;
pub mod budget;
pub mod development;
pub mod valuation;
pub mod specialists;
pub mod validity;
pub mod scheduler;
pub mod battle;
pub mod planner;
pub mod passive;

#[cfg(test)]
mod tests;

pub use agent::KingdomAi;
pub use config::{ConfigError, PlannerConfig};
pub use host::WorldHost;
pub use passive::PassiveAi;
pub use planner::{Planner, TurnSummary};
