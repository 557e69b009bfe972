pub mod types;
pub mod map;
pub mod monsters;
pub mod army;
pub mod economy;
pub mod navigation;
pub mod visibility;
pub mod setup;
pub mod engine;
pub mod error;

#[cfg(test)]
mod tests;

pub use types::*;
pub use army::{Army, Troop};
pub use economy::Funds;
pub use error::{EngineError, Result};
pub use monsters::Monster;
