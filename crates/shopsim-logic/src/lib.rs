//! Pure simulation logic for ShopSim.
//!
//! A small retail business (a basic warehouse, a shop front, a price-driven
//! demand curve, wholesale lots every ten days and installment plans to pay
//! for them) advanced one day at a time. Nothing in this crate reads stdin
//! or prints; decisions come in through [`driver::DecisionSource`] and
//! reports go out through [`driver::Observer`].
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Run constants, JSON loading, validation |
//! | [`decision`] | Per-day operator decision and financing choice |
//! | [`driver`] | Run loop, decision source / observer traits, end-of-run report |
//! | [`engine`] | The ten-step day transition and its summary |
//! | [`error`] | Engine, config and save errors |
//! | [`invariants`] | State and transition checks |
//! | [`noise`] | Seeded and scripted bounded random draws |
//! | [`persistence`] | Versioned bincode save/load, JSON export |
//! | [`policy`] | Scripted and autopilot decision sources |
//! | [`state`] | The ledger: account, stocks, price, offer, debt, day |
//!
//! # Example
//!
//! ```
//! use shopsim_logic::prelude::*;
//!
//! let config = SimConfig::default();
//! let mut engine = DayEngine::seeded(config.clone(), 42).unwrap();
//! let mut state = SimulationState::new(&config);
//!
//! let decision = OperatorDecision::hold(&state).transfer(50.0).price(20.0);
//! let summary = engine.advance(&mut state, &decision).unwrap();
//! assert_eq!(summary.day, 1);
//! assert_eq!(summary.transferred, 50.0);
//! ```

pub mod config;
pub mod decision;
pub mod driver;
pub mod engine;
pub mod error;
pub mod invariants;
pub mod noise;
pub mod persistence;
pub mod policy;
pub mod state;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::config::SimConfig;
    pub use crate::decision::{Financing, OperatorDecision};
    pub use crate::driver::{run, DecisionSource, Observer, RunReport};
    pub use crate::engine::{DayEngine, DaySummary, InstallmentOutcome, OfferOutcome, Step};
    pub use crate::error::EngineError;
    pub use crate::noise::{NoiseSource, ScriptedNoise, SeededNoise};
    pub use crate::state::{Debt, Offer, SimulationState};
}
