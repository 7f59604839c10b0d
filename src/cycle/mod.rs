//! Cycle engine
//!
//! The stage-transition state machine, its configuration and the
//! background driver that steps it on a timer.

pub mod config;
mod driver;
pub mod engine;
pub mod error;
pub mod settings;
pub mod stage;
