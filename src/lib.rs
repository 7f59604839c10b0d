//! Stage Cycle - cyclical stage-transition engine
//!
//! A finite ordered list of named stages is traversed forever, wrapping
//! from the last stage back to the first. Each stage may transform a
//! shared state value; an observer is told about every committed
//! transition. The engine is stepped manually or driven on a timer by a
//! background Tokio task.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

pub mod cli;
pub mod cycle;
pub mod demo;
pub mod log;

#[cfg(test)]
mod testutil;

// Re-export commonly used types
pub use cycle::config::{EngineConfig, EngineConfigBuilder};
pub use cycle::engine::CycleEngine;
pub use cycle::error::ConfigurationError;
pub use cycle::settings::{CycleSettings, RecordState};
pub use cycle::stage::{ErrorHandler, Observer, StageTransform};
pub use log::{JsonlLogger, TransitionRecord};
