//! CLI output formatting
//!
//! Provides human-readable terminal display for a running cycle.

pub mod display;

pub use display::StageDisplay;
