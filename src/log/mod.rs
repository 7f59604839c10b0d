//! Logging and observability
//!
//! This module provides the JSONL transition log that can back an
//! engine observer.

pub mod jsonl;

pub use jsonl::{JsonlLogger, TransitionRecord};
