//! Demo stage transforms
//!
//! A four-stage counting cycle: Mapping and Transformation pass the state
//! through, Iteration increments `count`, and Checking fails once `count`
//! exceeds [`COUNT_LIMIT`], stalling the cycle.

use anyhow::{bail, Result};
use serde_json::Value;

use crate::cycle::config::EngineConfigBuilder;
use crate::cycle::settings::RecordState;

/// Value of `count` above which the Checking stage fails
pub const COUNT_LIMIT: i64 = 5;

/// Stage names of the default demo cycle
pub const DEMO_STAGES: [&str; 4] = ["Mapping", "Iteration", "Checking", "Transformation"];

/// Signature shared by the demo transforms
pub type DemoTransform = fn(&RecordState) -> Result<Option<RecordState>>;

fn mapping(_state: &RecordState) -> Result<Option<RecordState>> {
    Ok(None)
}

fn iteration(state: &RecordState) -> Result<Option<RecordState>> {
    let mut next = state.clone();
    next.insert("count".to_string(), Value::from(count(state) + 1));
    Ok(Some(next))
}

fn checking(state: &RecordState) -> Result<Option<RecordState>> {
    if count(state) > COUNT_LIMIT {
        bail!("Count exceeded limit!");
    }
    Ok(None)
}

fn transformation(state: &RecordState) -> Result<Option<RecordState>> {
    Ok(Some(state.clone()))
}

fn count(state: &RecordState) -> i64 {
    state.get("count").and_then(Value::as_i64).unwrap_or(0)
}

/// The demo transforms keyed by stage name
#[must_use]
pub fn demo_transforms() -> [(&'static str, DemoTransform); 4] {
    [
        ("Mapping", mapping),
        ("Iteration", iteration),
        ("Checking", checking),
        ("Transformation", transformation),
    ]
}

/// Register every demo transform whose stage is part of `stages`
#[must_use]
pub fn register_demo_transforms(
    mut builder: EngineConfigBuilder<RecordState>,
    stages: &[String],
) -> EngineConfigBuilder<RecordState> {
    for (stage, transform) in demo_transforms() {
        if stages.iter().any(|s| s == stage) {
            builder = builder.transform(stage, transform);
        }
    }
    builder
}
