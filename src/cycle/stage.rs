//! Stage callbacks
//!
//! The engine never interprets state. It hands state to these three seams:
//! per-stage transforms, the observer that is told about every committed
//! transition, and the optional handler for failed transforms.
//!
//! Each trait has a blanket impl for closures of the matching shape, so
//! plain `Fn` values can be registered directly.

use anyhow::Result;

/// Computes the next state for one stage.
///
/// Returning `Ok(None)` means "no change". Returning `Err` stalls the cycle
/// at the current stage.
pub trait StageTransform<S>: Send + Sync {
    /// Run the transform against the current state
    fn apply(&self, state: &S) -> Result<Option<S>>;
}

impl<S, F> StageTransform<S> for F
where
    F: Fn(&S) -> Result<Option<S>> + Send + Sync,
{
    fn apply(&self, state: &S) -> Result<Option<S>> {
        self(state)
    }
}

/// Receives every committed state together with the current stage name.
///
/// Called while the engine lock is held. Calling back into
/// `advance`, `set_state` or `reset` of the same engine deadlocks.
pub trait Observer<S>: Send + Sync {
    /// Notify about a committed transition
    fn notify(&self, state: &S, stage: &str);
}

impl<S, F> Observer<S> for F
where
    F: Fn(&S, &str) + Send + Sync,
{
    fn notify(&self, state: &S, stage: &str) {
        self(state, stage);
    }
}

/// Handles a failed stage transform.
///
/// Receives the error, the stage that failed and the state the transform
/// was given. Must not panic; the engine does not contain handler failures.
pub trait ErrorHandler<S>: Send + Sync {
    /// Handle a stage failure
    fn handle(&self, error: &anyhow::Error, stage: &str, state: &S);
}

impl<S, F> ErrorHandler<S> for F
where
    F: Fn(&anyhow::Error, &str, &S) + Send + Sync,
{
    fn handle(&self, error: &anyhow::Error, stage: &str, state: &S) {
        self(error, stage, state);
    }
}
