//! Cycle engine
//!
//! Owns the stage cursor (index, current state, previous state) and
//! performs single-step transitions. Every mutation goes through one lock,
//! held until the observer has been notified, so manual stepping and the
//! background driver never interleave.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::cycle::config::EngineConfig;

/// The mutable part of the engine guarded by the engine lock
pub(crate) struct Cursor<S> {
    pub(crate) index: usize,
    pub(crate) current: S,
    pub(crate) previous: Option<S>,
}

/// State shared between the engine handle and its background driver
pub(crate) struct Core<S> {
    pub(crate) config: EngineConfig<S>,
    cursor: Mutex<Cursor<S>>,
}

impl<S: Clone> Core<S> {
    /// Lock the cursor. A poisoned lock is recovered since the cursor is
    /// always left consistent between field writes.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Cursor<S>> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one transition against an already locked cursor.
    ///
    /// A failing transform stalls: the index stays put and the observer is
    /// not notified.
    pub(crate) fn advance_locked(&self, cursor: &mut Cursor<S>) {
        let stage = &self.config.stages[cursor.index];

        if let Some(transform) = self.config.transforms.get(stage) {
            match transform.apply(&cursor.current) {
                Ok(Some(next)) => {
                    cursor.previous = Some(std::mem::replace(&mut cursor.current, next));
                }
                // Previous state is recorded whenever a transform runs,
                // even when it reports no change.
                Ok(None) => {
                    cursor.previous = Some(cursor.current.clone());
                }
                Err(error) => {
                    self.report_failure(&error, stage, &cursor.current);
                    return;
                }
            }
        }

        cursor.index = (cursor.index + 1) % self.config.stages.len();
        self.notify(cursor);
    }

    fn report_failure(&self, error: &anyhow::Error, stage: &str, state: &S) {
        match &self.config.error_handler {
            Some(handler) => handler.handle(error, stage, state),
            None => {
                let message = format!("{error:#}");
                tracing::error!(stage = %stage, error = %message, "stage transform failed");
            }
        }
    }

    pub(crate) fn notify(&self, cursor: &Cursor<S>) {
        let stage = &self.config.stages[cursor.index];
        self.config.observer.notify(&cursor.current, stage);
    }
}

/// A cyclical stage-transition engine.
///
/// Stages are visited in order and wrap from the last back to the first.
/// The engine can be stepped manually with [`advance`](Self::advance) or
/// driven on a timer with [`start`](Self::start).
pub struct CycleEngine<S> {
    pub(crate) core: Arc<Core<S>>,
    /// Stop signal of the running driver, if any
    pub(crate) driver: Mutex<Option<watch::Sender<bool>>>,
}

impl<S> CycleEngine<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Create an engine from a validated configuration.
    ///
    /// The engine starts at stage index 0 with the initial state and no
    /// previous state.
    #[must_use]
    pub fn new(config: EngineConfig<S>) -> Self {
        let cursor = Cursor {
            index: 0,
            current: config.initial_state.clone(),
            previous: None,
        };
        Self {
            core: Arc::new(Core {
                config,
                cursor: Mutex::new(cursor),
            }),
            driver: Mutex::new(None),
        }
    }

    /// Execute the current stage and move to the next one.
    ///
    /// Never fails outward. A transform error is routed to the error
    /// handler (or logged) and leaves the engine at the same stage.
    pub fn advance(&self) {
        let mut cursor = self.core.lock();
        self.core.advance_locked(&mut cursor);
    }

    /// Replace the current state and notify the observer. The stage index
    /// is not touched.
    pub fn set_state(&self, state: S) {
        let mut cursor = self.core.lock();
        cursor.previous = Some(std::mem::replace(&mut cursor.current, state));
        self.core.notify(&cursor);
    }

    /// Return to stage 0 with a fresh copy of the initial state, stop any
    /// running driver and notify the observer.
    pub fn reset(&self) {
        let mut cursor = self.core.lock();
        cursor.index = 0;
        cursor.previous = None;
        cursor.current = self.core.config.initial_state.clone();
        // Stopping under the cursor lock keeps an in-flight driver tick
        // from advancing past the reset.
        self.stop();
        self.core.notify(&cursor);
    }

    /// Name of the current stage
    #[must_use]
    pub fn current_stage(&self) -> String {
        let cursor = self.core.lock();
        self.core.config.stages[cursor.index].clone()
    }

    /// Index of the current stage, always below the number of stages
    #[must_use]
    pub fn current_stage_index(&self) -> usize {
        self.core.lock().index
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn current_state(&self) -> S {
        self.core.lock().current.clone()
    }

    /// State that was current before the most recent mutation, if any
    #[must_use]
    pub fn previous_state(&self) -> Option<S> {
        self.core.lock().previous.clone()
    }

    /// The ordered stage names
    #[must_use]
    pub fn stages(&self) -> &[String] {
        &self.core.config.stages
    }
}
