//! Autonomous run lifecycle
//!
//! A driver is a Tokio task that calls `advance` once per period until its
//! stop signal is raised. The signal is a `watch` channel holding `true`
//! once stopped, so a stop raised while the driver is sleeping or busy is
//! still seen at the next check.

use std::sync::{Arc, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::cycle::engine::{Core, CycleEngine};

impl<S> CycleEngine<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Start driving the cycle in the background.
    ///
    /// A running driver is stopped first, so at most one driver exists per
    /// engine. The period is `interval` if given, otherwise the configured
    /// interval. A zero period starts nothing and returns `None`: the caller
    /// is expected to step with [`advance`](Self::advance).
    ///
    /// A non-zero period needs a Tokio runtime on the calling thread. Without
    /// one the failure is logged, `None` is returned and any running driver
    /// is left alone.
    ///
    /// Each tick runs the transform and the observer synchronously on a
    /// runtime worker while holding the engine lock, so both should return
    /// quickly.
    pub fn start(&self, interval: Option<Duration>) -> Option<JoinHandle<()>> {
        let period = interval.unwrap_or(self.core.config.interval);
        let runtime = if period.is_zero() {
            None
        } else {
            match Handle::try_current() {
                Ok(handle) => Some(handle),
                Err(err) => {
                    tracing::error!(
                        error = %err,
                        "cannot start cycle driver outside a Tokio runtime"
                    );
                    return None;
                }
            }
        };

        let mut slot = self.driver.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = slot.take() {
            tracing::info!("superseding previous cycle driver");
            previous.send_replace(true);
        }

        let Some(runtime) = runtime else {
            tracing::info!("cycle started without an interval, call advance() manually");
            return None;
        };

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = runtime.spawn(drive(Arc::clone(&self.core), period, stop_rx));
        *slot = Some(stop_tx);

        tracing::debug!(period = ?period, "cycle driver started");
        Some(handle)
    }

    /// Signal the running driver to stop. Returns immediately and is a
    /// no-op when nothing is running.
    pub fn stop(&self) {
        let stopped = self
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(stop_tx) = stopped {
            stop_tx.send_replace(true);
            tracing::debug!("cycle driver stop requested");
        }
    }

    /// Whether a background driver is currently registered
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl<S: Clone> Core<S> {
    /// Advance unless a stop was raised. The check happens under the cursor
    /// lock so a `reset` that stops the driver is never followed by a stale
    /// tick.
    fn tick(&self, stop: &watch::Receiver<bool>) -> bool {
        let mut cursor = self.lock();
        if *stop.borrow() {
            return false;
        }
        self.advance_locked(&mut cursor);
        true
    }
}

/// Driver loop. Ends when the stop signal is raised or its sender is
/// dropped together with the engine.
async fn drive<S>(core: Arc<Core<S>>, period: Duration, stop: watch::Receiver<bool>)
where
    S: Clone + Send + Sync + 'static,
{
    let mut signal = stop.clone();
    loop {
        tokio::select! {
            biased;
            _ = signal.wait_for(|stopped| *stopped) => break,
            () = tokio::time::sleep(period) => {
                if !core.tick(&stop) {
                    break;
                }
            }
        }
    }
    tracing::debug!("cycle driver exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::config::EngineConfig;
    use crate::testutil::capture_logs;
    use anyhow::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_engine(interval_ms: u64) -> (Arc<AtomicUsize>, CycleEngine<u32>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let config = EngineConfig::builder(["A"])
            .initial_state(0_u32)
            .observer(|_: &u32, _: &str| {})
            .transform("A", move |n: &u32| -> Result<Option<u32>> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Some(n + 1))
            })
            .interval_ms(interval_ms)
            .build()
            .unwrap();
        (count, CycleEngine::new(config))
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_with_zero_interval_returns_none() {
        let (count, engine) = counting_engine(0);

        assert!(engine.start(None).is_none());
        assert!(!engine.is_running());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(engine.current_state(), 0);
    }

    #[test]
    fn test_explicit_zero_override_beats_configured_interval() {
        let (_, engine) = counting_engine(100);
        assert!(engine.start(Some(Duration::ZERO)).is_none());
        assert!(!engine.is_running());
    }

    #[test]
    fn test_start_outside_runtime_returns_none_and_logs() {
        let (count, engine) = counting_engine(10);

        let (handle, logs) = capture_logs(|| engine.start(None));

        assert!(handle.is_none());
        assert!(!engine.is_running());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(logs.contains("outside a Tokio runtime"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_from_thread_without_runtime_keeps_running_driver() {
        let (count, engine) = counting_engine(100);
        let handle = engine.start(None).unwrap();

        let restarted = std::thread::scope(|scope| {
            scope
                .spawn(|| engine.start(Some(Duration::from_millis(10))).is_some())
                .join()
                .unwrap()
        });
        assert!(!restarted);
        assert!(engine.is_running());

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        engine.stop();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_override_stops_running_driver() {
        let (count, engine) = counting_engine(100);
        let handle = engine.start(None).unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert!(engine.start(Some(Duration::ZERO)).is_none());
        assert!(!engine.is_running());
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_zero_restart_stops_running_driver() {
        let (count, engine) = counting_engine(0);
        let handle = engine.start(Some(Duration::from_millis(100))).unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        assert!(engine.start(None).is_none());
        assert!(!engine.is_running());
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stop_without_driver_is_noop() {
        let (_, engine) = counting_engine(0);
        engine.stop();
        engine.stop();
        assert!(!engine.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_advances_once_per_period() {
        let (count, engine) = counting_engine(100);

        let handle = engine.start(None).unwrap();
        assert!(engine.is_running());

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        engine.stop();
        handle.await.unwrap();
        assert!(!engine.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_override_is_used() {
        let (count, engine) = counting_engine(1000);

        let handle = engine.start(Some(Duration::from_millis(10))).unwrap();
        tokio::time::sleep(Duration::from_millis(55)).await;
        engine.stop();
        handle.await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_driver_without_further_advances() {
        let (count, engine) = counting_engine(100);

        let handle = engine.start(None).unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        engine.stop();
        handle.await.unwrap();
        let after_stop = count.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(after_stop, 1);
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_engine_ends_driver() {
        let (_, engine) = counting_engine(100);
        let handle = engine.start(None).unwrap();

        drop(engine);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_stops_driver() {
        let (count, engine) = counting_engine(100);
        let handle = engine.start(None).unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;

        engine.reset();
        handle.await.unwrap();

        assert!(!engine.is_running());
        assert_eq!(engine.current_state(), 0);
        let after_reset = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_reset);
    }
}
