//! Shared test utilities
//!
//! Common helpers used across test modules. Only compiled in test builds.

use std::io;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

/// Transitions seen by a [`recording_observer`], as `(state, stage)` pairs
pub type Calls<S> = Arc<Mutex<Vec<(S, String)>>>;

/// Create an observer that records every notification it receives.
#[must_use]
pub fn recording_observer<S>() -> (Calls<S>, impl Fn(&S, &str) + Send + Sync + 'static)
where
    S: Clone + Send + 'static,
{
    let calls: Calls<S> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    let observer = move |state: &S, stage: &str| {
        sink.lock().unwrap().push((state.clone(), stage.to_string()));
    };
    (calls, observer)
}

/// In-memory writer for captured tracing output
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a thread-local subscriber and return its result together
/// with everything that was logged.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let output = String::from_utf8_lossy(&logs.0.lock().unwrap()).into_owned();
    (result, output)
}
