//! Transition history as JSON Lines
//!
//! Meant to be called from an observer: every committed transition becomes
//! one line of `transitions.jsonl`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const LOG_FILE_NAME: &str = "transitions.jsonl";

/// One committed transition as seen by the observer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionRecord {
    /// 1-based position in the log
    pub sequence: u64,
    /// Stage the cycle moved to
    pub stage: String,
    /// Wall-clock time the observer saw the transition
    pub timestamp: DateTime<Utc>,
    /// State after the transition, as JSON
    pub state: serde_json::Value,
}

/// Appends [`TransitionRecord`]s to `<dir>/transitions.jsonl`.
///
/// Sequence numbers are per logger and start at 1; a logger opened on an
/// existing file does not continue its numbering.
pub struct JsonlLogger {
    log_path: PathBuf,
    sequence: AtomicU64,
}

impl JsonlLogger {
    /// Open a logger in `log_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Fails when `log_dir` cannot be created.
    pub fn new<P: AsRef<Path>>(log_dir: P) -> Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Cannot create transition log dir {}", log_dir.display()))?;

        Ok(Self {
            log_path: log_dir.join(LOG_FILE_NAME),
            sequence: AtomicU64::new(0),
        })
    }

    /// Write `state` at `stage` as the next record and return it.
    ///
    /// # Errors
    ///
    /// Fails when the state does not serialize to JSON or the append fails.
    pub fn record<S: Serialize>(&self, state: &S, stage: &str) -> Result<TransitionRecord> {
        let state = serde_json::to_value(state).context("State is not representable as JSON")?;
        let record = TransitionRecord {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            stage: stage.to_string(),
            timestamp: Utc::now(),
            state,
        };
        self.append(&record)?;
        Ok(record)
    }

    /// Append one line for `record`.
    ///
    /// # Errors
    ///
    /// I/O failures on the log file.
    pub fn append(&self, record: &TransitionRecord) -> Result<()> {
        let mut line = serde_json::to_string(record).context("Cannot encode transition")?;
        line.push('\n');

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .and_then(|mut file| file.write_all(line.as_bytes()))
            .with_context(|| format!("Cannot append to {}", self.log_path.display()))
    }

    /// Every record in file order. A missing file reads as empty; blank
    /// lines are skipped.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors or on the first line that is not a record.
    pub fn read_all(&self) -> Result<Vec<TransitionRecord>> {
        let content = match fs::read_to_string(&self.log_path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Cannot read {}", self.log_path.display()))
            }
        };

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("Malformed transition at line {}", index + 1))
            })
            .collect()
    }

    /// Path of the `transitions.jsonl` file
    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}
