//! Per-operation task session: dispatch tracking and completion join.
//!
//! Every archive operation opens one [`Session`] over a fresh worker pool,
//! submits a task per entry, and closes the session to collect results.
//! Closing joins handles in submission order: the first failure becomes the
//! operation's error, later failures are logged at debug level, and the
//! pool is always drained and torn down before control returns.

use crate::pool::{TaskOutcome, Threads, WorkerPool};
use crate::{Error, Result};

/// Aggregated counters from a closed session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Tasks that wrote their entry.
    pub entries_written: usize,
    /// Tasks that left their entry alone.
    pub entries_skipped: usize,
    /// Total uncompressed payload bytes across written entries.
    pub bytes_processed: u64,
    /// Worker threads the session ran with.
    pub threads_used: usize,
}

/// One archive operation's worth of submitted tasks.
///
/// The session owns its pool; consuming it with [`close`](Session::close)
/// is the only way to observe task results, which makes double-join
/// unrepresentable. Dropping an unclosed session still drains and joins
/// the pool, so no worker outlives the operation either way.
pub struct Session {
    pool: WorkerPool,
    pending: Vec<crate::pool::TaskHandle>,
}

impl Session {
    /// Opens a session over a fresh pool with the given worker count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when worker threads cannot be spawned.
    pub fn new(threads: Threads) -> Result<Self> {
        Ok(Self {
            pool: WorkerPool::new(threads)?,
            pending: Vec::new(),
        })
    }

    /// Returns the number of worker threads serving this session.
    pub fn threads(&self) -> usize {
        self.pool.size()
    }

    /// Returns the number of tasks submitted so far.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queues a task for the named entry.
    pub fn submit<F>(&mut self, entry: impl Into<String>, task: F)
    where
        F: FnOnce() -> Result<TaskOutcome> + Send + 'static,
    {
        let handle = self.pool.submit(entry, task);
        self.pending.push(handle);
    }

    /// Joins every submitted task and tears the pool down.
    ///
    /// Handles are awaited in submission order, and every handle is
    /// awaited even after a failure, so no queued work is abandoned.
    ///
    /// # Errors
    ///
    /// The first failing task (in submission order) determines the error:
    /// [`Error::Cancelled`] stays as-is, anything else is wrapped in
    /// [`Error::TaskExecution`] with the entry name attached. Later
    /// failures are logged at debug level.
    pub fn close(mut self) -> Result<SessionSummary> {
        let mut summary = SessionSummary {
            threads_used: self.pool.size(),
            ..SessionSummary::default()
        };
        let mut first_error: Option<Error> = None;
        for handle in self.pending.drain(..) {
            let entry = handle.entry().to_string();
            match handle.join() {
                Ok(TaskOutcome::Written { bytes }) => {
                    summary.entries_written += 1;
                    summary.bytes_processed += bytes;
                }
                Ok(TaskOutcome::Skipped) => summary.entries_skipped += 1,
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(match err {
                            Error::Cancelled => Error::Cancelled,
                            other => Error::task(entry, other),
                        });
                    } else {
                        log::debug!("task for entry '{}' failed after the first error: {}", entry, err);
                    }
                }
            }
        }
        self.pool.shutdown();
        match first_error {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("threads", &self.pool.size())
            .field("pending", &self.pending.len())
            .finish()
    }
}
