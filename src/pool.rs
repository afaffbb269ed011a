//! Fixed-size worker pool and per-task completion handles.
//!
//! The pool is the scatter half of an archive operation: the dispatcher
//! submits one closure per entry and receives a [`TaskHandle`] back.
//! Handles are joined in submission order by the session, which is what
//! makes error attribution deterministic regardless of how the OS
//! schedules the workers.
//!
//! The job queue is unbounded. Dispatch never blocks on slow workers; an
//! enormous tree is represented as queued closures, not open files, so the
//! practical cost is bounded by entry metadata rather than content.

use crate::{Error, Result};
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::num::NonZeroUsize;
use std::thread::JoinHandle;

/// Worker count selection for an archive operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Threads {
    /// One worker per available CPU.
    #[default]
    Auto,
    /// Exactly this many workers.
    Count(NonZeroUsize),
    /// One worker; tasks still flow through the pool, just serially.
    Single,
}

impl Threads {
    /// Resolves to a concrete worker count.
    pub fn count(self) -> usize {
        match self {
            Threads::Auto => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            Threads::Count(n) => n.get(),
            Threads::Single => 1,
        }
    }
}

/// What a finished task did with its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The entry was written; its payload carried this many bytes.
    Written {
        /// Uncompressed payload size in bytes.
        bytes: u64,
    },
    /// The entry was left alone: already up to date, or the overwrite
    /// policy excluded it.
    Skipped,
}

struct Job {
    run: Box<dyn FnOnce() -> Result<TaskOutcome> + Send>,
    result: Sender<Result<TaskOutcome>>,
}

/// A handle to one submitted task.
///
/// Joining blocks until the worker finishes the task. If the pool is torn
/// down before the task produces a result (including a panicking task),
/// joining yields [`Error::Cancelled`].
#[derive(Debug)]
pub struct TaskHandle {
    entry: String,
    result: Receiver<Result<TaskOutcome>>,
}

impl TaskHandle {
    /// The archive-relative name of the entry this task processes.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Blocks until the task finishes and returns its outcome.
    pub fn join(self) -> Result<TaskOutcome> {
        match self.result.recv() {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::Cancelled),
        }
    }
}

/// A fixed-size pool of worker threads.
///
/// Workers pull jobs from a shared queue until the pool shuts down.
/// Shutdown drains the queue: every job submitted before the shutdown call
/// still runs, however long that takes.
pub struct WorkerPool {
    jobs: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    size: usize,
}

impl WorkerPool {
    /// Spawns a pool with the given worker count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the OS refuses to spawn a worker thread.
    pub fn new(threads: Threads) -> Result<Self> {
        let size = threads.count();
        let (tx, rx) = unbounded::<Job>();
        let mut workers = Vec::with_capacity(size);
        for index in 0..size {
            let jobs = rx.clone();
            let worker = std::thread::Builder::new()
                .name(format!("parzip-worker-{index}"))
                .spawn(move || {
                    for job in jobs {
                        let outcome = (job.run)();
                        let _ = job.result.send(outcome);
                    }
                })?;
            workers.push(worker);
        }
        Ok(Self {
            jobs: Some(tx),
            workers,
            size,
        })
    }

    /// Returns the number of worker threads.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Queues a task and returns its completion handle.
    ///
    /// Submission never blocks. Submitting after shutdown is not an error;
    /// the returned handle joins as [`Error::Cancelled`].
    pub fn submit<F>(&self, entry: impl Into<String>, task: F) -> TaskHandle
    where
        F: FnOnce() -> Result<TaskOutcome> + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        let job = Job {
            run: Box::new(task),
            result: tx,
        };
        if let Some(sender) = &self.jobs {
            // A failed send means every worker is gone; dropping the job
            // here disconnects the handle, which then joins as Cancelled.
            let _ = sender.send(job);
        }
        TaskHandle {
            entry: entry.into(),
            result: rx,
        }
    }

    /// Shuts the pool down, waiting for all queued jobs to finish.
    ///
    /// Idempotent: later calls return immediately.
    pub fn shutdown(&mut self) {
        self.jobs = None;
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::debug!("worker thread panicked before shutdown");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("shut_down", &self.jobs.is_none())
            .finish()
    }
}
