//! Bounded worker pool for independent satisfiability queries.
//!
//! The per-cell queries of one inference pass all read the same formula
//! snapshot, so they can run on separate threads without changing results.
//! Answers are returned in submission order regardless of completion order.
//!
//! Every wait is bounded by the query timeout: if no answer arrives within
//! the ceiling, the whole batch fails with [`ExecutionError::Timeout`] and the
//! caller discards it. Queued queries of an abandoned batch are skipped; a
//! query already running finishes and its reply is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use serde::{Deserialize, Serialize};

use crate::clause::{FormulaSnapshot, Literal};
use crate::error::ExecutionError;

use super::SatBackend;

/// Pool configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPoolConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Maximum queued queries.
    pub queue_capacity: usize,
    /// Ceiling for a single satisfiability query.
    pub timeout: Duration,
}

impl Default for QueryPoolConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            queue_capacity: 256,
            timeout: Duration::from_secs(3600),
        }
    }
}

type Reply = (usize, Result<bool, ExecutionError>);

struct QueryJob {
    index: usize,
    formula: FormulaSnapshot,
    assumptions: Vec<Literal>,
    cancelled: Arc<AtomicBool>,
    reply: Sender<Reply>,
}

/// Marks a batch as finished when `solve_all` returns, whatever the outcome.
struct BatchGuard(Arc<AtomicBool>);

impl Drop for BatchGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Worker threads answering satisfiability queries.
pub struct QueryPool {
    tx: Sender<QueryJob>,
    workers: Vec<JoinHandle<()>>,
    timeout: Duration,
    backend_name: &'static str,
}

impl std::fmt::Debug for QueryPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryPool")
            .field("backend", &self.backend_name)
            .field("workers", &self.workers.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl QueryPool {
    /// Spawns the workers.
    ///
    /// # Errors
    /// [`ExecutionError::WorkerUnavailable`] if a thread cannot be spawned.
    pub fn start(backend: Arc<dyn SatBackend>, config: QueryPoolConfig) -> Result<Self, ExecutionError> {
        let workers = config.workers.max(1);
        let (tx, rx) = bounded::<QueryJob>(config.queue_capacity.max(1));
        let backend_name = backend.name();

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let rx: Receiver<QueryJob> = rx.clone();
            let backend = Arc::clone(&backend);
            let handle = thread::Builder::new()
                .name(format!("envelope-query-{idx}"))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        if job.cancelled.load(Ordering::Acquire) {
                            continue;
                        }
                        let result = backend.solve(&job.formula, &job.assumptions);
                        // The batch may have been abandoned after a timeout.
                        let _ = job.reply.send((job.index, result));
                    }
                })
                .map_err(|e| ExecutionError::WorkerUnavailable {
                    reason: format!("failed to spawn query worker {idx}: {e}"),
                })?;
            handles.push(handle);
        }

        tracing::debug!(workers, backend = backend_name, "query pool started");
        Ok(Self {
            tx,
            workers: handles,
            timeout: config.timeout,
            backend_name,
        })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Ceiling applied to every wait.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Decides `formula ∧ q` for every assumption set `q`, preserving order.
    ///
    /// # Errors
    /// The first backend error, or [`ExecutionError::Timeout`] when no answer
    /// arrives within the ceiling. No partial answers are returned.
    pub fn solve_all(
        &self,
        formula: &FormulaSnapshot,
        queries: Vec<Vec<Literal>>,
    ) -> Result<Vec<bool>, ExecutionError> {
        let total = queries.len();
        let (reply_tx, reply_rx) = unbounded::<Reply>();
        let batch = BatchGuard(Arc::new(AtomicBool::new(false)));

        for (index, assumptions) in queries.into_iter().enumerate() {
            let job = QueryJob {
                index,
                formula: formula.clone(),
                assumptions,
                cancelled: Arc::clone(&batch.0),
                reply: reply_tx.clone(),
            };
            self.tx.send_timeout(job, self.timeout).map_err(|err| match err {
                SendTimeoutError::Timeout(_) => self.timeout_error(),
                SendTimeoutError::Disconnected(_) => ExecutionError::WorkerUnavailable {
                    reason: "query queue closed".to_string(),
                },
            })?;
        }
        drop(reply_tx);

        let mut answers: Vec<Option<bool>> = vec![None; total];
        for _ in 0..total {
            let (index, result) = reply_rx.recv_timeout(self.timeout).map_err(|err| match err {
                RecvTimeoutError::Timeout => self.timeout_error(),
                RecvTimeoutError::Disconnected => ExecutionError::WorkerUnavailable {
                    reason: "query worker exited".to_string(),
                },
            })?;
            answers[index] = Some(result.map_err(|err| match err {
                ExecutionError::Timeout { .. } => self.timeout_error(),
                other => other,
            })?);
        }

        answers
            .into_iter()
            .map(|answer| {
                answer.ok_or_else(|| ExecutionError::WorkerUnavailable {
                    reason: "missing query answer".to_string(),
                })
            })
            .collect()
    }

    /// Decides a single query.
    ///
    /// # Errors
    /// Same as [`QueryPool::solve_all`].
    pub fn solve_one(&self, formula: &FormulaSnapshot, assumptions: Vec<Literal>) -> Result<bool, ExecutionError> {
        let answers = self.solve_all(formula, vec![assumptions])?;
        answers.first().copied().ok_or_else(|| ExecutionError::WorkerUnavailable {
            reason: "missing query answer".to_string(),
        })
    }

    fn timeout_error(&self) -> ExecutionError {
        ExecutionError::Timeout {
            duration_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    fn shutdown(&mut self) {
        // Closing the queue lets workers skip cancelled jobs, then exit.
        let tx = std::mem::replace(&mut self.tx, bounded::<QueryJob>(1).0);
        drop(tx);
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        tracing::debug!(backend = self.backend_name, "query pool stopped");
    }
}

impl Drop for QueryPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
