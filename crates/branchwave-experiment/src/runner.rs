// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Runs a [`CableSolver`] on a dedicated worker thread with an optional
//! wall-clock limit.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use branchwave_analysis::TimeSeries;
use crossbeam::channel::{bounded, RecvTimeoutError};
use tracing::{debug, info, warn};

use crate::error::{SolverError, SolverResult};
use crate::solver::{CableSolver, CancellationToken, SolveRequest};

/// Wraps a solver with timeout, cancellation and output checks
#[derive(Clone)]
pub struct SolverRunner {
    solver: Arc<dyn CableSolver>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for SolverRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverRunner")
            .field("solver", &self.solver.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SolverRunner {
    /// Runner that waits indefinitely
    pub fn new(solver: Arc<dyn CableSolver>) -> Self {
        Self {
            solver,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// `0` means no limit, as in `solver.timeout_secs`
    pub fn with_timeout_secs(self, secs: u64) -> Self {
        if secs == 0 {
            Self {
                timeout: None,
                ..self
            }
        } else {
            self.with_timeout(Duration::from_secs(secs))
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Solve with a fresh cancellation token
    pub fn run(&self, request: SolveRequest) -> SolverResult<TimeSeries> {
        self.run_with_token(request, &CancellationToken::new())
    }

    /// Solve on a worker thread; `cancel` is tripped when the limit expires.
    ///
    /// A timed-out worker is detached, not joined: it is expected to notice
    /// the token and return on its own.
    pub fn run_with_token(
        &self,
        request: SolveRequest,
        cancel: &CancellationToken,
    ) -> SolverResult<TimeSeries> {
        let expected_channels = request.cell_count;
        let solver = Arc::clone(&self.solver);
        let worker_cancel = cancel.clone();
        let (tx, rx) = bounded(1);

        info!(
            "[SOLVER] Starting {}: {} cells, {} edges, {} paced, duration {}",
            self.solver.name(),
            request.cell_count,
            request.edges.len(),
            request.paced_cells.len(),
            request.duration
        );
        let started = Instant::now();

        let handle = thread::Builder::new()
            .name(format!("solver-{}", self.solver.name()))
            .spawn(move || {
                let result = solver.solve(&request, &worker_cancel);
                // Receiver is gone after a timeout
                let _ = tx.send(result);
            })
            .map_err(|e| SolverError::Failed(format!("failed to spawn solver thread: {}", e)))?;

        let received = match self.timeout {
            Some(limit) => rx.recv_timeout(limit),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        let result = match received {
            Ok(result) => {
                if handle.join().is_err() {
                    return Err(SolverError::Panicked);
                }
                result
            }
            Err(RecvTimeoutError::Timeout) => {
                cancel.cancel();
                let after = self.timeout.unwrap_or_default();
                warn!(
                    "[SOLVER] {} exceeded {:?}; cancellation requested",
                    self.solver.name(),
                    after
                );
                return Err(SolverError::TimedOut { after });
            }
            // Sender dropped without a result: the worker unwound
            Err(RecvTimeoutError::Disconnected) => {
                return match handle.join() {
                    Err(_) => {
                        warn!("[SOLVER] {} panicked", self.solver.name());
                        Err(SolverError::Panicked)
                    }
                    Ok(()) => Err(SolverError::Failed(
                        "solver thread exited without a result".to_string(),
                    )),
                };
            }
        };

        let series = result?;
        if series.channel_count() != expected_channels {
            return Err(SolverError::InvalidOutput(format!(
                "expected {} channels (one per cell), got {}",
                expected_channels,
                series.channel_count()
            )));
        }
        if series.sample_count() == 0 {
            return Err(SolverError::InvalidOutput("no samples".to_string()));
        }

        debug!(
            "[SOLVER] {} finished in {:?} with {} samples",
            self.solver.name(),
            started.elapsed(),
            series.sample_count()
        );
        Ok(series)
    }
}
