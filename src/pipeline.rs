//! End-to-end run: source → pool → collector
//!
//! The source, the pool's counting join and the collector run concurrently
//! inside one crossbeam scope. The collector drains on the calling thread
//! while a scoped thread waits for every worker and then closes the result
//! queue.

use anyhow::Result;
use crossbeam::channel::bounded;
use num_bigint::BigUint;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::compute::ComputeError;
use crate::parallel::{
    ResultCollector, PoolSettings, ShutdownListener, ShutdownTrigger, WorkerPool, WorkerReport,
    shutdown,
};
use crate::task::{TaskResult, TaskSource};

/// Outcome of one pipeline run
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Results in task-id order. Complete unless the run was cancelled.
    pub results: Vec<TaskResult>,
    /// Task ids with no result; always empty for a run that was not cancelled
    pub missing: Vec<usize>,
    /// One report per worker, in worker id order
    pub workers: Vec<WorkerReport>,
    pub elapsed: Duration,
    pub cancelled: bool,
}

impl RunReport {
    pub fn anomaly_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_anomaly()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_failure()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Wires a task source, a worker pool and a result collector together
pub struct Pipeline {
    settings: PoolSettings,
    trigger: ShutdownTrigger,
    listener: ShutdownListener,
}

impl Pipeline {
    pub fn new(settings: PoolSettings) -> Self {
        let (trigger, listener) = shutdown::channel();
        Self {
            settings,
            trigger,
            listener,
        }
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Handle for forcing early termination, usable from any thread before or
    /// during [`run`](Self::run)
    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        self.trigger.clone()
    }

    /// Run every task from `source` through the pool and return results in
    /// task-id order.
    ///
    /// # Panics
    /// If a run that was not shut down early ends with a gap, a duplicate or
    /// an out-of-range id. Those mean a broken source or worker.
    pub fn run<F>(self, source: TaskSource, compute: F) -> Result<RunReport>
    where
        F: Fn(i64) -> Result<BigUint, ComputeError> + Send + Sync + 'static,
    {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id);
        let _enter = span.enter();

        let expected = source.len();
        let started = Instant::now();
        let (task_tx, task_rx) = bounded(self.settings.task_buffer());
        let (result_tx, result_rx) = bounded(self.settings.result_buffer());

        tracing::info!(
            "Running {expected} tasks on {} workers",
            self.settings.workers
        );

        let pool = WorkerPool::spawn_with_shutdown(
            &self.settings,
            task_rx,
            result_tx,
            (self.trigger.clone(), self.listener.clone()),
            Arc::new(compute),
        )?;

        let (collected, workers) = crossbeam::thread::scope(|s| -> Result<_> {
            // Producer thread: feed the task queue
            s.spawn(move |_| source.emit(task_tx));

            // Counting join: closes the result queue once every worker is done
            let joiner = s.spawn(move |_| pool.join());

            let collected = ResultCollector::new(expected).drain(&result_rx);
            let workers = joiner
                .join()
                .map_err(|_| anyhow::anyhow!("Pool join thread panicked"))??;

            Ok((collected, workers))
        })
        .map_err(|_| anyhow::anyhow!("Thread panic occurred during pipeline run"))??;

        let cancelled = self.trigger.is_triggered();
        let missing = collected.missing();
        let results = if cancelled {
            collected.into_partial()
        } else {
            collected.into_ordered()
        };

        let report = RunReport {
            run_id,
            results,
            missing,
            workers,
            elapsed: started.elapsed(),
            cancelled,
        };

        tracing::info!(
            "Run finished in {:.2?}: {} results, {} anomalies, {} failures, {} missing",
            report.elapsed,
            report.results.len(),
            report.anomaly_count(),
            report.failure_count(),
            report.missing.len()
        );

        Ok(report)
    }
}
