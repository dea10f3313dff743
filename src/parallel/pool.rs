use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, Sender};
use num_bigint::BigUint;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::clock::{Clock, MonotonicClock};
use super::history::{AnomalyPolicy, DEFAULT_HISTORY_CAPACITY, ProcessingHistory};
use super::shutdown::{self, ShutdownListener, ShutdownTrigger};
use super::worker::{DelayHook, Worker, WorkerContext, WorkerReport};
use crate::compute::ComputeError;
use crate::task::{Task, TaskResult};

/// Upper bound on task queue slots; crossbeam reserves every slot up front
pub const MAX_CHANNEL_BUFFER: usize = 65_536;

/// Everything needed to start a pool of workers
#[derive(Clone)]
pub struct PoolSettings {
    /// Number of worker threads, at least 1
    pub workers: usize,
    /// Per-worker history capacity
    pub history_capacity: usize,
    pub policy: AnomalyPolicy,
    /// Task queue buffer = workers * multiplier, result queue twice that
    pub channel_buffer_multiplier: usize,
    pub clock: Arc<dyn Clock>,
    pub delay: Option<DelayHook>,
}

impl PoolSettings {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: Self::resolve_workers(workers),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            policy: AnomalyPolicy::default(),
            channel_buffer_multiplier: 2,
            clock: Arc::new(MonotonicClock::new()),
            delay: None,
        }
    }

    /// Available parallelism plus one
    pub fn default_workers() -> usize {
        num_cpus::get() + 1
    }

    /// 0 means auto-detect
    pub fn resolve_workers(configured: usize) -> usize {
        if configured == 0 {
            Self::default_workers()
        } else {
            configured
        }
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_policy(mut self, policy: AnomalyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_channel_buffer_multiplier(mut self, multiplier: usize) -> Self {
        self.channel_buffer_multiplier = multiplier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_delay(mut self, delay: DelayHook) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sleep for `delay` inside every task's timed window
    pub fn with_simulated_delay(self, delay: Duration) -> Self {
        self.with_delay(Arc::new(move || thread::sleep(delay)))
    }

    /// `workers * multiplier`, clamped to `1..=MAX_CHANNEL_BUFFER`
    pub fn task_buffer(&self) -> usize {
        self.workers
            .saturating_mul(self.channel_buffer_multiplier)
            .clamp(1, MAX_CHANNEL_BUFFER)
    }

    pub fn result_buffer(&self) -> usize {
        self.task_buffer() * 2
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Owns worker lifecycle, the shutdown broadcast and the pool's handle on the
/// result queue.
///
/// The result queue closes only after [`join`](Self::join) has seen every
/// worker finish.
pub struct WorkerPool {
    handles: Vec<JoinHandle<WorkerReport>>,
    results: Option<Sender<TaskResult>>,
    shutdown: ShutdownTrigger,
}

impl WorkerPool {
    /// Start `settings.workers` workers with a fresh shutdown channel
    pub fn spawn<F>(
        settings: &PoolSettings,
        tasks: Receiver<Task>,
        results: Sender<TaskResult>,
        compute: Arc<F>,
    ) -> Result<Self>
    where
        F: Fn(i64) -> Result<BigUint, ComputeError> + Send + Sync + 'static,
    {
        Self::spawn_with_shutdown(settings, tasks, results, shutdown::channel(), compute)
    }

    /// Start workers listening on an existing shutdown channel
    pub fn spawn_with_shutdown<F>(
        settings: &PoolSettings,
        tasks: Receiver<Task>,
        results: Sender<TaskResult>,
        (trigger, listener): (ShutdownTrigger, ShutdownListener),
        compute: Arc<F>,
    ) -> Result<Self>
    where
        F: Fn(i64) -> Result<BigUint, ComputeError> + Send + Sync + 'static,
    {
        let mut pool = Self {
            handles: Vec::with_capacity(settings.workers),
            results: Some(results.clone()),
            shutdown: trigger,
        };

        for worker_id in 0..settings.workers {
            let mut worker = Worker::new(worker_id, compute.clone())
                .with_history(ProcessingHistory::new(settings.history_capacity))
                .with_policy(settings.policy)
                .with_clock(settings.clock.clone());
            if let Some(delay) = &settings.delay {
                worker = worker.with_delay(delay.clone());
            }

            let ctx = WorkerContext {
                tasks: tasks.clone(),
                results: results.clone(),
                shutdown: listener.clone(),
            };

            let handle = thread::Builder::new()
                .name(format!("taskpool-worker-{worker_id}"))
                .spawn(move || worker.run(ctx))
                .with_context(|| format!("Failed to spawn worker thread {worker_id}"))?;
            pool.handles.push(handle);
        }

        tracing::info!(
            "Started {} workers (history capacity {}, slack {}%)",
            settings.workers,
            settings.history_capacity,
            settings.policy.slack_percent
        );

        Ok(pool)
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    pub fn shutdown_trigger(&self) -> ShutdownTrigger {
        self.shutdown.clone()
    }

    /// Force early termination. Safe to call any number of times.
    pub fn shutdown(&self) {
        if self.shutdown.trigger() {
            tracing::info!("Shutdown requested for {} workers", self.handles.len());
        }
    }

    /// Wait for every worker, then close the result queue.
    ///
    /// Reports come back in worker id order.
    pub fn join(mut self) -> Result<Vec<WorkerReport>> {
        let mut reports = Vec::with_capacity(self.handles.len());
        let mut panicked = 0;

        for handle in self.handles.drain(..) {
            match handle.join() {
                Ok(report) => reports.push(report),
                Err(_) => panicked += 1,
            }
        }

        // Workers have all dropped their senders; this was the last one
        drop(self.results.take());

        if panicked > 0 {
            anyhow::bail!("{panicked} worker thread(s) panicked");
        }

        tracing::debug!("All {} workers reported completion", reports.len());
        Ok(reports)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Dropped without join: let detached workers stop
        if !self.handles.is_empty() {
            self.shutdown.trigger();
        }
    }
}
