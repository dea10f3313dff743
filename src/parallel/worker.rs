use crossbeam::channel::{Receiver, Sender, select};
use num_bigint::BigUint;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::clock::{Clock, MonotonicClock};
use super::history::{AnomalyPolicy, ProcessingHistory};
use super::shutdown::ShutdownListener;
use crate::compute::ComputeError;
use crate::task::{Outcome, Task, TaskResult};

/// Hook run inside the timed window before compute. Used to inject latency.
pub type DelayHook = Arc<dyn Fn() + Send + Sync>;

/// Queues a worker pulls from and publishes to
pub struct WorkerContext {
    pub tasks: Receiver<Task>,
    pub results: Sender<TaskResult>,
    pub shutdown: ShutdownListener,
}

/// Why a worker's run loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerExit {
    /// Task queue closed and empty
    Drained,
    /// Shutdown signal observed
    Shutdown,
    /// Nobody is receiving results any more
    ResultsClosed,
}

/// Completion report a worker hands back to the pool exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub worker_id: usize,
    pub processed: usize,
    pub anomalies: usize,
    pub failures: usize,
    /// Rolling average at exit
    pub average: Duration,
    pub exit: WorkerExit,
}

/// Pulls tasks, computes, applies per-worker anomaly detection, emits results
pub struct Worker<F> {
    id: usize,
    history: ProcessingHistory,
    policy: AnomalyPolicy,
    compute: Arc<F>,
    clock: Arc<dyn Clock>,
    delay: Option<DelayHook>,
    processed: usize,
    anomalies: usize,
    failures: usize,
}

impl<F> Worker<F>
where
    F: Fn(i64) -> Result<BigUint, ComputeError>,
{
    pub fn new(id: usize, compute: Arc<F>) -> Self {
        Self {
            id,
            history: ProcessingHistory::default(),
            policy: AnomalyPolicy::default(),
            compute,
            clock: Arc::new(MonotonicClock::new()),
            delay: None,
            processed: 0,
            anomalies: 0,
            failures: 0,
        }
    }

    pub fn with_history(mut self, history: ProcessingHistory) -> Self {
        self.history = history;
        self
    }

    pub fn with_policy(mut self, policy: AnomalyPolicy) -> Self {
        self.policy = policy;
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

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn history(&self) -> &ProcessingHistory {
        &self.history
    }

    /// Process a single task.
    ///
    /// The anomaly decision compares the elapsed time against the average of
    /// the history *before* this sample is recorded. A compute failure is
    /// reported as such even when it was also slow.
    pub fn process_one(&mut self, task: Task) -> TaskResult {
        let start = self.clock.now();
        if let Some(delay) = &self.delay {
            delay();
        }
        let computed = (self.compute)(task.value);
        let elapsed = self.clock.now().saturating_sub(start);

        let average = self.history.average();
        let anomalous = self.policy.is_anomalous(elapsed, average);
        self.history.record(elapsed);
        self.processed += 1;

        let outcome = match computed {
            Err(err) => {
                self.failures += 1;
                tracing::warn!("worker-{}: task {} failed: {err}", self.id, task.id);
                Outcome::Failed(err)
            }
            Ok(_) if anomalous => {
                self.anomalies += 1;
                let threshold = self.policy.threshold(average);
                tracing::warn!(
                    "worker-{}: task {} took {elapsed:?}, over threshold {threshold:?}",
                    self.id,
                    task.id
                );
                Outcome::Anomaly { elapsed, threshold }
            }
            Ok(value) => {
                tracing::debug!("worker-{}: task {} done in {elapsed:?}", self.id, task.id);
                Outcome::Value(value)
            }
        };

        TaskResult {
            task,
            outcome,
            worker_id: self.id,
            elapsed,
        }
    }

    /// Run until the task queue is exhausted or shutdown is observed.
    ///
    /// A task already taken is finished and published; no new task is taken
    /// once shutdown is seen.
    pub fn run(mut self, ctx: WorkerContext) -> WorkerReport {
        let exit = loop {
            if ctx.shutdown.is_triggered() {
                break WorkerExit::Shutdown;
            }

            let task = select! {
                recv(ctx.tasks) -> msg => match msg {
                    Ok(task) => task,
                    Err(_) => break WorkerExit::Drained,
                },
                recv(ctx.shutdown.receiver()) -> _ => break WorkerExit::Shutdown,
            };

            let result = self.process_one(task);
            if ctx.results.send(result).is_err() {
                break WorkerExit::ResultsClosed;
            }
        };

        let report = self.report(exit);
        tracing::info!(
            "worker-{} exited ({:?}): {} processed, {} anomalies, {} failures",
            report.worker_id,
            report.exit,
            report.processed,
            report.anomalies,
            report.failures
        );
        report
    }

    fn report(&self, exit: WorkerExit) -> WorkerReport {
        WorkerReport {
            worker_id: self.id,
            processed: self.processed,
            anomalies: self.anomalies,
            failures: self.failures,
            average: self.history.average(),
            exit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::factorial;
    use crate::parallel::clock::VirtualClock;
    use crate::parallel::shutdown;
    use crossbeam::channel::{bounded, unbounded};
    use std::thread;

    type ComputeFn = fn(i64) -> Result<BigUint, ComputeError>;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn factorial_worker(id: usize) -> Worker<ComputeFn> {
        Worker::new(id, Arc::new(factorial as ComputeFn))
    }

    /// Worker on a frozen clock whose delay hook advances time by `delay`
    fn timed_worker(id: usize, delay: Duration) -> Worker<ComputeFn> {
        let clock = Arc::new(VirtualClock::new());
        let hook_clock = clock.clone();
        factorial_worker(id)
            .with_clock(clock)
            .with_delay(Arc::new(move || hook_clock.advance(delay)))
    }

    #[test]
    fn test_slow_task_over_seeded_average_is_anomalous() {
        let mut worker = timed_worker(1, ms(500))
            .with_history(ProcessingHistory::with_samples(3, [ms(100), ms(200), ms(300)]));

        let result = worker.process_one(Task::new(0, 3));

        assert_eq!(
            result.outcome,
            Outcome::Anomaly {
                elapsed: ms(500),
                threshold: ms(220),
            }
        );
        assert_eq!(result.worker_id, 1);
        assert_eq!(result.elapsed, ms(500));

        // Oldest sample evicted, new one recorded
        let samples: Vec<Duration> = worker.history().samples().copied().collect();
        assert_eq!(samples, vec![ms(200), ms(300), ms(500)]);
    }

    #[test]
    fn test_task_within_threshold_keeps_value() {
        let mut worker = timed_worker(0, ms(220))
            .with_history(ProcessingHistory::with_samples(3, [ms(100), ms(200), ms(300)]));

        let result = worker.process_one(Task::new(0, 5));
        assert_eq!(result.outcome, Outcome::Value(BigUint::from(120u32)));
    }

    #[test]
    fn test_cold_start_is_never_anomalous() {
        let mut worker = timed_worker(0, Duration::from_secs(3600));
        let result = worker.process_one(Task::new(0, 5));
        assert_eq!(result.outcome, Outcome::Value(BigUint::from(120u32)));
        assert_eq!(worker.history().average(), Duration::from_secs(3600));
    }

    #[test]
    fn test_processes_values_in_order() {
        let mut worker = factorial_worker(0).with_clock(Arc::new(VirtualClock::new()));
        let values: Vec<Outcome> = [3, 5, 7]
            .into_iter()
            .enumerate()
            .map(|(id, value)| worker.process_one(Task::new(id, value)).outcome)
            .collect();

        assert_eq!(
            values,
            vec![
                Outcome::Value(BigUint::from(6u32)),
                Outcome::Value(BigUint::from(120u32)),
                Outcome::Value(BigUint::from(5040u32)),
            ]
        );
    }

    #[test]
    fn test_compute_failure_is_not_an_anomaly() {
        let mut worker = timed_worker(0, ms(500))
            .with_history(ProcessingHistory::with_samples(3, [ms(1); 3]));

        let result = worker.process_one(Task::new(0, -1));
        assert_eq!(result.outcome, Outcome::Failed(ComputeError::NegativeInput(-1)));
    }

    #[test]
    fn test_run_drains_queue_then_exits() {
        let (task_tx, task_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        let (_trigger, listener) = shutdown::channel();

        for (id, value) in [3, 5, 7].into_iter().enumerate() {
            task_tx.send(Task::new(id, value)).unwrap();
        }
        drop(task_tx);

        let report = factorial_worker(2).run(WorkerContext {
            tasks: task_rx,
            results: result_tx,
            shutdown: listener,
        });

        assert_eq!(report.exit, WorkerExit::Drained);
        assert_eq!(report.processed, 3);
        assert_eq!(report.worker_id, 2);

        let ids: Vec<usize> = result_rx.iter().map(|r| r.task.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_run_takes_nothing_after_shutdown() {
        let (task_tx, task_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        let (trigger, listener) = shutdown::channel();

        task_tx.send(Task::new(0, 3)).unwrap();
        trigger.trigger();

        let report = factorial_worker(0).run(WorkerContext {
            tasks: task_rx,
            results: result_tx,
            shutdown: listener,
        });

        assert_eq!(report.exit, WorkerExit::Shutdown);
        assert_eq!(report.processed, 0);
        assert!(result_rx.try_recv().is_err());
    }

    #[test]
    fn test_blocked_worker_wakes_on_shutdown() {
        let (_task_tx, task_rx) = bounded::<Task>(1);
        let (result_tx, _result_rx) = unbounded();
        let (trigger, listener) = shutdown::channel();

        let handle = thread::spawn(move || {
            factorial_worker(0).run(WorkerContext {
                tasks: task_rx,
                results: result_tx,
                shutdown: listener,
            })
        });

        thread::sleep(ms(20));
        trigger.trigger();

        let report = handle.join().expect("worker thread panicked");
        assert_eq!(report.exit, WorkerExit::Shutdown);
        assert_eq!(report.processed, 0);
    }

    #[test]
    fn test_run_stops_when_results_closed() {
        let (task_tx, task_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        let (_trigger, listener) = shutdown::channel();
        drop(result_rx);

        task_tx.send(Task::new(0, 3)).unwrap();
        task_tx.send(Task::new(1, 4)).unwrap();

        let report = factorial_worker(0).run(WorkerContext {
            tasks: task_rx,
            results: result_tx,
            shutdown: listener,
        });

        assert_eq!(report.exit, WorkerExit::ResultsClosed);
        assert_eq!(report.processed, 1);
    }
}
