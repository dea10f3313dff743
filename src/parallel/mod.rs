//! Worker pool coordination engine
//!
//! This module distributes tasks over a fixed set of worker threads, flags
//! slow tasks per worker, and puts results back in task order.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────────────────┐    ┌─────────────────┐
//! │  TaskSource  │───▶│  task queue (bounded)    │───▶│  Worker 0..N    │
//! │              │    │  crossbeam MPMC channel  │    │  own history    │
//! └──────────────┘    └──────────────────────────┘    └────────┬────────┘
//!                                                              │
//!                     ┌──────────────────────────┐             │
//!                     │  result queue (bounded)  │◀────────────┘
//!                     └────────────┬─────────────┘
//!                                  ▼
//!                     ┌──────────────────────────┐
//!                     │  ResultCollector         │  slot per task id
//!                     └──────────────────────────┘
//! ```
//!
//! ## Responsibilities
//! - **[`history`]**: bounded per-worker duration history and the anomaly rule
//! - **[`worker`]**: task loop, timing, `select!` over task queue and shutdown
//! - **[`shutdown`]**: broadcast stop signal, idempotent
//! - **[`pool`]**: spawns workers, counting join, closes the result queue
//! - **[`collector`]**: drains results into task-id order
//! - **[`clock`]**: time source, swappable for deterministic tests
//!
//! Each worker owns its history outright. Only the two queues are shared.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use crossbeam::channel::unbounded;
//! use taskpool::compute::factorial;
//! use taskpool::parallel::{PoolSettings, ResultCollector, WorkerPool};
//! use taskpool::task::Task;
//!
//! let (task_tx, task_rx) = unbounded();
//! let (result_tx, result_rx) = unbounded();
//! for (id, value) in [3, 5, 7].into_iter().enumerate() {
//!     task_tx.send(Task::new(id, value)).unwrap();
//! }
//! drop(task_tx);
//!
//! let pool = WorkerPool::spawn(&PoolSettings::new(2), task_rx, result_tx, Arc::new(factorial)).unwrap();
//! pool.join().unwrap();
//!
//! let results = ResultCollector::new(3).drain(&result_rx).into_ordered();
//! assert_eq!(results.len(), 3);
//! assert_eq!(results[2].task.value, 7);
//! ```

pub mod clock;
pub mod collector;
pub mod history;
pub mod pool;
pub mod shutdown;
pub mod worker;

// Re-export main types for easier access
pub use clock::{Clock, MonotonicClock, VirtualClock};
pub use collector::{CollectedResults, CollectorState, ResultCollector};
pub use history::{AnomalyPolicy, ProcessingHistory};
pub use pool::{PoolSettings, WorkerPool};
pub use shutdown::{ShutdownListener, ShutdownTrigger};
pub use worker::{Worker, WorkerContext, WorkerExit, WorkerReport};
