//! # taskpool
//!
//! A fixed-size worker pool that computes factorials for a stream of tasks,
//! flags tasks that run slower than the worker's own recent history, and
//! hands results back in task order.
//!
//! ## Layout
//!
//! - [`task`]: task records and the task source
//! - [`compute`]: the factorial collaborator
//! - [`parallel`]: workers, anomaly history, shutdown, pool, collector
//! - [`pipeline`]: one end-to-end run
//! - [`config`]: layered configuration
//! - [`cli`]: the `taskpool` binary's interface
//!
//! ## Quick Start
//!
//! ```rust
//! use taskpool::compute::factorial;
//! use taskpool::parallel::PoolSettings;
//! use taskpool::pipeline::Pipeline;
//! use taskpool::task::TaskSource;
//!
//! let report = Pipeline::new(PoolSettings::new(2))
//!     .run(TaskSource::fixed(vec![3, 4, 5]), factorial)
//!     .unwrap();
//! assert_eq!(report.results.len(), 3);
//! assert_eq!(report.results[2].task.value, 5);
//! ```

pub mod cli;
pub mod compute;
pub mod config;
pub mod parallel;
pub mod pipeline;
pub mod task;

pub use cli::{Cli, Output};
pub use config::TaskpoolConfig;

/// Result type alias for taskpool operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
