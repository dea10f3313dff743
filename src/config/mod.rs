//! Configuration management for taskpool
//!
//! Typed configuration sections plus conversion into the engine's settings.
//! Loading and layering live in [`loader`].

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::parallel::history::{
    DEFAULT_HISTORY_CAPACITY, DEFAULT_SLACK_PERCENT, MAX_HISTORY_CAPACITY,
};
use crate::parallel::pool::MAX_CHANNEL_BUFFER;
use crate::parallel::{AnomalyPolicy, PoolSettings};
use crate::task::{TaskSource, ValueRange};

pub mod loader;

pub use self::loader::ENV_PREFIX;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TaskpoolConfig {
    /// Worker pool sizing
    #[serde(default)]
    pub pool: PoolConfig,

    /// Anomaly detection
    #[serde(default)]
    pub anomaly: AnomalyConfig,

    /// Generated workload
    #[serde(default)]
    pub tasks: TasksConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Worker threads (0 = available parallelism + 1)
    pub workers: usize,

    /// Channel buffer size multiplier (buffer = workers * multiplier)
    pub channel_buffer_multiplier: usize,

    /// Artificial per-task latency in milliseconds (0 = off)
    pub simulated_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Recent durations each worker keeps
    pub history_capacity: usize,

    /// Percentage over the rolling average tolerated before flagging
    pub slack_percent: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// Number of tasks to generate
    pub count: usize,

    /// Smallest workload value (inclusive)
    pub min: i64,

    /// Largest workload value (inclusive)
    pub max: i64,

    /// Seed for reproducible workloads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            channel_buffer_multiplier: 2,
            simulated_delay_ms: 0,
        }
    }
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            slack_percent: DEFAULT_SLACK_PERCENT,
        }
    }
}

impl Default for TasksConfig {
    fn default() -> Self {
        let range = ValueRange::default();
        Self {
            count: 100,
            min: range.min,
            max: range.max,
            seed: None,
        }
    }
}

impl TaskpoolConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.pool.channel_buffer_multiplier == 0 {
            anyhow::bail!("pool.channel_buffer_multiplier cannot be 0");
        }

        let workers = PoolSettings::resolve_workers(self.pool.workers);
        match workers.checked_mul(self.pool.channel_buffer_multiplier) {
            Some(buffer) if buffer <= MAX_CHANNEL_BUFFER => {}
            _ => anyhow::bail!(
                "pool.workers ({workers}) * pool.channel_buffer_multiplier ({}) cannot exceed {MAX_CHANNEL_BUFFER}",
                self.pool.channel_buffer_multiplier
            ),
        }

        if self.anomaly.history_capacity == 0 {
            anyhow::bail!("anomaly.history_capacity cannot be 0");
        }

        if self.anomaly.history_capacity > MAX_HISTORY_CAPACITY {
            anyhow::bail!(
                "anomaly.history_capacity ({}) cannot exceed {MAX_HISTORY_CAPACITY}",
                self.anomaly.history_capacity
            );
        }

        if self.tasks.min > self.tasks.max {
            anyhow::bail!(
                "tasks.min ({}) cannot be greater than tasks.max ({})",
                self.tasks.min,
                self.tasks.max
            );
        }

        Ok(())
    }

    /// Engine settings for this configuration
    pub fn pool_settings(&self) -> PoolSettings {
        let settings = PoolSettings::new(self.pool.workers)
            .with_history_capacity(self.anomaly.history_capacity)
            .with_policy(AnomalyPolicy::new(self.anomaly.slack_percent))
            .with_channel_buffer_multiplier(self.pool.channel_buffer_multiplier);

        match self.pool.simulated_delay_ms {
            0 => settings,
            ms => settings.with_simulated_delay(Duration::from_millis(ms)),
        }
    }

    /// Random workload described by the `[tasks]` section
    pub fn task_source(&self) -> Result<TaskSource> {
        let range = ValueRange::new(self.tasks.min, self.tasks.max)?;
        let source = TaskSource::random(self.tasks.count, range);
        Ok(match self.tasks.seed {
            Some(seed) => source.with_seed(seed),
            None => source,
        })
    }
}

#[cfg(test)]
mod tests;
