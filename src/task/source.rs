use anyhow::Result;
use crossbeam::channel::Sender;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::types::Task;

/// Inclusive range workload values are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: i64,
    pub max: i64,
}

impl ValueRange {
    pub fn new(min: i64, max: i64) -> Result<Self> {
        if min > max {
            anyhow::bail!("Invalid value range: min ({min}) is greater than max ({max})");
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl Default for ValueRange {
    fn default() -> Self {
        Self { min: 3, max: 1000 }
    }
}

#[derive(Debug, Clone)]
enum Workload {
    Random {
        count: usize,
        range: ValueRange,
        seed: Option<u64>,
    },
    Fixed(Vec<i64>),
}

/// Produces a bounded, known-length stream of tasks with dense ids starting at 0
#[derive(Debug, Clone)]
pub struct TaskSource {
    workload: Workload,
}

impl TaskSource {
    /// `count` tasks with values drawn uniformly from `range`
    pub fn random(count: usize, range: ValueRange) -> Self {
        Self {
            workload: Workload::Random {
                count,
                range,
                seed: None,
            },
        }
    }

    /// One task per value, ids in slice order
    pub fn fixed(values: Vec<i64>) -> Self {
        Self {
            workload: Workload::Fixed(values),
        }
    }

    /// Make random workloads reproducible. No effect on fixed workloads.
    pub fn with_seed(mut self, seed: u64) -> Self {
        if let Workload::Random { seed: slot, .. } = &mut self.workload {
            *slot = Some(seed);
        }
        self
    }

    /// Number of tasks this source will emit
    pub fn len(&self) -> usize {
        match &self.workload {
            Workload::Random { count, .. } => *count,
            Workload::Fixed(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Send every task, then drop the sender to signal end-of-stream.
    ///
    /// Blocks only on queue backpressure. Returns the number of tasks sent,
    /// which is short of [`len`](Self::len) only if every receiver went away.
    pub fn emit(self, tasks: Sender<Task>) -> usize {
        let total = self.len();
        let mut sent = 0;

        match self.workload {
            Workload::Random { count, range, seed } => {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                for id in 0..count {
                    let task = Task::new(id, rng.gen_range(range.min..=range.max));
                    if tasks.send(task).is_err() {
                        break;
                    }
                    sent += 1;
                }
            }
            Workload::Fixed(values) => {
                for (id, value) in values.into_iter().enumerate() {
                    if tasks.send(Task::new(id, value)).is_err() {
                        break;
                    }
                    sent += 1;
                }
            }
        }

        if sent < total {
            tracing::debug!("Task queue closed early: emitted {sent} of {total} tasks");
        } else {
            tracing::debug!("Task source exhausted after {sent} tasks");
        }

        sent
    }
}
