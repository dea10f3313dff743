use num_bigint::BigUint;
use serde::Serialize;
use std::time::Duration;

use crate::compute::ComputeError;

/// A unit of work. The id is dense and 0-based and fixes the final ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: usize,
    pub value: i64,
}

impl Task {
    pub fn new(id: usize, value: i64) -> Self {
        Self { id, value }
    }
}

/// What a worker produced for one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The genuine computed value
    Value(BigUint),
    /// The computed value was discarded because processing took longer than
    /// the worker's adaptive threshold
    Anomaly { elapsed: Duration, threshold: Duration },
    /// The compute collaborator could not produce a value
    Failed(ComputeError),
}

impl Outcome {
    pub fn value(&self) -> Option<&BigUint> {
        match self {
            Outcome::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_anomaly(&self) -> bool {
        matches!(self, Outcome::Anomaly { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Result of processing one task, produced by exactly one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub task: Task,
    pub outcome: Outcome,
    pub worker_id: usize,
    /// Measured processing time, including any injected delay
    pub elapsed: Duration,
}
