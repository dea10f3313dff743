use std::collections::VecDeque;
use std::time::Duration;

/// Default number of recent durations a worker keeps
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Largest history a worker may be configured with
pub const MAX_HISTORY_CAPACITY: usize = 10_000;

/// Default slack over the rolling average before a duration counts as anomalous
pub const DEFAULT_SLACK_PERCENT: u32 = 10;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Bounded FIFO of a single worker's recent processing durations, oldest first.
///
/// Owned by exactly one worker and never shared, so it carries no locking.
#[derive(Debug, Clone)]
pub struct ProcessingHistory {
    samples: VecDeque<Duration>,
    capacity: usize,
}

impl ProcessingHistory {
    /// A capacity of 0 keeps nothing, so the average stays zero and
    /// detection never fires.
    pub fn new(capacity: usize) -> Self {
        Self {
            // Grows on demand past the default; capacity is only the eviction bound
            samples: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    /// Pre-seed a history. Only the newest `capacity` samples are kept.
    pub fn with_samples<I>(capacity: usize, samples: I) -> Self
    where
        I: IntoIterator<Item = Duration>,
    {
        let mut history = Self::new(capacity);
        for sample in samples {
            history.record(sample);
        }
        history
    }

    /// Arithmetic mean of the current samples, zero when empty
    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        // Summed in u128 nanoseconds; a mean of Durations always fits back
        let total: u128 = self.samples.iter().map(Duration::as_nanos).sum();
        let mean = total / self.samples.len() as u128;
        Duration::new(
            (mean / NANOS_PER_SEC) as u64,
            (mean % NANOS_PER_SEC) as u32,
        )
    }

    /// Append a sample, evicting the oldest one when at capacity
    pub fn record(&mut self, sample: Duration) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples oldest first
    pub fn samples(&self) -> impl Iterator<Item = &Duration> {
        self.samples.iter()
    }
}

impl Default for ProcessingHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

/// Decision rule for marking a processing time as anomalous
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnomalyPolicy {
    pub slack_percent: u32,
}

impl AnomalyPolicy {
    pub fn new(slack_percent: u32) -> Self {
        Self { slack_percent }
    }

    /// `average` plus `slack_percent` of it
    pub fn threshold(&self, average: Duration) -> Duration {
        let slack = average
            .checked_mul(self.slack_percent)
            .map(|scaled| scaled / 100)
            .unwrap_or(Duration::MAX);
        average.saturating_add(slack)
    }

    /// A zero average (cold start) never flags, whatever the elapsed time.
    pub fn is_anomalous(&self, elapsed: Duration, average: Duration) -> bool {
        elapsed > Duration::ZERO && average > Duration::ZERO && elapsed > self.threshold(average)
    }
}

impl Default for AnomalyPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SLACK_PERCENT)
    }
}
