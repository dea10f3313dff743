use crossbeam::channel::Receiver;

use crate::task::TaskResult;

/// Collector lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Draining,
    Complete,
}

/// Restores task-id order over an unordered completion stream.
///
/// Results are placed straight into a pre-sized slot per task id, so there is
/// no sort. An id outside `[0, expected)` or a second result for the same id
/// is a protocol violation and panics.
#[derive(Debug)]
pub struct ResultCollector {
    slots: Vec<Option<TaskResult>>,
    received: usize,
    state: CollectorState,
}

impl ResultCollector {
    pub fn new(expected: usize) -> Self {
        Self {
            slots: vec![None; expected],
            received: 0,
            state: CollectorState::Draining,
        }
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    pub fn received(&self) -> usize {
        self.received
    }

    /// Place one result at its task id
    pub fn accept(&mut self, result: TaskResult) {
        let id = result.task.id;
        let expected = self.slots.len();
        let Some(slot) = self.slots.get_mut(id) else {
            panic!("protocol violation: task id {id} outside expected range 0..{expected}");
        };
        if let Some(existing) = slot {
            panic!(
                "protocol violation: duplicate result for task id {id} (workers {} and {})",
                existing.worker_id, result.worker_id
            );
        }
        *slot = Some(result);
        self.received += 1;
    }

    /// Drain the queue until it is closed, then complete
    pub fn drain(mut self, results: &Receiver<TaskResult>) -> CollectedResults {
        for result in results.iter() {
            self.accept(result);
        }
        self.finish()
    }

    /// Stop accepting results. The returned set is always `Complete`.
    pub fn finish(self) -> CollectedResults {
        tracing::debug!(
            "Collector complete: {} of {} results",
            self.received,
            self.slots.len()
        );
        CollectedResults {
            slots: self.slots,
            state: CollectorState::Complete,
        }
    }
}

/// Results indexed by task id, possibly with gaps after a forced shutdown
#[derive(Debug)]
pub struct CollectedResults {
    slots: Vec<Option<TaskResult>>,
    state: CollectorState,
}

impl CollectedResults {
    pub fn state(&self) -> CollectorState {
        self.state
    }


    pub fn expected(&self) -> usize {
        self.slots.len()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Task ids that never produced a result, ascending
    pub fn missing(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Every result in task-id order.
    ///
    /// # Panics
    /// If any id has no result. A normal run always produces one per task.
    pub fn into_ordered(self) -> Vec<TaskResult> {
        let expected = self.slots.len();
        self.slots
            .into_iter()
            .enumerate()
            .map(|(id, slot)| {
                slot.unwrap_or_else(|| {
                    panic!("protocol violation: no result for task id {id} of {expected}")
                })
            })
            .collect()
    }

    /// Whatever arrived, in task-id order
    pub fn into_partial(self) -> Vec<TaskResult> {
        self.slots.into_iter().flatten().collect()
    }
}
