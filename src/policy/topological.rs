// src/policy/topological.rs

use std::collections::VecDeque;

use crate::policy::OrderingPolicy;
use crate::types::ExecutionMode;
use crate::worker::Worker;

/// Strict FIFO over a precomputed dependency order.
///
/// The order is never re-sorted. Correctness relies on serial execution: a
/// later worker cannot start before an earlier one finishes, so the policy
/// forces [`ExecutionMode::Serial`].
#[derive(Default)]
pub struct TopologicalPolicy {
    queue: VecDeque<Worker>,
}

impl TopologicalPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderingPolicy for TopologicalPolicy {
    fn name(&self) -> &'static str {
        "topological"
    }

    fn store(&mut self, worker: Worker) {
        self.queue.push_back(worker);
    }

    fn take_next(&mut self) -> Option<Worker> {
        self.queue.pop_front()
    }

    fn pending_count(&self) -> usize {
        self.queue.len()
    }

    fn pending_workers(&self) -> Vec<Worker> {
        self.queue.iter().cloned().collect()
    }

    fn clear_all(&mut self) {
        self.queue.clear();
    }

    fn forced_mode(&self) -> Option<ExecutionMode> {
        Some(ExecutionMode::Serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order_regardless_of_priority() {
        let mut policy = TopologicalPolicy::new();
        for (id, p) in [("first", 0), ("second", 99), ("third", -1)] {
            policy.store(
                Worker::builder(crate::worker::work_fn(|_| Ok(())))
                    .id(id)
                    .priority(p)
                    .build(),
            );
        }

        let order: Vec<String> = std::iter::from_fn(|| policy.take_next())
            .map(|w| w.id().to_string())
            .collect();
        assert_eq!(order, ["first", "second", "third"]);
        assert_eq!(policy.forced_mode(), Some(ExecutionMode::Serial));
    }
}
