// src/policy/priority.rs

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::policy::OrderingPolicy;
use crate::worker::Worker;

/// Heap entry. The priority is captured when the worker is stored, so a later
/// `set_priority` cannot corrupt the heap order.
struct Entry {
    priority: i32,
    worker: Worker,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}

/// Highest priority key first. Equal priorities come out in no particular
/// order.
#[derive(Default)]
pub struct PriorityPolicy {
    heap: BinaryHeap<Entry>,
}

impl PriorityPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderingPolicy for PriorityPolicy {
    fn name(&self) -> &'static str {
        "priority"
    }

    fn store(&mut self, worker: Worker) {
        self.heap.push(Entry {
            priority: worker.priority(),
            worker,
        });
    }

    fn take_next(&mut self) -> Option<Worker> {
        self.heap.pop().map(|entry| entry.worker)
    }

    fn pending_count(&self) -> usize {
        self.heap.len()
    }

    fn pending_workers(&self) -> Vec<Worker> {
        let mut entries: Vec<&Entry> = self.heap.iter().collect();
        entries.sort_by(|a, b| b.cmp(a));
        entries.into_iter().map(|e| e.worker.clone()).collect()
    }

    fn clear_all(&mut self) {
        self.heap.clear();
    }
}
