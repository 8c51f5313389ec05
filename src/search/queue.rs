//! Open set and result heap
//!
//! Both structures order entries with the configured `PathOrderStrategy`.
//! The open set is a hand-rolled binary min-heap: the standard library
//! heap cannot carry a runtime comparator, and tie-break stability is part
//! of the contract (the insertion counter lives inside the key). The result
//! heap is a small sorted vector with bounded insertion.

use std::sync::Arc;

use crate::search::ordering::{PathOrderKey, PathOrderStrategy};
use crate::search::state::{CandidatePath, SearchState};
use std::cmp::Ordering;

#[derive(Clone)]
pub(crate) struct OpenEntry {
    pub key: PathOrderKey,
    pub state: SearchState,
}

/// Priority queue over search states; pops the minimum key first.
#[derive(Clone)]
pub(crate) struct OpenSet {
    heap: Vec<OpenEntry>,
    strategy: Arc<dyn PathOrderStrategy>,
}

impl OpenSet {
    pub fn new(strategy: Arc<dyn PathOrderStrategy>) -> Self {
        Self {
            heap: Vec::new(),
            strategy,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn push(&mut self, entry: OpenEntry) {
        self.heap.push(entry);
        self.sift_up(self.heap.len() - 1);
    }

    pub fn pop(&mut self) -> Option<OpenEntry> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let top = self.heap.pop();
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        top
    }

    fn precedes(&self, a: usize, b: usize) -> bool {
        self.strategy
            .compare(&self.heap[a].key, &self.heap[b].key)
            == Ordering::Less
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.precedes(index, parent) {
                self.heap.swap(index, parent);
                index = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;
            if left < len && self.precedes(left, smallest) {
                smallest = left;
            }
            if right < len && self.precedes(right, smallest) {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.heap.swap(index, smallest);
            index = smallest;
        }
    }
}

/// Bounded best-k collection of candidates, kept sorted by the strategy.
/// When full, a newcomer displaces the current maximum only if it precedes
/// it under the order.
#[derive(Clone)]
pub(crate) struct ResultHeap {
    entries: Vec<(PathOrderKey, CandidatePath)>,
    capacity: usize,
    strategy: Arc<dyn PathOrderStrategy>,
}

impl ResultHeap {
    pub fn new(capacity: usize, strategy: Arc<dyn PathOrderStrategy>) -> Self {
        Self {
            entries: Vec::with_capacity(capacity.min(64)),
            capacity,
            strategy,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// The worst key currently kept, when full.
    pub fn worst_key(&self) -> Option<&PathOrderKey> {
        self.entries.last().map(|(key, _)| key)
    }

    /// Insert if the candidate makes the cut. Returns whether it was kept.
    pub fn offer(&mut self, key: PathOrderKey, candidate: CandidatePath) -> bool {
        let index = self
            .entries
            .partition_point(|(existing, _)| {
                self.strategy.compare(existing, &key) != Ordering::Greater
            });
        if self.is_full() && index >= self.entries.len() {
            return false;
        }
        self.entries.insert(index, (key, candidate));
        if self.entries.len() > self.capacity {
            self.entries.pop();
        }
        true
    }

    /// Extract candidates in order, best first.
    pub fn into_candidates(self) -> Vec<CandidatePath> {
        self.entries
            .into_iter()
            .map(|(_, candidate)| candidate)
            .collect()
    }
}
