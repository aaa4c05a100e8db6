//! Stable priority ordering for stage queues.

use std::collections::VecDeque;

use crate::model::Priority;

/// Item with associated priority for queue ordering.
#[derive(Debug)]
pub struct PrioritizedItem<T> {
    pub priority: Priority,
    pub item: T,
}

/// Ordered queue: ascending priority rank, FIFO among equal ranks.
///
/// Insertion scans for the first occupant with a strictly less urgent
/// priority and inserts in front of it. Equal-priority occupants are never
/// displaced, which keeps arrival order within a class.
#[derive(Debug)]
pub struct PriorityQueue<T> {
    items: VecDeque<PrioritizedItem<T>>,
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        Self { items: VecDeque::new() }
    }

    /// Insert `item`; returns the position it landed at.
    pub fn push(&mut self, item: T, priority: Priority) -> usize {
        let position = self
            .items
            .iter()
            .position(|occupant| occupant.priority > priority)
            .unwrap_or(self.items.len());
        self.items.insert(position, PrioritizedItem { priority, item });
        position
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front().map(|p| p.item)
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.front().map(|p| &p.item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in dequeue order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|p| &p.item)
    }

    /// Priorities in dequeue order.
    pub fn priorities(&self) -> impl Iterator<Item = Priority> + '_ {
        self.items.iter().map(|p| p.priority)
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
