//! Per-stage vehicle queue shared by producers and consumers.

use parking_lot::Mutex;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

use super::priority::PriorityQueue;
use crate::model::Vehicle;

/// Thread-safe stage queue with priority ordering.
///
/// One lock guards the queue for both roles: the stage's own workers popping
/// and the previous stage's workers pushing. The lock is held for a single
/// push or pop and never across an await point.
#[derive(Debug, Default)]
pub struct StageQueue {
    queue: Mutex<PriorityQueue<Vehicle>>,
    /// Wakes an idle worker when a vehicle is enqueued.
    notify: Notify,
}

impl StageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a vehicle in priority order. Returns its queue position.
    pub fn enqueue(&self, vehicle: Vehicle) -> usize {
        let priority = vehicle.priority();
        let position = self.queue.lock().push(vehicle, priority);
        self.notify.notify_one();
        position
    }

    /// Enqueue a batch under a single lock acquisition.
    pub fn enqueue_all(&self, vehicles: impl IntoIterator<Item = Vehicle>) -> usize {
        let mut queue = self.queue.lock();
        let mut added = 0;
        for vehicle in vehicles {
            let priority = vehicle.priority();
            queue.push(vehicle, priority);
            added += 1;
        }
        drop(queue);

        for _ in 0..added {
            self.notify.notify_one();
        }
        added
    }

    /// Remove the head vehicle, or `None` when the queue is empty.
    pub fn dequeue(&self) -> Option<Vehicle> {
        self.queue.lock().pop()
    }

    /// Future resolved by the next push. Register it before checking the
    /// queue so a push between the check and the wait is not missed.
    pub fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Plates in current dequeue order.
    pub fn plates(&self) -> Vec<String> {
        self.queue.lock().iter().map(|v| v.plate.clone()).collect()
    }

    /// Remove every queued vehicle, in dequeue order.
    pub fn drain(&self) -> Vec<Vehicle> {
        let mut queue = self.queue.lock();
        std::iter::from_fn(|| queue.pop()).collect()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
