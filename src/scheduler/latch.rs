//! Count-down latch tracking vehicles that still have to finish.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

/// Latch initialized with the vehicle count and released at zero.
#[derive(Debug)]
pub struct CompletionLatch {
    remaining: AtomicUsize,
    notify: Notify,
}

impl CompletionLatch {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
            notify: Notify::new(),
        }
    }

    /// Record one completion. Returns the count left afterwards.
    ///
    /// Saturates at zero; extra calls are ignored.
    pub fn count_down(&self) -> usize {
        match self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(1) => {
                self.notify.notify_waiters();
                0
            }
            Ok(previous) => previous - 1,
            Err(_) => 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn is_released(&self) -> bool {
        self.remaining() == 0
    }

    /// Wait until the count reaches zero.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_released() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn count_down_saturates() {
        let latch = CompletionLatch::new(2);
        assert_eq!(latch.count_down(), 1);
        assert_eq!(latch.count_down(), 0);
        assert_eq!(latch.count_down(), 0);
        assert!(latch.is_released());
    }

    #[tokio::test]
    async fn zero_latch_is_released_immediately() {
        let latch = CompletionLatch::new(0);
        tokio::time::timeout(Duration::from_millis(100), latch.wait())
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn wait_returns_after_last_count_down() {
        let latch = Arc::new(CompletionLatch::new(3));
        let waiter = {
            let latch = latch.clone();
            tokio::spawn(async move { latch.wait().await })
        };

        for _ in 0..3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            assert!(!waiter.is_finished());
            latch.count_down();
        }

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
