//! Countdown latch
//!
//! A latch releases its waiters once a fixed number of completions have been
//! counted down. Unlike a barrier, the workers counting down never wait.

use tokio::sync::watch;

/// Single-use countdown synchronization point
#[derive(Debug)]
pub struct Latch {
    remaining: watch::Sender<usize>,
}

impl Latch {
    /// Creates a latch expecting `count` completions
    pub fn new(count: usize) -> Self {
        Self {
            remaining: watch::Sender::new(count),
        }
    }

    /// Signals one completion
    ///
    /// Counting past zero has no effect.
    pub fn count_down(&self) {
        self.remaining.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Returns the number of completions still expected
    pub fn remaining(&self) -> usize {
        *self.remaining.borrow()
    }

    /// Waits until every expected completion has been signaled
    pub async fn wait(&self) {
        let mut rx = self.remaining.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        if rx.wait_for(|n| *n == 0).await.is_err() {
            log::warn!("latch closed before reaching zero");
        }
    }
}
