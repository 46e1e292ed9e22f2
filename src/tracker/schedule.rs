//! Cancellable periodic scheduling for the tracker loops.
//!
//! Cancellation is signalled by dropping the [`CancelHandle`]: every
//! [`CancelToken`] blocked in [`CancelToken::sleep`] wakes immediately.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// Owning side of a cancellation signal. Dropping it cancels all tokens.
#[derive(Debug)]
pub struct CancelHandle {
    _tx: Sender<()>,
}

/// Observing side of a cancellation signal.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: Receiver<()>,
}

/// Create a linked handle/token pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = bounded(0);
    (CancelHandle { _tx: tx }, CancelToken { rx })
}

impl CancelHandle {
    /// Cancel every linked token.
    pub fn cancel(self) {
        drop(self);
    }
}

impl CancelToken {
    /// Sleep for `duration` or until cancelled. Returns `true` if cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        match self.rx.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) | Ok(()) => true,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.sleep(Duration::ZERO)
    }
}

/// Fixed-period ticker. Ticks are scheduled from the previous tick rather
/// than from when the work finished, so slow iterations do not drift the
/// cadence; missed ticks are skipped, not replayed.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    /// A ticker whose first tick is due immediately.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now(),
        }
    }

    /// Block until the next tick. Returns `false` if cancelled first.
    pub fn wait(&mut self, cancel: &CancelToken) -> bool {
        let now = Instant::now();
        let remaining = self.next.saturating_duration_since(now);
        if cancel.sleep(remaining) {
            return false;
        }

        self.next += self.period;
        let now = Instant::now();
        if self.next < now {
            self.next = now + self.period;
        }
        true
    }
}
