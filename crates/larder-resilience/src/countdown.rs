// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cancellable delayed retries.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Deadline used when `delay` does not fit in an `Instant`.
const FALLBACK_HORIZON: Duration = Duration::from_secs(24 * 60 * 60);

/// A pending retry: runs a callback once `delay` has elapsed unless it is
/// cancelled first. Dropping the countdown cancels it.
#[derive(Debug)]
pub struct RetryCountdown {
    deadline: Instant,
    delay: Duration,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl RetryCountdown {
    /// Spawns the countdown on the current Tokio runtime.
    pub fn start<F, Fut>(delay: Duration, on_expire: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let now = Instant::now();
        let deadline = now
            .checked_add(delay)
            .unwrap_or_else(|| now + FALLBACK_HORIZON);
        let cancelled = token.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => on_expire().await,
            }
        });
        Self {
            deadline,
            delay,
            token,
            handle,
        }
    }

    /// The delay this countdown was started with.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Time left before the retry fires; zero once expired.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True once the callback has run or the countdown was cancelled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RetryCountdown {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() -> std::future::Ready<()> + Send + 'static) {
        let fired = Arc::new(AtomicUsize::new(0));
        let inner = fired.clone();
        (fired, move || {
            inner.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let (fired, callback) = counter();
        let countdown = RetryCountdown::start(Duration::from_secs(5), callback);
        assert_eq!(countdown.delay(), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(countdown.remaining(), Duration::from_secs(1));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(countdown.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let (fired, callback) = counter();
        let countdown = RetryCountdown::start(Duration::from_secs(5), callback);
        countdown.cancel();
        assert!(countdown.is_cancelled());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(countdown.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels() {
        let (fired, callback) = counter();
        drop(RetryCountdown::start(Duration::from_secs(1), callback));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn huge_delay_does_not_overflow() {
        let (fired, callback) = counter();
        let countdown = RetryCountdown::start(Duration::MAX, callback);
        assert!(countdown.remaining() <= FALLBACK_HORIZON);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        countdown.cancel();
    }
}
