//! Sliding-window rate limiter shared by all outbound market calls.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Caps calls at `max_calls` per sliding `period`.
///
/// The window holds the timestamps of recent acquisitions; `acquire`
/// parks the caller until the oldest timestamp ages out. The window lock
/// is held across that wait, so concurrent callers are admitted in the
/// order they arrived and a burst of waiters cannot stampede past the
/// limit when a slot frees up.
pub struct RateLimiter {
    max_calls: usize,
    period: Duration,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, period: Duration) -> Self {
        assert!(max_calls > 0, "rate limiter needs at least one call per period");
        Self {
            max_calls,
            period,
            window: Mutex::new(VecDeque::with_capacity(max_calls)),
        }
    }

    /// Waits until a call slot is available, then claims it.
    ///
    /// Never fails and never skips the queue; cancellation while parked
    /// leaves the window untouched.
    pub async fn acquire(&self) {
        let mut window = self.window.lock().await;
        loop {
            let now = Instant::now();
            while window
                .front()
                .is_some_and(|t| now.duration_since(*t) >= self.period)
            {
                window.pop_front();
            }
            if window.len() < self.max_calls {
                window.push_back(now);
                return;
            }
            // Oldest entry leaves the window first; sleep until then and
            // re-check, in case the clock advanced while we slept.
            let wake_at = *window.front().unwrap() + self.period;
            tokio::time::sleep_until(wake_at).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn burst_up_to_limit_is_immediate() {
        let limiter = RateLimiter::new(5, Duration::from_secs(1));
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn excess_call_waits_a_full_period() {
        let limiter = RateLimiter::new(5, Duration::from_secs(1));
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn window_slides_rather_than_resets() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_millis(600)).await;
        limiter.acquire().await;

        // First slot frees 1 s after the first acquire, i.e. 400 ms from now.
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_are_admitted_in_arrival_order() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new(1, Duration::from_secs(1)));
        limiter.acquire().await;

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        for id in 0..3 {
            let limiter = Arc::clone(&limiter);
            let tx = tx.clone();
            tokio::spawn(async move {
                limiter.acquire().await;
                tx.send(id).unwrap();
            });
            // Let the task reach the lock queue before spawning the next.
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        tokio::time::sleep(Duration::from_secs(4)).await;
        let mut order = Vec::new();
        while let Ok(id) = rx.try_recv() {
            order.push(id);
        }
        assert_eq!(order, vec![0, 1, 2]);
    }
}
