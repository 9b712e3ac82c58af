//! Rate limiter for live gesture updates.
//!
//! Leading-edge throttle: the first value in a window is applied at once,
//! later values inside the window replace one another in a trailing slot
//! that is released when the window has passed (or flushed on demand).

#[cfg(not(target_arch = "wasm32"))]
pub use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
pub use web_time::{Duration, Instant};

/// One live update per 144 Hz frame.
pub const DEFAULT_LIVE_UPDATE_INTERVAL: Duration = Duration::from_micros(1_000_000 / 144);

#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    last_fired: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
            pending: None,
        }
    }

    fn window_open(&self, now: Instant) -> bool {
        self.last_fired
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Offer a value at `now`. Returns it if it should be applied right
    /// away; otherwise it becomes the trailing value and `None` is returned.
    pub fn offer(&mut self, value: T, now: Instant) -> Option<T> {
        if self.window_open(now) {
            self.last_fired = Some(now);
            self.pending = None;
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// Release the trailing value if its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.pending.is_some() && self.window_open(now) {
            self.last_fired = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    /// Release the trailing value immediately.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn reset(&mut self) {
        self.last_fired = None;
        self.pending = None;
    }
}

impl<T> Default for Throttle<T> {
    fn default() -> Self {
        Self::new(DEFAULT_LIVE_UPDATE_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_call_fires_immediately() {
        let mut t = Throttle::new(ms(7));
        assert_eq!(t.offer(1, Instant::now()), Some(1));
    }

    #[test]
    fn test_calls_inside_window_coalesce() {
        let mut t = Throttle::new(ms(7));
        let start = Instant::now();
        assert_eq!(t.offer(1, start), Some(1));
        assert_eq!(t.offer(2, start + ms(2)), None);
        assert_eq!(t.offer(3, start + ms(4)), None);
        assert!(t.has_pending());

        assert_eq!(t.poll(start + ms(5)), None);
        assert_eq!(t.poll(start + ms(7)), Some(3));
        assert!(!t.has_pending());
    }

    #[test]
    fn test_call_after_window_fires_and_drops_trailing() {
        let mut t = Throttle::new(ms(7));
        let start = Instant::now();
        t.offer(1, start);
        t.offer(2, start + ms(1));
        assert_eq!(t.offer(3, start + ms(8)), Some(3));
        assert_eq!(t.flush(), None);
    }

    #[test]
    fn test_flush_and_reset() {
        let mut t = Throttle::new(ms(7));
        let start = Instant::now();
        t.offer(1, start);
        t.offer(2, start);
        assert_eq!(t.flush(), Some(2));

        t.offer(3, start);
        t.reset();
        assert!(!t.has_pending());
        assert_eq!(t.offer(4, start), Some(4));
    }
}
