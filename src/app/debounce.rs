// src/app/debounce.rs
use std::time::{Duration, Instant};

/// Turns a burst of raw search-box updates into one stable query.
///
/// The clock is passed in by the caller so the event loop (and tests) decide
/// what "now" is.
pub struct Debouncer {
    window: Duration,
    latest: Option<String>,
    last_update: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            latest: None,
            last_update: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a raw update; restarts the quiet window.
    pub fn push(&mut self, raw: impl Into<String>, now: Instant) {
        self.latest = Some(raw.into());
        self.last_update = Some(now);
    }

    pub fn pending(&self) -> bool {
        self.latest.is_some()
    }

    /// Emit the latest raw value once the window has passed without updates.
    /// Each quiet period yields at most one value.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let last = self.last_update?;
        if now.saturating_duration_since(last) < self.window {
            return None;
        }
        self.last_update = None;
        self.latest.take()
    }

    /// Time left until the pending value fires, if any.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let last = self.last_update?;
        Some(self.window.saturating_sub(now.saturating_duration_since(last)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn no_updates_no_emission() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(750));
        assert_eq!(d.poll(t0), None);
        assert_eq!(d.poll(t0 + ms(5_000)), None);
        assert!(!d.pending());
    }

    #[test]
    fn burst_coalesces_to_last_value() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(750));
        d.push("bat", t0);
        d.push("batm", t0 + ms(100));
        d.push("batman", t0 + ms(200));

        // polled every 50ms through the burst and beyond
        let mut emitted = Vec::new();
        for step in 0..40u64 {
            if let Some(q) = d.poll(t0 + ms(step * 50)) {
                emitted.push(q);
            }
        }
        assert_eq!(emitted, vec!["batman".to_string()]);
    }

    #[test]
    fn fires_exactly_at_window_edge() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(750));
        d.push("dune", t0);
        assert_eq!(d.poll(t0 + ms(749)), None);
        assert_eq!(d.poll(t0 + ms(750)).as_deref(), Some("dune"));
        assert_eq!(d.poll(t0 + ms(2_000)), None);
    }

    #[test]
    fn updates_slower_than_window_each_emit() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(750));
        d.push("a", t0);
        assert_eq!(d.poll(t0 + ms(800)).as_deref(), Some("a"));
        d.push("ab", t0 + ms(900));
        assert_eq!(d.remaining(t0 + ms(1_000)), Some(ms(650)));
        assert_eq!(d.poll(t0 + ms(1_700)).as_deref(), Some("ab"));
    }

    #[test]
    fn keeps_emitted_value_after_new_push() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(ms(750));
        d.push("first", t0);
        let fired = d.poll(t0 + ms(750));
        d.push("second", t0 + ms(760));
        assert_eq!(fired.as_deref(), Some("first"));
        assert_eq!(d.poll(t0 + ms(1_000)), None);
    }
}
