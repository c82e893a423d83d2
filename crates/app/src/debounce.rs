//! Deadline-tracked debouncing with a maximum wait.
//!
//! Each activity pushes the quiet deadline out by `wait`; the first activity
//! of a burst also fixes a ceiling `max_wait` later. The pending flush is due
//! at whichever comes first, so continuous activity still flushes at least
//! once per `max_wait`.

use std::time::Duration;

use tokio::time::Instant;

/// Debounce timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Quiet window after the last activity.
    pub wait: Duration,
    /// Upper bound between the first activity of a burst and the flush.
    pub max_wait: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            wait: Duration::from_millis(400),
            max_wait: Duration::from_millis(700),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    quiet_until: Instant,
    flush_by: Instant,
}

/// Debounce state machine: idle, or pending with two deadlines.
#[derive(Debug)]
pub struct Debouncer {
    config: DebounceConfig,
    pending: Option<Pending>,
}

impl Debouncer {
    #[must_use]
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            pending: None,
        }
    }

    /// Record activity at `now`.
    pub fn schedule(&mut self, now: Instant) {
        let quiet_until = now + self.config.wait;
        self.pending = Some(match self.pending {
            Some(pending) => Pending {
                quiet_until,
                flush_by: pending.flush_by,
            },
            None => Pending {
                quiet_until,
                flush_by: now + self.config.max_wait,
            },
        });
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending flush is due.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
            .map(|pending| pending.quiet_until.min(pending.flush_by))
    }

    /// Whether a flush is due at `now`. Returns to idle when it is.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if deadline <= now => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn should_start_idle() {
        let debouncer = Debouncer::new(DebounceConfig::default());
        assert!(!debouncer.is_pending());
        assert!(debouncer.deadline().is_none());
    }

    #[test]
    fn should_flush_after_quiet_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DebounceConfig::default());
        debouncer.schedule(start);

        assert!(!debouncer.poll(start + ms(399)));
        assert!(debouncer.poll(start + ms(400)));
        assert!(!debouncer.is_pending());
        assert!(!debouncer.poll(start + ms(800)));
    }

    #[test]
    fn should_extend_quiet_window_on_activity() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DebounceConfig::default());
        debouncer.schedule(start);
        debouncer.schedule(start + ms(200));

        assert_eq!(debouncer.deadline(), Some(start + ms(600)));
        assert!(!debouncer.poll(start + ms(500)));
        assert!(debouncer.poll(start + ms(600)));
    }

    #[test]
    fn should_cap_wait_under_continuous_activity() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DebounceConfig::default());
        for step in 0..7 {
            debouncer.schedule(start + ms(step * 100));
        }
        assert_eq!(debouncer.deadline(), Some(start + ms(700)));
        assert!(debouncer.poll(start + ms(700)));
    }

    #[test]
    fn should_start_new_ceiling_after_flush() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DebounceConfig::default());
        debouncer.schedule(start);
        assert!(debouncer.poll(start + ms(400)));

        debouncer.schedule(start + ms(500));
        assert_eq!(debouncer.deadline(), Some(start + ms(900)));
    }
}
