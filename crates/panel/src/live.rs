// "Live" badge: on after each applied snapshot, off after a grace period
// without one.

use std::time::Duration;

use tokio::time::Instant;

pub const DEFAULT_LIVE_GRACE_MS: u64 = 5000;

#[derive(Debug, Clone)]
pub struct LiveIndicator {
    grace: Duration,
    until: Option<Instant>,
}

impl Default for LiveIndicator {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_LIVE_GRACE_MS))
    }
}

impl LiveIndicator {
    pub fn new(grace: Duration) -> Self {
        Self { grace, until: None }
    }

    /// A snapshot arrived.
    pub fn mark(&mut self, now: Instant) {
        self.until = Some(now + self.grace);
    }

    pub fn is_live(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now < until)
    }

    /// Turn the badge off once the grace period passed. Returns true on the
    /// transition.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.until {
            Some(until) if now >= until => {
                self.until = None;
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.until
    }

    pub fn clear(&mut self) {
        self.until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_until_first_snapshot() {
        let live = LiveIndicator::default();
        assert!(!live.is_live(Instant::now()));
        assert_eq!(live.next_deadline(), None);
    }

    #[test]
    fn each_snapshot_extends_grace() {
        let mut live = LiveIndicator::default();
        let now = Instant::now();

        live.mark(now);
        live.mark(now + Duration::from_millis(3000));

        assert!(live.is_live(now + Duration::from_millis(7999)));
        assert!(!live.is_live(now + Duration::from_millis(8000)));
    }

    #[test]
    fn expire_reports_transition_once() {
        let mut live = LiveIndicator::new(Duration::from_millis(10));
        let now = Instant::now();

        live.mark(now);
        assert!(!live.expire(now + Duration::from_millis(5)));
        assert!(live.expire(now + Duration::from_millis(10)));
        assert!(!live.expire(now + Duration::from_millis(20)));
    }
}
