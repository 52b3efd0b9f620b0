use std::time::Duration;

/// Per-level countdown. Reaching zero is the game-over condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerManager {
    limit: Duration,
    elapsed: Duration,
    running: bool,
}

impl TimerManager {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            elapsed: Duration::ZERO,
            running: false,
        }
    }

    pub fn from_secs(secs: u32) -> Self {
        Self::new(Duration::from_secs(secs as u64))
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Rewind the countdown to its full limit. Does not change running state.
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance by one tick. Stops accumulating once expired.
    pub fn update(&mut self, dt: Duration) {
        if !self.running || self.is_expired() {
            return;
        }
        self.elapsed = self.elapsed.saturating_add(dt).min(self.limit);
    }

    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.elapsed)
    }

    /// Remaining whole seconds, rounded up so the display reads 1 until it hits 0.
    pub fn remaining_secs(&self) -> u32 {
        let remaining = self.remaining();
        let secs = remaining.as_secs() as u32;
        if remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.limit
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_only_while_running() {
        let mut t = TimerManager::from_secs(20);
        t.update(Duration::from_secs(1));
        assert_eq!(t.remaining(), Duration::from_secs(20));

        t.start();
        t.update(Duration::from_secs(2));
        assert_eq!(t.remaining(), Duration::from_secs(18));

        t.stop();
        t.update(Duration::from_secs(3));
        assert_eq!(t.remaining(), Duration::from_secs(18));
    }

    #[test]
    fn expires_at_limit_and_stays_there() {
        let mut t = TimerManager::from_secs(2);
        t.start();
        t.update(Duration::from_millis(1500));
        assert!(!t.is_expired());
        assert_eq!(t.remaining_secs(), 1);

        t.update(Duration::from_millis(600));
        assert!(t.is_expired());
        assert_eq!(t.remaining_secs(), 0);

        t.update(Duration::from_secs(5));
        assert_eq!(t.remaining(), Duration::ZERO);
    }

    #[test]
    fn reset_restores_full_time() {
        let mut t = TimerManager::from_secs(3);
        t.start();
        t.update(Duration::from_secs(3));
        assert!(t.is_expired());

        t.reset();
        assert!(!t.is_expired());
        assert_eq!(t.remaining_secs(), 3);
        assert!(t.is_running());
    }
}
