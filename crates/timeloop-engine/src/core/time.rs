use std::time::Duration;

/// Most simulation ticks one host frame may run. A stalled tab catches up
/// this far and drops the rest of its backlog.
pub const MAX_TICKS_PER_FRAME: u32 = 10;

/// Turns the host's variable frame deltas into a whole number of simulation
/// ticks of `GameConfig::fixed_dt` seconds each.
///
/// The runner publishes the last completed tick, so leftover time below one
/// tick simply waits for the next host frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedTimestep {
    dt: f32,
    /// Host time not yet spent on ticks, in seconds.
    pending: f32,
}

impl FixedTimestep {
    pub fn new(dt: f32) -> Self {
        Self { dt, pending: 0.0 }
    }

    /// Bank `frame_dt` seconds and return how many ticks to run now.
    /// A non-positive tick length never steps.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        if self.dt <= 0.0 {
            return 0;
        }
        let budget = self.dt * MAX_TICKS_PER_FRAME as f32;
        self.pending = (self.pending + frame_dt.max(0.0)).min(budget);
        let ticks = (self.pending / self.dt) as u32;
        self.pending -= ticks as f32 * self.dt;
        ticks
    }

    /// Seconds banked towards the next tick.
    pub fn pending(&self) -> f32 {
        self.pending
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }
}

/// Monotonic game time, advanced only by ticks.
///
/// Cooldowns and timed actions compare against this instead of the wall clock,
/// so a session replays identically for the same input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameClock {
    now: Duration,
    ticks: u64,
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
        self.ticks += 1;
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_tick_per_matching_frame() {
        let mut ts = FixedTimestep::new(0.25);
        assert_eq!(ts.accumulate(0.25), 1);
        assert_eq!(ts.pending(), 0.0);
    }

    #[test]
    fn short_frames_bank_time() {
        let mut ts = FixedTimestep::new(0.25);
        assert_eq!(ts.accumulate(0.125), 0);
        assert_eq!(ts.pending(), 0.125);
        assert_eq!(ts.accumulate(0.25), 1);
        assert_eq!(ts.pending(), 0.125);
    }

    #[test]
    fn long_stall_is_capped() {
        let mut ts = FixedTimestep::new(0.25);
        assert_eq!(ts.accumulate(60.0), MAX_TICKS_PER_FRAME);
        assert_eq!(ts.accumulate(0.0), 0);
    }

    #[test]
    fn bad_deltas_never_step() {
        let mut ts = FixedTimestep::new(0.0);
        assert_eq!(ts.accumulate(1.0), 0);

        let mut ts = FixedTimestep::new(0.25);
        assert_eq!(ts.accumulate(-5.0), 0);
        assert_eq!(ts.pending(), 0.0);
    }

    #[test]
    fn clock_counts_ticks_and_time() {
        let mut clock = GameClock::new();
        clock.advance(Duration::from_millis(16));
        clock.advance(Duration::from_millis(16));
        assert_eq!(clock.ticks(), 2);
        assert_eq!(clock.now(), Duration::from_millis(32));

        clock.reset();
        assert_eq!(clock.ticks(), 0);
        assert_eq!(clock.now(), Duration::ZERO);
    }
}
