use crate::shared::constants;

/// Purely local shot clock.
///
/// Unlike the match clock it keeps no remote state and simply counts ticks
/// down from its full time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotClock {
    full_time: u32,
    time_left: u32,
    running: bool,
}

impl ShotClock {
    pub fn new(full_time: u32) -> Self {
        Self {
            full_time,
            time_left: full_time,
            running: false,
        }
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Final seconds, shown in the warning color.
    pub fn is_warning(&self) -> bool {
        self.time_left <= constants::SHOT_CLOCK_WARNING_SECS
    }

    /// An expired, stopped clock can only be reset.
    pub fn can_toggle(&self) -> bool {
        self.running || self.time_left > 0
    }

    pub fn toggle(&mut self) {
        if self.can_toggle() {
            self.running = !self.running;
        }
    }

    /// Back to full time, counting immediately.
    pub fn reset(&mut self) {
        self.time_left = self.full_time;
        self.running = self.full_time > 0;
    }

    /// One second passed. Stops itself on reaching zero.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.running = false;
        }
    }
}

impl Default for ShotClock {
    fn default() -> Self {
        Self::new(constants::DEFAULT_SHOT_CLOCK_SECS)
    }
}
