//! Timed sleep sequence that refills energy when it completes.

pub const DEFAULT_SLEEP_SECONDS: f32 = 8.0;
/// Number of discrete bar images minus one.
pub const SLEEP_BAR_STEPS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SleepTick {
    Running { progress: f32, bar_index: usize },
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SleepSequence {
    elapsed: f32,
    duration: f32,
}

impl SleepSequence {
    pub fn new(duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration: duration.max(f32::EPSILON),
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn progress(&self) -> f32 {
        (self.elapsed / self.duration).min(1.0)
    }

    /// Which of the 11 bar images (0%..100%) to show.
    pub fn bar_index(&self) -> usize {
        ((self.progress() * SLEEP_BAR_STEPS as f32).round() as usize).min(SLEEP_BAR_STEPS)
    }

    pub fn is_done(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn advance(&mut self, dt: f32) -> SleepTick {
        self.elapsed += dt.max(0.0);
        if self.is_done() {
            SleepTick::Finished
        } else {
            SleepTick::Running {
                progress: self.progress(),
                bar_index: self.bar_index(),
            }
        }
    }
}

impl Default for SleepSequence {
    fn default() -> Self {
        Self::new(DEFAULT_SLEEP_SECONDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halfway_shows_middle_bar_image() {
        let mut sleep = SleepSequence::new(8.0);
        let tick = sleep.advance(4.0);
        assert_eq!(
            tick,
            SleepTick::Running {
                progress: 0.5,
                bar_index: 5
            }
        );
    }

    #[test]
    fn finishes_once_elapsed_reaches_duration() {
        let mut sleep = SleepSequence::new(8.0);
        assert!(matches!(sleep.advance(7.99), SleepTick::Running { .. }));
        assert_eq!(sleep.advance(0.01), SleepTick::Finished);
        assert_eq!(sleep.bar_index(), 10);
    }

    #[test]
    fn progress_is_capped_at_one() {
        let mut sleep = SleepSequence::new(2.0);
        sleep.advance(5.0);
        assert_eq!(sleep.progress(), 1.0);
        assert_eq!(sleep.bar_index(), SLEEP_BAR_STEPS);
    }

    #[test]
    fn bar_index_rounds_to_nearest_step() {
        let mut sleep = SleepSequence::new(10.0);
        sleep.advance(0.4);
        assert_eq!(sleep.bar_index(), 0);
        sleep.advance(0.2);
        assert_eq!(sleep.bar_index(), 1);
    }

    #[test]
    fn negative_dt_does_not_rewind() {
        let mut sleep = SleepSequence::default();
        sleep.advance(1.0);
        sleep.advance(-5.0);
        assert_eq!(sleep.elapsed(), 1.0);
        assert_eq!(sleep.duration(), DEFAULT_SLEEP_SECONDS);
    }
}
