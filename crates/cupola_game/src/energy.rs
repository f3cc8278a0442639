//! Discrete energy meter drained by accumulated walking time.
//!
//! Only two operations change the level: [`Energy::deplete_step`] and
//! [`Energy::restore_full`]. Walking time accumulates across frames and idle
//! periods; it is never reset by standing still, only by paying out whole
//! thresholds or by a full restore.

pub const MAX_ENERGY: u8 = 10;
pub const WALK_SECONDS_PER_STEP: f32 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Energy {
    level: u8,
    walk_accum: f32,
}

impl Energy {
    pub fn full() -> Self {
        Self {
            level: MAX_ENERGY,
            walk_accum: 0.0,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn walk_accum(&self) -> f32 {
        self.walk_accum
    }

    pub fn is_empty(&self) -> bool {
        self.level == 0
    }

    pub fn deplete_step(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    pub fn restore_full(&mut self) {
        self.level = MAX_ENERGY;
        self.walk_accum = 0.0;
    }

    /// Credit `dt` seconds of walking and pay out every full threshold.
    /// Returns how many levels were lost this call. An empty meter stops
    /// accumulating.
    pub fn record_walk(&mut self, dt: f32) -> u32 {
        if self.level == 0 || dt <= 0.0 {
            return 0;
        }
        self.walk_accum += dt;
        let mut lost = 0;
        while self.walk_accum >= WALK_SECONDS_PER_STEP && self.level > 0 {
            self.walk_accum -= WALK_SECONDS_PER_STEP;
            self.deplete_step();
            lost += 1;
        }
        lost
    }

    /// Index into an 11-entry icon strip ordered full (0) to empty (10).
    pub fn hud_index(&self) -> usize {
        (MAX_ENERGY - self.level.min(MAX_ENERGY)) as usize
    }

    pub fn label(&self) -> String {
        format!("Energy: {}/{}", self.level, MAX_ENERGY)
    }
}

impl Default for Energy {
    fn default() -> Self {
        Self::full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nine_seconds_of_walking_costs_three_levels() {
        let mut energy = Energy::full();
        for _ in 0..9 {
            energy.record_walk(1.0);
        }
        assert_eq!(energy.level(), 7);
        assert_eq!(energy.walk_accum(), 0.0);
    }

    #[test]
    fn one_long_frame_can_deplete_several_levels() {
        let mut energy = Energy::full();
        assert_eq!(energy.record_walk(9.5), 3);
        assert_eq!(energy.level(), 7);
        assert!((energy.walk_accum() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn accumulator_persists_between_walks() {
        let mut energy = Energy::full();
        energy.record_walk(2.0);
        // Standing still does not touch the meter.
        assert_eq!(energy.level(), 10);
        energy.record_walk(1.0);
        assert_eq!(energy.level(), 9);
    }

    #[test]
    fn level_never_leaves_range() {
        let mut energy = Energy::full();
        for _ in 0..200 {
            energy.record_walk(0.7);
            assert!(energy.level() <= MAX_ENERGY);
        }
        assert_eq!(energy.level(), 0);
        energy.deplete_step();
        assert_eq!(energy.level(), 0);
        assert_eq!(energy.record_walk(10.0), 0);
    }

    #[test]
    fn level_is_non_increasing_while_walking() {
        let mut energy = Energy::full();
        let mut last = energy.level();
        for i in 0..100 {
            energy.record_walk(0.05 * (i % 7) as f32);
            assert!(energy.level() <= last);
            last = energy.level();
        }
    }

    #[test]
    fn restore_full_resets_level_and_accumulator() {
        let mut energy = Energy::full();
        energy.record_walk(7.0);
        energy.restore_full();
        assert_eq!(energy, Energy::full());
    }

    #[test]
    fn hud_index_and_label_follow_level() {
        let mut energy = Energy::full();
        assert_eq!(energy.hud_index(), 0);
        energy.record_walk(6.0);
        assert_eq!(energy.hud_index(), 2);
        assert_eq!(energy.label(), "Energy: 8/10");
    }
}
