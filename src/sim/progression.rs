//! Score, xp and level bookkeeping

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progression {
    pub score: u64,
    pub level: u32,
    pub xp: u32,
    /// Xp needed for the next level
    pub xp_to_next: u32,
    growth: f32,
}

impl Progression {
    pub fn new(threshold: u32, growth: f32) -> Self {
        Self {
            score: 0,
            level: 1,
            xp: 0,
            xp_to_next: threshold.max(1),
            growth: if growth.is_finite() && growth > 0.0 { growth } else { 1.0 },
        }
    }

    /// Add xp; returns how many levels were gained
    ///
    /// Overflow carries into the next level, so a large intake can cross
    /// several thresholds at once.
    pub fn add_xp(&mut self, amount: u32) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        let mut gained = 0;
        while self.xp >= self.xp_to_next {
            self.xp -= self.xp_to_next;
            self.level += 1;
            self.xp_to_next = next_threshold(self.xp_to_next, self.growth);
            gained += 1;
        }
        if gained > 0 {
            log::info!("Level {} reached (next at {} xp)", self.level, self.xp_to_next);
        }
        gained
    }

    pub fn add_score(&mut self, amount: u64) {
        self.score = self.score.saturating_add(amount);
    }
}

/// floor(threshold × growth)
///
/// Small thresholds can stay put (floor(4 × 1.2) = 4); only zero is
/// lifted, since a zero threshold would level up forever.
fn next_threshold(threshold: u32, growth: f32) -> u32 {
    ((threshold as f32 * growth).floor() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_level_up_exactly_at_threshold() {
        let mut p = Progression::new(10, 1.2);
        assert_eq!(p.add_xp(9), 0);
        assert_eq!(p.level, 1);
        assert_eq!(p.add_xp(1), 1);
        assert_eq!(p.level, 2);
        assert_eq!(p.xp, 0);
        assert_eq!(p.xp_to_next, 12);
    }

    #[test]
    fn test_overflow_carries_over() {
        let mut p = Progression::new(10, 1.2);
        assert_eq!(p.add_xp(15), 1);
        assert_eq!(p.xp, 5);
        assert_eq!(p.xp_to_next, 12);
    }

    #[test]
    fn test_large_intake_crosses_several_thresholds() {
        let mut p = Progression::new(10, 1.2);
        // 10 + 12 + 14 = 36
        assert_eq!(p.add_xp(40), 3);
        assert_eq!(p.level, 4);
        assert_eq!(p.xp, 4);
        assert_eq!(p.xp_to_next, 16);
    }

    #[test]
    fn test_threshold_is_floored_product() {
        assert_eq!(next_threshold(1, 1.2), 1);
        assert_eq!(next_threshold(3, 1.2), 3);
        assert_eq!(next_threshold(5, 1.2), 6);
        assert_eq!(next_threshold(100, 1.2), 120);
        assert_eq!(next_threshold(1, 0.5), 1);
    }

    #[test]
    fn test_small_base_threshold_does_not_grow() {
        let mut p = Progression::new(3, 1.2);
        assert_eq!(p.add_xp(3), 1);
        assert_eq!(p.xp_to_next, 3);
        // 3 + 3 + 3
        assert_eq!(p.add_xp(10), 3);
        assert_eq!(p.level, 5);
        assert_eq!(p.xp, 1);
        assert_eq!(p.xp_to_next, 3);
    }

    proptest! {
        #[test]
        fn prop_threshold_grows_by_floor_factor(start in 1u32..5000, intake in 0u32..100_000) {
            let mut p = Progression::new(start, 1.2);
            let before = p.clone();
            let gained = p.add_xp(intake);
            if intake < start {
                prop_assert_eq!(gained, 0);
                prop_assert_eq!(p.xp, intake);
            } else {
                prop_assert!(gained >= 1);
            }
            // Replay: each crossing subtracts the old threshold and grows it
            let mut xp = before.xp + intake;
            let mut threshold = before.xp_to_next;
            for _ in 0..gained {
                prop_assert!(xp >= threshold);
                xp -= threshold;
                threshold = threshold * 6 / 5;
            }
            prop_assert_eq!(p.xp, xp);
            prop_assert_eq!(p.xp_to_next, threshold);
            prop_assert!(p.xp < p.xp_to_next);
            prop_assert_eq!(p.level, 1 + gained);
        }
    }
}
