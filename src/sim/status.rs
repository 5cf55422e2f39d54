//! Per-hostile status effects and movement behaviors
//!
//! Freeze and knockback are independent: freeze only scales the hostile's own
//! movement, knockback displaces it on top of that movement.

use glam::Vec2;

use super::archetype::Behavior;
use super::state::Hostile;
use crate::consts::*;
use crate::perpendicular;

/// Status timers carried by every hostile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusEffects {
    /// Seconds of freeze remaining
    pub freeze: f32,
    /// Knockback velocity, attenuated each frame
    pub knockback: Vec2,
    /// Damage flash (cosmetic)
    pub flash: f32,
}

impl StatusEffects {
    /// Set the freeze timer, replacing whatever remained
    pub fn apply_freeze(&mut self, duration: f32) {
        self.freeze = duration.max(0.0);
    }

    /// Add an impulse to the current knockback velocity
    pub fn apply_knockback(&mut self, impulse: Vec2) {
        self.knockback += impulse;
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze > 0.0
    }

    /// Movement speed multiplier from freeze
    pub fn speed_factor(&self) -> f32 {
        if self.is_frozen() { FROZEN_SPEED_FACTOR } else { 1.0 }
    }

    /// Displacement from knockback this frame; attenuates the velocity
    pub fn step_knockback(&mut self, dt: f32) -> Vec2 {
        if self.knockback.length() < KNOCKBACK_FLOOR {
            self.knockback = Vec2::ZERO;
            return Vec2::ZERO;
        }
        let displacement = self.knockback * dt;
        self.knockback *= KNOCKBACK_FRICTION;
        displacement
    }

    /// Elapsed-time decay of freeze and flash
    pub fn decay(&mut self, dt: f32) {
        self.freeze = (self.freeze - dt).max(0.0);
        self.flash = (self.flash - dt).max(0.0);
    }
}

impl Hostile {
    /// Unit heading toward `target` for this hostile's behavior (zero when resting)
    pub fn heading(&self, target: Vec2) -> Vec2 {
        let to_target = (target - self.pos).normalize_or_zero();
        match self.archetype.behavior {
            Behavior::Chase => to_target,
            Behavior::Wiggle => {
                let sway = (self.age * WIGGLE_FREQUENCY).sin() * WIGGLE_STRENGTH;
                (to_target + perpendicular(to_target) * sway).normalize_or_zero()
            }
            Behavior::StopAndGo => {
                let phase = self.age % (STOP_GO_MOVE + STOP_GO_REST);
                if phase < STOP_GO_MOVE { to_target } else { Vec2::ZERO }
            }
        }
    }

    /// Base speed after status multipliers
    pub fn effective_speed(&self) -> f32 {
        self.archetype.speed * self.status.speed_factor()
    }

    /// Advance movement and status for one frame
    pub fn update(&mut self, target: Vec2, dt: f32) {
        if !self.active {
            return;
        }
        let heading = self.heading(target);
        self.pos += heading * self.effective_speed() * dt;
        self.pos += self.status.step_knockback(dt);
        self.status.decay(dt);
        self.age += dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::archetype::HostileArchetype;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn hostile(behavior: Behavior) -> Hostile {
        let archetype = HostileArchetype {
            speed: 100.0,
            behavior,
            ..HostileArchetype::fallback()
        };
        Hostile::new(1, Arc::new(archetype), Vec2::ZERO, 1.0)
    }

    #[test]
    fn test_freeze_overwrites_instead_of_stacking() {
        let mut status = StatusEffects::default();
        status.apply_freeze(2.0);
        status.apply_freeze(0.5);
        assert_eq!(status.freeze, 0.5);
        status.apply_freeze(1.5);
        assert_eq!(status.freeze, 1.5);
    }

    #[test]
    fn test_frozen_hostile_moves_at_half_speed() {
        let dt = 0.016;
        let mut free = hostile(Behavior::Chase);
        let mut frozen = hostile(Behavior::Chase);
        frozen.status.apply_freeze(1.0);
        assert_eq!(frozen.effective_speed(), free.effective_speed() * 0.5);

        let target = Vec2::new(1000.0, 0.0);
        free.update(target, dt);
        frozen.update(target, dt);
        assert!((free.pos.x - 100.0 * dt).abs() < 1e-5);
        assert!((frozen.pos.x - 50.0 * dt).abs() < 1e-5);
    }

    #[test]
    fn test_freeze_decays_by_elapsed_time() {
        let mut h = hostile(Behavior::Chase);
        h.status.apply_freeze(0.1);
        h.update(Vec2::X, 0.06);
        assert!((h.status.freeze - 0.04).abs() < 1e-6);
        h.update(Vec2::X, 0.06);
        assert_eq!(h.status.freeze, 0.0);
        assert_eq!(h.effective_speed(), 100.0);
    }

    #[test]
    fn test_knockback_below_floor_is_ignored() {
        let mut status = StatusEffects::default();
        status.apply_knockback(Vec2::new(KNOCKBACK_FLOOR * 0.5, 0.0));
        assert_eq!(status.step_knockback(0.016), Vec2::ZERO);
        assert_eq!(status.knockback, Vec2::ZERO);
    }

    #[test]
    fn test_knockback_is_additive() {
        let mut status = StatusEffects::default();
        status.apply_knockback(Vec2::new(100.0, 0.0));
        status.apply_knockback(Vec2::new(0.0, 50.0));
        assert_eq!(status.knockback, Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_stop_and_go_rests() {
        let mut h = hostile(Behavior::StopAndGo);
        h.age = STOP_GO_MOVE + STOP_GO_REST * 0.5;
        assert_eq!(h.heading(Vec2::new(10.0, 0.0)), Vec2::ZERO);
        h.age = 0.0;
        assert_eq!(h.heading(Vec2::new(10.0, 0.0)), Vec2::X);
    }

    #[test]
    fn test_wiggle_still_pursues() {
        let mut h = hostile(Behavior::Wiggle);
        for _ in 0..120 {
            h.update(Vec2::new(500.0, 0.0), 1.0 / 60.0);
        }
        assert!(h.pos.x > 50.0);
        assert!(h.pos.y.abs() < h.pos.x);
    }

    #[test]
    fn test_hostile_on_target_does_not_nan() {
        let mut h = hostile(Behavior::Wiggle);
        h.update(Vec2::ZERO, 0.016);
        assert!(h.pos.is_finite());
    }

    proptest! {
        #[test]
        fn prop_knockback_strictly_decays_until_floor(
            x in -2000.0f32..2000.0,
            y in -2000.0f32..2000.0,
            dt in 0.001f32..0.05,
        ) {
            let mut status = StatusEffects::default();
            status.apply_knockback(Vec2::new(x, y));
            let mut previous = status.knockback.length();
            for _ in 0..500 {
                let moved = status.step_knockback(dt);
                let now = status.knockback.length();
                if now == 0.0 {
                    prop_assert!(previous < KNOCKBACK_FLOOR || moved != Vec2::ZERO);
                    break;
                }
                prop_assert!(now < previous);
                prop_assert!((now - previous * KNOCKBACK_FRICTION).abs() <= previous * 1e-4);
                previous = now;
            }
            // Once settled, residual knockback never moves the hostile
            for _ in 0..5 {
                prop_assert_eq!(status.step_knockback(dt), Vec2::ZERO);
            }
        }
    }
}
