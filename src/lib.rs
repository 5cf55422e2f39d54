//! Abyss Swarm - submarine arena survival simulation core
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (entities, collisions, upgrades, spawning)
//! - `tuning`: Data-driven game balance
//! - `error`: Static data and command errors

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::{Result, SimError};
pub use tuning::Tuning;

use glam::Vec2;

/// Fixed simulation constants (balance knobs live in `Tuning`)
pub mod consts {
    /// Nominal frame step used by the native driver
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 16.0;
    pub const PLAYER_MOVE_SPEED: f32 = 200.0;
    pub const PLAYER_DAMAGE: f32 = 10.0;
    pub const PLAYER_FIRE_INTERVAL: f32 = 0.5;
    pub const PLAYER_MAGNET_RADIUS: f32 = 80.0;
    /// Floor for fire interval after multiplicative upgrades
    pub const MIN_FIRE_INTERVAL: f32 = 0.05;
    /// Damage reduction never exceeds this
    pub const MAX_DAMAGE_REDUCTION: f32 = 0.8;

    /// Projectile defaults
    pub const PROJECTILE_SPEED: f32 = 420.0;
    pub const PROJECTILE_DURATION: f32 = 1.4;
    pub const PROJECTILE_RADIUS: f32 = 5.0;
    /// Angular gap between multi-shot projectiles (radians)
    pub const MULTI_SHOT_SPREAD: f32 = 0.15;
    pub const CRIT_MULTIPLIER: f32 = 2.0;
    /// Freeze applied by a successful freeze roll (seconds)
    pub const FREEZE_DURATION: f32 = 1.5;

    /// Homing: seek radius and turn rate per unit of homing strength
    pub const HOMING_SEEK_RADIUS: f32 = 300.0;
    pub const HOMING_TURN_RATE: f32 = 4.0;

    /// Helical motion
    pub const HELIX_AMPLITUDE: f32 = 18.0;
    pub const HELIX_FREQUENCY: f32 = 12.0;

    /// Orbiting mines
    pub const MINE_ORBIT_RADIUS: f32 = 90.0;
    pub const MINE_ANGULAR_SPEED: f32 = 2.5;
    pub const MINE_RADIUS: f32 = 10.0;
    pub const MINE_HIT_COOLDOWN: f32 = 0.2;
    pub const MINE_DAMAGE_FACTOR: f32 = 0.8;
    pub const MINE_RECOVERY: f32 = 1.0;

    /// Oversized ("giant") torpedo multipliers
    pub const GIANT_BASE_INTERVAL: u32 = 8;
    pub const GIANT_MIN_INTERVAL: u32 = 3;
    pub const GIANT_DAMAGE_MULT: f32 = 3.0;
    pub const GIANT_PIERCE_MULT: u32 = 3;
    pub const GIANT_RADIUS_MULT: f32 = 2.5;
    pub const GIANT_KNOCKBACK_MULT: f32 = 3.0;
    pub const GIANT_EXPLOSION_MULT: f32 = 2.0;

    /// Scatter children
    pub const SCATTER_COUNT: usize = 3;
    pub const SCATTER_ANGLE: f32 = std::f32::consts::PI / 6.0;
    pub const SCATTER_JITTER: f32 = 0.1;
    pub const SCATTER_DAMAGE_FACTOR: f32 = 0.5;
    pub const SCATTER_DURATION_FACTOR: f32 = 0.5;
    pub const SCATTER_RADIUS_FACTOR: f32 = 0.7;

    /// Status effects
    pub const FROZEN_SPEED_FACTOR: f32 = 0.5;
    pub const KNOCKBACK_FRICTION: f32 = 0.9;
    pub const KNOCKBACK_FLOOR: f32 = 5.0;
    pub const DAMAGE_FLASH: f32 = 0.1;

    /// Hostile movement behaviors
    pub const WIGGLE_FREQUENCY: f32 = 6.0;
    pub const WIGGLE_STRENGTH: f32 = 0.8;
    pub const STOP_GO_MOVE: f32 = 1.0;
    pub const STOP_GO_REST: f32 = 0.6;

    /// Abilities
    pub const DEPTH_CHARGE_COOLDOWN: f32 = 3.0;
    pub const DEPTH_CHARGE_FUSE: f32 = 5.0;
    pub const DEPTH_CHARGE_RADIUS: f32 = 14.0;
    pub const DEPTH_CHARGE_BLAST: f32 = 70.0;
    pub const PLASMA_FIELD_INTERVAL: f32 = 0.5;
    pub const PLASMA_FIELD_RADIUS: f32 = 70.0;
    pub const SONAR_COOLDOWN: f32 = 6.0;
    pub const SONAR_RADIUS: f32 = 240.0;
    pub const SONAR_FREEZE: f32 = 1.0;

    /// Kill-heal
    pub const KILL_HEAL_AMOUNT: f32 = 5.0;

    /// Pickups
    pub const PICKUP_RADIUS: f32 = 6.0;

    /// Spawn weight when an archetype does not specify one
    pub const DEFAULT_SPAWN_WEIGHT: f32 = 10.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    (angle + PI).rem_euclid(TAU) - PI
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Rotate a vector counter-clockwise by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Unit vector perpendicular to `v` (zero for degenerate input)
#[inline]
pub fn perpendicular(v: Vec2) -> Vec2 {
    v.normalize_or_zero().perp()
}

/// Circle-circle overlap: strictly closer than the sum of radii
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) < ra + rb
}
