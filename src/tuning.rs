//! Game balance tuning
//!
//! Every field has a default so a partial JSON document only overrides what
//! it names.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Data-driven balance knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Viewport (spawn placement) ===
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Extra distance past the viewport's half diagonal
    pub spawn_margin: f32,

    // === Spawn pacing ===
    /// Seconds between spawns at level 1
    pub spawn_interval: f32,
    pub min_spawn_interval: f32,
    /// Fractional spawn-rate increase per level
    pub spawn_acceleration: f32,
    pub max_hostiles: usize,
    /// Fractional hostile hp increase per level
    pub hostile_hp_growth: f32,
    /// Contact damage per second for archetypes that don't set one
    pub contact_dps: f32,
    /// Level at which the boss enters (0 disables the boss)
    pub boss_level: u32,

    // === Player ===
    pub player_hp: f32,
    pub magnet_pull_speed: f32,

    // === Progression ===
    pub xp_threshold: u32,
    pub xp_growth: f32,
    pub upgrade_choices: usize,
    /// Rarity roll above this is legendary
    pub legendary_threshold: f32,
    /// Rarity roll above this (and not legendary) is rare
    pub rare_threshold: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            viewport_height: 720.0,
            spawn_margin: 60.0,

            spawn_interval: 1.0,
            min_spawn_interval: 0.2,
            spawn_acceleration: 0.08,
            max_hostiles: 300,
            hostile_hp_growth: 0.1,
            contact_dps: 20.0,
            boss_level: 15,

            player_hp: 100.0,
            magnet_pull_speed: 360.0,

            xp_threshold: 10,
            xp_growth: 1.2,
            upgrade_choices: 3,
            legendary_threshold: 0.95,
            rare_threshold: 0.75,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Half the viewport diagonal plus the spawn margin
    pub fn spawn_distance(&self) -> f32 {
        0.5 * self.viewport_width.hypot(self.viewport_height) + self.spawn_margin
    }

    /// Seconds between spawns at the given level (never below 10 ms)
    pub fn spawn_interval_at(&self, level: u32) -> f32 {
        let ramp = 1.0 + self.spawn_acceleration.max(0.0) * level.saturating_sub(1) as f32;
        (self.spawn_interval / ramp).max(self.min_spawn_interval).max(0.01)
    }

    /// Hostile hp multiplier at the given level
    pub fn hp_scale_at(&self, level: u32) -> f32 {
        1.0 + self.hostile_hp_growth * level.saturating_sub(1) as f32
    }
}
