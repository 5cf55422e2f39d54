//! Player update: movement, cooldown-gated firing and timed abilities
//!
//! Abilities that act on an area (plasma field, sonar) don't touch hostiles
//! here; they return a `Pulse` that the collision pass resolves later in the
//! same frame.

use glam::Vec2;
use rand::Rng;

use super::projectile::{Motion, Projectile};
use super::state::{FrameCtx, Player, World};
use crate::consts::*;
use crate::rotate;

/// Input already resolved by the platform layer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Movement axes, each in [-1, 1]
    pub move_axis: Vec2,
    /// Aim target in world space
    pub aim: Vec2,
}

/// Area effect produced by an ability this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pulse {
    /// Damage everything in range
    Burn { center: Vec2, radius: f32, damage: f32 },
    /// Damage and freeze everything in range
    Ping {
        center: Vec2,
        radius: f32,
        damage: f32,
        freeze: f32,
    },
}

/// Update the player for one frame; returns area pulses to resolve
pub fn update_player(world: &mut World, input: &TickInput, ctx: &mut FrameCtx, dt: f32) -> Vec<Pulse> {
    let player = &mut world.player;

    let axis = input.move_axis.clamp(Vec2::NEG_ONE, Vec2::ONE);
    player.pos += axis.normalize_or_zero() * player.stats.move_speed * dt;

    let aim = (input.aim - player.pos).normalize_or_zero();
    if aim != Vec2::ZERO {
        player.facing = aim;
    }

    let mut shots = Vec::new();
    player.timers.fire -= dt;
    if player.timers.fire <= 0.0 {
        player.timers.fire = player.stats.fire_interval;
        shots = fire_volley(player, ctx);
    }

    let mut pulses = Vec::new();
    let stats = player.stats.clone();

    if stats.depth_charge > 0 {
        player.timers.depth_charge -= dt;
        if player.timers.depth_charge <= 0.0 {
            let level = stats.depth_charge as f32;
            player.timers.depth_charge = DEPTH_CHARGE_COOLDOWN / (1.0 + 0.15 * (level - 1.0));
            shots.push(depth_charge(player));
        }
    }

    if stats.plasma_field > 0 {
        player.timers.plasma_field -= dt;
        if player.timers.plasma_field <= 0.0 {
            let level = stats.plasma_field as f32;
            player.timers.plasma_field = PLASMA_FIELD_INTERVAL;
            pulses.push(Pulse::Burn {
                center: player.pos,
                radius: PLASMA_FIELD_RADIUS + 15.0 * (level - 1.0),
                damage: stats.damage * 0.4 * level,
            });
        }
    }

    if stats.sonar > 0 {
        player.timers.sonar -= dt;
        if player.timers.sonar <= 0.0 {
            let level = stats.sonar as f32;
            player.timers.sonar = SONAR_COOLDOWN * 0.9f32.powf(level - 1.0);
            pulses.push(Pulse::Ping {
                center: player.pos,
                radius: SONAR_RADIUS + 40.0 * (level - 1.0),
                damage: stats.damage * 0.5,
                freeze: SONAR_FREEZE + 0.25 * (level - 1.0),
            });
        }
    }

    for shot in shots {
        world.spawn_projectile(shot);
    }
    pulses
}

/// Every Nth shot is oversized; N shrinks with the giant-torpedo level
pub fn giant_interval(level: u32) -> u32 {
    GIANT_BASE_INTERVAL.saturating_sub(level).max(GIANT_MIN_INTERVAL)
}

/// Forward fan plus rear guns
fn fire_volley(player: &mut Player, ctx: &mut FrameCtx) -> Vec<Projectile> {
    player.shots_fired += 1;
    let stats = &player.stats;
    let giant = stats.giant_torpedo > 0 && player.shots_fired % giant_interval(stats.giant_torpedo) == 0;

    let forward = 1 + stats.multi_shot;
    let mut volley = Vec::with_capacity((forward + stats.rear_gun) as usize);
    for offset in fan_offsets(forward) {
        let mut shot = make_shot(player, rotate(player.facing, offset), ctx);
        if giant {
            shot.make_giant();
        }
        volley.push(shot);
    }
    for offset in fan_offsets(stats.rear_gun) {
        volley.push(make_shot(player, rotate(-player.facing, offset), ctx));
    }
    volley
}

/// Angular offsets for `count` projectiles centered on the aim line
fn fan_offsets(count: u32) -> impl Iterator<Item = f32> {
    let half = count.saturating_sub(1) as f32 / 2.0;
    (0..count).map(move |i| (i as f32 - half) * MULTI_SHOT_SPREAD)
}

/// One projectile carrying the player's current stats
fn make_shot(player: &Player, dir: Vec2, ctx: &mut FrameCtx) -> Projectile {
    let stats = &player.stats;
    let crit = stats.crit_chance > 0.0 && ctx.rng.random::<f32>() < stats.crit_chance;
    let frozen = stats.freeze_chance > 0.0 && ctx.rng.random::<f32>() < stats.freeze_chance;

    let mut shot = Projectile::new(
        player.pos,
        dir * PROJECTILE_SPEED * stats.projectile_speed,
        PROJECTILE_RADIUS * stats.projectile_size,
        stats.damage * if crit { CRIT_MULTIPLIER } else { 1.0 },
        PROJECTILE_DURATION * stats.projectile_range,
    );
    shot.pierce = stats.pierce;
    shot.explosion_radius = stats.explosion_radius;
    shot.knockback = stats.knockback;
    shot.freeze = if frozen { FREEZE_DURATION } else { 0.0 };
    shot.scatter = stats.scatter > 0;
    shot.motion = if stats.homing_strength > 0.0 {
        Motion::Homing {
            turn_rate: HOMING_TURN_RATE * stats.homing_strength,
        }
    } else if stats.helix > 0 {
        Motion::Helical {
            amplitude: HELIX_AMPLITUDE * stats.helix as f32,
            frequency: HELIX_FREQUENCY,
        }
    } else {
        Motion::Linear
    };
    shot
}

/// Stationary explosive charge dropped in the player's wake
fn depth_charge(player: &Player) -> Projectile {
    let level = player.stats.depth_charge as f32;
    let mut charge = Projectile::new(
        player.pos - player.facing * (player.radius + DEPTH_CHARGE_RADIUS),
        Vec2::ZERO,
        DEPTH_CHARGE_RADIUS,
        player.stats.damage * (2.0 + level),
        DEPTH_CHARGE_FUSE,
    );
    charge.explosion_radius = DEPTH_CHARGE_BLAST + 15.0 * (level - 1.0);
    charge.fused = true;
    charge
}
