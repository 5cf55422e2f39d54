//! Collision detection and response
//!
//! Every test is circle-circle. Passes run in a fixed order each frame and
//! only flip `active` flags; nothing is removed from a collection until
//! `World::compact`.
//!
//! A projectile resolves against the first overlapping hostile in
//! collection order, not the nearest one. That makes hits order-dependent
//! when several hostiles overlap the same projectile.

use glam::Vec2;
use rand_pcg::Pcg32;

use super::projectile::Blast;
use super::state::{Hostile, Kill, World};
use super::weapons::Pulse;
use crate::circles_overlap;
use crate::tuning::Tuning;

/// Pass 1: continuous contact damage; returns hp the player lost
pub fn player_vs_hostiles(world: &mut World, tuning: &Tuning, dt: f32) -> f32 {
    let player = &world.player;
    let incoming: f32 = world
        .hostiles
        .iter()
        .filter(|h| h.active && circles_overlap(player.pos, player.radius, h.pos, h.radius))
        .map(|h| h.archetype.contact_dps.unwrap_or(tuning.contact_dps) * dt)
        .sum();
    if incoming <= 0.0 {
        return 0.0;
    }
    world.player.take_damage(incoming)
}

/// Pass 2: projectiles against hostiles; returns the kills it caused
pub fn projectiles_vs_hostiles(world: &mut World, rng: &mut Pcg32) -> Vec<Kill> {
    let mut kills = Vec::new();
    let mut children = Vec::new();
    let hostiles = &mut world.hostiles;

    for projectile in &mut world.projectiles {
        if !projectile.active || projectile.is_recovering() {
            continue;
        }
        let target = hostiles.iter().position(|h| {
            h.active
                && projectile.can_hit(h)
                && circles_overlap(projectile.pos, projectile.radius, h.pos, h.radius)
        });
        let Some(index) = target else {
            continue;
        };

        let hostile = &mut hostiles[index];
        kills.extend(hostile.take_damage(projectile.damage));
        let effects = projectile.on_hit(hostile, rng);
        if let Some(blast) = effects.blast {
            kills.extend(area_damage(hostiles, blast));
        }
        children.extend(effects.children);
    }

    for child in children {
        world.spawn_projectile(child);
    }
    kills
}

/// Ability pulses, resolved after the projectile pass
pub fn resolve_pulses(world: &mut World, pulses: &[Pulse]) -> Vec<Kill> {
    let mut kills = Vec::new();
    for pulse in pulses {
        match *pulse {
            Pulse::Burn {
                center,
                radius,
                damage,
            } => kills.extend(area_damage(
                &mut world.hostiles,
                Blast {
                    center,
                    radius,
                    damage,
                },
            )),
            Pulse::Ping {
                center,
                radius,
                damage,
                freeze,
            } => {
                for hostile in in_radius(&mut world.hostiles, center, radius) {
                    hostile.status.apply_freeze(freeze);
                    kills.extend(hostile.take_damage(damage));
                }
            }
        }
    }
    kills
}

/// Damage every active hostile (boss included) touched by the blast
pub fn area_damage(hostiles: &mut [Hostile], blast: Blast) -> Vec<Kill> {
    in_radius(hostiles, blast.center, blast.radius)
        .filter_map(|h| h.take_damage(blast.damage))
        .collect()
}

fn in_radius(
    hostiles: &mut [Hostile],
    center: Vec2,
    radius: f32,
) -> impl Iterator<Item = &mut Hostile> {
    hostiles
        .iter_mut()
        .filter(move |h| h.active && circles_overlap(center, radius, h.pos, h.radius))
}

/// Pass 3: collect overlapping pickups; returns their total raw value
pub fn player_vs_pickups(world: &mut World) -> u32 {
    let player = &world.player;
    let mut collected = 0u32;
    for pickup in &mut world.pickups {
        if pickup.active && circles_overlap(player.pos, player.radius, pickup.pos, pickup.radius) {
            pickup.active = false;
            collected = collected.saturating_add(pickup.value);
        }
    }
    collected
}
