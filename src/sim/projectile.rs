//! Projectile behaviors
//!
//! Every projectile shares one update/on-hit interface; the motion variant
//! carries whatever extra state that behavior needs. Oversized ("giant")
//! torpedoes are a flag on top of linear or homing motion.

use std::collections::{HashMap, HashSet};

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::state::{EntityId, Hostile, Player};
use crate::consts::*;
use crate::{normalize_angle, perpendicular, polar_to_cartesian, rotate};

/// Orbiting mine state
#[derive(Debug, Clone, PartialEq)]
pub struct Orbit {
    pub angle: f32,
    pub radius: f32,
    pub angular_speed: f32,
    /// Per-hostile re-hit cooldowns (seconds remaining)
    pub cooldowns: HashMap<EntityId, f32>,
    /// Seconds left in the post-detonation recovery (invisible, no collisions)
    pub recovering: f32,
}

/// Motion behavior
#[derive(Debug, Clone, PartialEq)]
pub enum Motion {
    Linear,
    Homing { turn_rate: f32 },
    Helical { amplitude: f32, frequency: f32 },
    Orbiting(Orbit),
}

/// Area damage requested by an impact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blast {
    pub center: Vec2,
    pub radius: f32,
    pub damage: f32,
}

/// Side effects of a resolved hit, applied by the collision pass
#[derive(Debug, Default)]
pub struct HitEffects {
    pub blast: Option<Blast>,
    /// Scatter children, not yet spawned
    pub children: Vec<Projectile>,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: f32,
    /// Seconds remaining (infinite for mines)
    pub duration: f32,
    /// Seconds alive
    pub age: f32,
    pub active: bool,
    /// Additional hostiles this projectile may still damage
    pub pierce: u32,
    /// Hostiles already damaged (never damaged twice)
    pub hit: HashSet<EntityId>,
    pub explosion_radius: f32,
    pub knockback: f32,
    /// Freeze applied on hit (0 = none)
    pub freeze: f32,
    /// Splits into a fan once, on the first hit
    pub scatter: bool,
    pub giant: bool,
    /// Detonates its blast when the duration runs out
    pub fused: bool,
    pub motion: Motion,
}

impl Projectile {
    /// Plain linear shot; id is assigned when spawned into the world
    pub fn new(pos: Vec2, vel: Vec2, radius: f32, damage: f32, duration: f32) -> Self {
        Self {
            id: 0,
            pos,
            vel,
            radius,
            damage,
            duration,
            age: 0.0,
            active: true,
            pierce: 0,
            hit: HashSet::new(),
            explosion_radius: 0.0,
            knockback: 0.0,
            freeze: 0.0,
            scatter: false,
            giant: false,
            fused: false,
            motion: Motion::Linear,
        }
    }

    /// Mine orbiting the player at `angle`
    pub fn mine(center: Vec2, angle: f32, damage: f32) -> Self {
        let mut mine = Self::new(
            center + polar_to_cartesian(MINE_ORBIT_RADIUS, angle),
            Vec2::ZERO,
            MINE_RADIUS,
            damage,
            f32::INFINITY,
        );
        mine.motion = Motion::Orbiting(Orbit {
            angle,
            radius: MINE_ORBIT_RADIUS,
            angular_speed: MINE_ANGULAR_SPEED,
            cooldowns: HashMap::new(),
            recovering: 0.0,
        });
        mine
    }

    /// Scale damage, pierce, radius, knockback and blast radius
    pub fn make_giant(&mut self) {
        self.giant = true;
        self.damage *= GIANT_DAMAGE_MULT;
        self.pierce = (self.pierce + 1) * GIANT_PIERCE_MULT;
        self.radius *= GIANT_RADIUS_MULT;
        self.knockback *= GIANT_KNOCKBACK_MULT;
        self.explosion_radius *= GIANT_EXPLOSION_MULT;
    }

    pub fn is_orbiting(&self) -> bool {
        matches!(self.motion, Motion::Orbiting(_))
    }

    /// Recovering mines are skipped by collision
    pub fn is_recovering(&self) -> bool {
        matches!(&self.motion, Motion::Orbiting(orbit) if orbit.recovering > 0.0)
    }

    /// Whether `hostile` is still a valid target for this projectile
    pub fn can_hit(&self, hostile: &Hostile) -> bool {
        match &self.motion {
            Motion::Orbiting(orbit) => !orbit.cooldowns.contains_key(&hostile.id),
            _ => !self.hit.contains(&hostile.id),
        }
    }

    /// Advance motion and lifetime for one frame
    ///
    /// Returns the blast of a fused projectile whose duration ran out.
    pub fn update(&mut self, dt: f32, player: &Player, hostiles: &[Hostile]) -> Option<Blast> {
        if !self.active {
            return None;
        }

        match &mut self.motion {
            Motion::Orbiting(orbit) => {
                orbit.angle = normalize_angle(orbit.angle + orbit.angular_speed * dt);
                orbit.recovering = (orbit.recovering - dt).max(0.0);
                orbit.cooldowns.retain(|_, remaining| {
                    *remaining -= dt;
                    *remaining > 0.0
                });
                self.pos = player.pos + polar_to_cartesian(orbit.radius, orbit.angle);
                // Mines track the player's current stats
                self.damage = player.stats.damage * MINE_DAMAGE_FACTOR;
                self.explosion_radius = player.stats.explosion_radius;
                self.age += dt;
                return None;
            }
            Motion::Homing { turn_rate } => {
                if let Some(target) = nearest_hostile(self.pos, hostiles, HOMING_SEEK_RADIUS) {
                    self.vel = steer(self.vel, target - self.pos, *turn_rate * dt);
                }
                self.pos += self.vel * dt;
            }
            Motion::Helical {
                amplitude,
                frequency,
            } => {
                let before = *amplitude * (self.age * *frequency).sin();
                let after = *amplitude * ((self.age + dt) * *frequency).sin();
                self.pos += self.vel * dt + perpendicular(self.vel) * (after - before);
            }
            Motion::Linear => {
                self.pos += self.vel * dt;
            }
        }

        self.age += dt;
        self.duration -= dt;
        if self.duration > 0.0 {
            return None;
        }
        self.duration = 0.0;
        self.active = false;
        (self.fused && self.explosion_radius > 0.0).then_some(Blast {
            center: self.pos,
            radius: self.explosion_radius,
            damage: self.damage,
        })
    }

    /// Resolve a hit on `hostile` after its damage has been applied
    pub fn on_hit(&mut self, hostile: &mut Hostile, rng: &mut Pcg32) -> HitEffects {
        let mut effects = HitEffects::default();

        if let Motion::Orbiting(orbit) = &mut self.motion {
            orbit.cooldowns.insert(hostile.id, MINE_HIT_COOLDOWN);
            if self.explosion_radius > 0.0 {
                orbit.recovering = MINE_RECOVERY;
                effects.blast = Some(Blast {
                    center: self.pos,
                    radius: self.explosion_radius,
                    damage: self.damage,
                });
            }
            return effects;
        }

        let direction = self.vel.normalize_or_zero();
        if self.knockback > 0.0 {
            hostile.status.apply_knockback(direction * self.knockback);
        }
        if self.freeze > 0.0 {
            hostile.status.apply_freeze(self.freeze);
        }
        if self.explosion_radius > 0.0 {
            effects.blast = Some(Blast {
                center: self.pos,
                radius: self.explosion_radius,
                damage: self.damage,
            });
        }
        if self.scatter {
            self.scatter = false;
            effects.children = self.scatter_children(hostile.id, rng);
        }

        if self.pierce > 0 {
            self.pierce -= 1;
            self.hit.insert(hostile.id);
        } else {
            self.active = false;
        }
        effects
    }

    /// Three reduced projectiles fanned ±30° (plus jitter) around the heading
    fn scatter_children(&self, struck: EntityId, rng: &mut Pcg32) -> Vec<Projectile> {
        let speed = self.vel.length();
        let heading = if speed > 0.0 { self.vel / speed } else { Vec2::X };
        let half = (SCATTER_COUNT as f32 - 1.0) / 2.0;
        (0..SCATTER_COUNT)
            .map(|i| {
                let jitter = rng.random_range(-SCATTER_JITTER..=SCATTER_JITTER);
                let angle = (i as f32 - half) * SCATTER_ANGLE + jitter;
                let mut child = Projectile::new(
                    self.pos,
                    rotate(heading, angle) * speed,
                    self.radius * SCATTER_RADIUS_FACTOR,
                    self.damage * SCATTER_DAMAGE_FACTOR,
                    (self.age + self.duration) * SCATTER_DURATION_FACTOR,
                );
                // Children may not re-hit whatever the parent already struck
                child.hit = self.hit.clone();
                child.hit.insert(struck);
                child
            })
            .collect()
    }
}

/// Nearest active hostile within `radius` of `pos`
pub fn nearest_hostile(pos: Vec2, hostiles: &[Hostile], radius: f32) -> Option<Vec2> {
    hostiles
        .iter()
        .filter(|h| h.active)
        .map(|h| (h.pos, h.pos.distance(pos)))
        .filter(|(_, dist)| *dist < radius)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(p, _)| p)
}

/// Blend velocity direction toward `desired`, preserving speed
pub fn steer(vel: Vec2, desired: Vec2, blend: f32) -> Vec2 {
    let speed = vel.length();
    let current = vel.normalize_or_zero();
    let want = desired.normalize_or_zero();
    if current == Vec2::ZERO || want == Vec2::ZERO {
        return vel;
    }
    let blend = blend.clamp(0.0, 1.0);
    let dir = (current + (want - current) * blend).normalize_or_zero();
    if dir == Vec2::ZERO {
        // Exactly opposite and fully blended: keep heading this frame
        return vel;
    }
    dir * speed
}
