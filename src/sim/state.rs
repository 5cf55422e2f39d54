//! Game state and core simulation types
//!
//! The `World` is the entity store: the player singleton plus the three live
//! collections. Entities are deactivated in place during a frame and only
//! removed by `World::compact`, which runs once collision resolution is done.

use std::sync::Arc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::archetype::{ArchetypeTable, HostileArchetype};
use super::progression::Progression;
use super::projectile::{Blast, Projectile};
use super::spawn::SpawnDirector;
use super::status::StatusEffects;
use super::upgrade::{Inventory, UpgradeDef, UpgradeTable};
use crate::consts::*;
use crate::tuning::Tuning;

/// Stable handle assigned at entity creation
pub type EntityId = u32;

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GamePhase {
    /// Frames advance normally
    Playing,
    /// Level-up pause, waiting on `choose_upgrade`
    ChoosingUpgrade,
    /// Player hp reached zero (absorbing)
    GameOver,
    /// Boss destroyed (absorbing)
    Victory,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::Victory)
    }
}

/// Events handed to collaborators (audio, UI) as they happen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    HostileKilled {
        id: EntityId,
        archetype: String,
        pos: Vec2,
        boss: bool,
    },
    PlayerDamaged {
        amount: f32,
        hp: f32,
    },
    PlayerHealed {
        amount: f32,
        hp: f32,
    },
    LevelUp {
        level: u32,
        options: Vec<String>,
    },
    UpgradeApplied {
        id: String,
        stacks: u32,
    },
    BossSpawned {
        id: EntityId,
    },
    GameOver {
        score: u64,
        level: u32,
    },
    Victory {
        score: u64,
        level: u32,
    },
}

/// Receives events synchronously during `advance`
pub trait EventSink {
    fn emit(&mut self, event: GameEvent);
}

impl EventSink for Vec<GameEvent> {
    fn emit(&mut self, event: GameEvent) {
        self.push(event);
    }
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: GameEvent) {}
}

/// Per-frame context handed to each subsystem
pub struct FrameCtx<'a> {
    pub rng: &'a mut Pcg32,
    pub tuning: &'a Tuning,
    pub events: &'a mut dyn EventSink,
}

/// Player stat block, mutated by upgrades
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub move_speed: f32,
    pub damage: f32,
    /// Seconds between volleys
    pub fire_interval: f32,
    pub pierce: u32,
    pub explosion_radius: f32,
    pub homing_strength: f32,
    /// Projectile speed multiplier
    pub projectile_speed: f32,
    /// Projectile lifetime multiplier
    pub projectile_range: f32,
    /// Projectile radius multiplier
    pub projectile_size: f32,
    pub crit_chance: f32,
    pub damage_reduction: f32,
    pub magnet_radius: f32,
    pub xp_multiplier: f32,
    pub knockback: f32,
    pub freeze_chance: f32,
    pub multi_shot: u32,
    pub rear_gun: u32,
    pub scatter: u32,
    pub giant_torpedo: u32,
    pub helix: u32,
    pub vampire: u32,
    pub depth_charge: u32,
    pub plasma_field: u32,
    pub sonar: u32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            move_speed: PLAYER_MOVE_SPEED,
            damage: PLAYER_DAMAGE,
            fire_interval: PLAYER_FIRE_INTERVAL,
            pierce: 0,
            explosion_radius: 0.0,
            homing_strength: 0.0,
            projectile_speed: 1.0,
            projectile_range: 1.0,
            projectile_size: 1.0,
            crit_chance: 0.0,
            damage_reduction: 0.0,
            magnet_radius: PLAYER_MAGNET_RADIUS,
            xp_multiplier: 1.0,
            knockback: 0.0,
            freeze_chance: 0.0,
            multi_shot: 0,
            rear_gun: 0,
            scatter: 0,
            giant_torpedo: 0,
            helix: 0,
            vampire: 0,
            depth_charge: 0,
            plasma_field: 0,
            sonar: 0,
        }
    }
}

/// Countdown timers, in seconds
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Timers {
    pub fire: f32,
    pub depth_charge: f32,
    pub plasma_field: f32,
    pub sonar: f32,
}

/// The player submarine
#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub pos: Vec2,
    /// Unit aim direction from the last frame with a usable aim target
    pub facing: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub stats: Stats,
    pub timers: Timers,
    pub shots_fired: u32,
    pub kills: u32,
}

impl Player {
    pub fn new(max_hp: f32) -> Self {
        Self {
            pos: Vec2::ZERO,
            facing: Vec2::X,
            radius: PLAYER_RADIUS,
            hp: max_hp,
            max_hp,
            stats: Stats::default(),
            timers: Timers::default(),
            shots_fired: 0,
            kills: 0,
        }
    }

    /// Apply incoming damage after reduction; returns hp actually lost
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let reduction = self.stats.damage_reduction.clamp(0.0, MAX_DAMAGE_REDUCTION);
        let before = self.hp;
        self.hp = (self.hp - amount.max(0.0) * (1.0 - reduction)).max(0.0);
        before - self.hp
    }

    /// Restore hp up to the cap; returns hp actually gained
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0.0)).min(self.max_hp);
        self.hp - before
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    /// Kills between heals while the vampire upgrade is held
    pub fn kills_per_heal(&self) -> Option<u32> {
        (self.stats.vampire > 0).then(|| 10u32.saturating_sub(2 * self.stats.vampire).max(2))
    }
}

/// Record of a hostile's death, settled after the collision pass
#[derive(Debug, Clone)]
pub struct Kill {
    pub id: EntityId,
    pub archetype: Arc<HostileArchetype>,
    pub pos: Vec2,
    pub boss: bool,
}

/// An enemy pursuing the player
#[derive(Debug, Clone)]
pub struct Hostile {
    pub id: EntityId,
    pub pos: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub archetype: Arc<HostileArchetype>,
    pub status: StatusEffects,
    /// Seconds alive (drives behavior phases)
    pub age: f32,
    pub active: bool,
}

impl Hostile {
    pub fn new(id: EntityId, archetype: Arc<HostileArchetype>, pos: Vec2, hp_scale: f32) -> Self {
        let hp = archetype.hp * hp_scale.max(0.0);
        Self {
            id,
            pos,
            radius: archetype.radius,
            hp,
            max_hp: hp,
            archetype,
            status: StatusEffects::default(),
            age: 0.0,
            active: true,
        }
    }

    pub fn is_boss(&self) -> bool {
        self.archetype.boss
    }

    /// Subtract hp (clamped at zero); returns the kill on the transition to dead
    pub fn take_damage(&mut self, amount: f32) -> Option<Kill> {
        if !self.active {
            return None;
        }
        self.hp = (self.hp - amount.max(0.0)).max(0.0);
        self.status.flash = DAMAGE_FLASH;
        if self.hp > 0.0 {
            return None;
        }
        self.active = false;
        Some(Kill {
            id: self.id,
            archetype: Arc::clone(&self.archetype),
            pos: self.pos,
            boss: self.is_boss(),
        })
    }
}

/// An xp orb dropped by a dead hostile
#[derive(Debug, Clone, Serialize)]
pub struct Pickup {
    pub id: EntityId,
    pub pos: Vec2,
    pub value: u32,
    pub radius: f32,
    pub active: bool,
}

impl Pickup {
    /// Drift toward the player once inside the magnet radius
    pub fn update(&mut self, target: Vec2, magnet_radius: f32, pull_speed: f32, dt: f32) {
        if !self.active {
            return;
        }
        let offset = target - self.pos;
        let dist = offset.length();
        if dist < magnet_radius && dist > 0.0 {
            let step = (pull_speed * dt).min(dist);
            self.pos += offset / dist * step;
        }
    }
}

/// Entity store: player plus live collections
#[derive(Debug, Clone)]
pub struct World {
    pub player: Player,
    pub hostiles: Vec<Hostile>,
    pub projectiles: Vec<Projectile>,
    pub pickups: Vec<Pickup>,
    next_id: EntityId,
}

impl World {
    pub fn new(player: Player) -> Self {
        Self {
            player,
            hostiles: Vec::new(),
            projectiles: Vec::new(),
            pickups: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn spawn_hostile(
        &mut self,
        archetype: Arc<HostileArchetype>,
        pos: Vec2,
        hp_scale: f32,
    ) -> EntityId {
        let id = self.next_entity_id();
        self.hostiles.push(Hostile::new(id, archetype, pos, hp_scale));
        id
    }

    pub fn spawn_projectile(&mut self, mut projectile: Projectile) -> EntityId {
        let id = self.next_entity_id();
        projectile.id = id;
        self.projectiles.push(projectile);
        id
    }

    pub fn spawn_pickup(&mut self, pos: Vec2, value: u32) -> EntityId {
        let id = self.next_entity_id();
        self.pickups.push(Pickup {
            id,
            pos,
            value,
            radius: PICKUP_RADIUS,
            active: true,
        });
        id
    }

    pub fn hostile(&self, id: EntityId) -> Option<&Hostile> {
        self.hostiles.iter().find(|h| h.id == id)
    }

    pub fn active_hostiles(&self) -> usize {
        self.hostiles.iter().filter(|h| h.active).count()
    }

    pub fn update_hostiles(&mut self, dt: f32) {
        let target = self.player.pos;
        for hostile in &mut self.hostiles {
            hostile.update(target, dt);
        }
    }

    /// Move every projectile; returns blasts from fuses that ran out
    pub fn update_projectiles(&mut self, dt: f32) -> Vec<Blast> {
        let player = &self.player;
        let hostiles = &self.hostiles;
        self.projectiles
            .iter_mut()
            .filter_map(|projectile| projectile.update(dt, player, hostiles))
            .collect()
    }

    pub fn update_pickups(&mut self, pull_speed: f32, dt: f32) {
        let target = self.player.pos;
        let magnet = self.player.stats.magnet_radius;
        for pickup in &mut self.pickups {
            pickup.update(target, magnet, pull_speed, dt);
        }
    }

    /// Drop inactive members of every collection
    pub fn compact(&mut self) {
        self.hostiles.retain(|h| h.active);
        self.projectiles.retain(|p| p.active);
        self.pickups.retain(|p| p.active);
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub archetypes: ArchetypeTable,
    pub upgrades: UpgradeTable,
    pub world: World,
    pub progression: Progression,
    pub director: SpawnDirector,
    /// Upgrades held by the player, with stack counts
    pub inventory: Inventory,
    pub phase: GamePhase,
    /// Options offered by the current level-up
    pub choices: Vec<Arc<UpgradeDef>>,
    /// Level-ups earned but not yet offered
    pub pending_level_ups: u32,
    /// Simulated seconds
    pub elapsed: f32,
}

impl GameState {
    pub fn new(seed: u64, archetypes: ArchetypeTable, upgrades: UpgradeTable, tuning: Tuning) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            world: World::new(Player::new(tuning.player_hp)),
            progression: Progression::new(tuning.xp_threshold, tuning.xp_growth),
            director: SpawnDirector::new(),
            inventory: Inventory::default(),
            phase: GamePhase::Playing,
            choices: Vec::new(),
            pending_level_ups: 0,
            elapsed: 0.0,
            archetypes,
            upgrades,
            tuning,
        }
    }

    /// Built-in tables and default tuning
    pub fn with_defaults(seed: u64) -> Self {
        Self::new(
            seed,
            ArchetypeTable::builtin(),
            UpgradeTable::builtin(),
            Tuning::default(),
        )
    }
}
