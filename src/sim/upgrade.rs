//! Upgrade table, level-up draws and the upgrade applier
//!
//! Stat names and effect names are resolved to closed enums when the table
//! is loaded, so an unknown name is reported once at load time instead of
//! silently doing nothing when the upgrade is picked.

use std::collections::HashSet;
use std::f32::consts::TAU;
use std::sync::Arc;

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::projectile::Projectile;
use super::state::{Player, World};
use crate::consts::*;
use crate::error::{Result, SimError};
use crate::tuning::Tuning;

const BUILTIN_UPGRADES: &str = include_str!("../../data/upgrades.json");

/// Rarity rolls before a draw gives up and tops up in table order
const MAX_DRAW_ATTEMPTS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
    Legendary,
}

impl Rarity {
    /// Unknown names clamp to common
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "rare" => Rarity::Rare,
            "legendary" => Rarity::Legendary,
            _ => Rarity::Common,
        }
    }
}

/// Map a uniform roll to a tier; out-of-range rolls clamp to common
pub fn roll_rarity(roll: f32, tuning: &Tuning) -> Rarity {
    if !(0.0..=1.0).contains(&roll) {
        return Rarity::Common;
    }
    if roll > tuning.legendary_threshold {
        Rarity::Legendary
    } else if roll > tuning.rare_threshold {
        Rarity::Rare
    } else {
        Rarity::Common
    }
}

/// Player stats an upgrade may mutate arithmetically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatId {
    MaxHp,
    MoveSpeed,
    Damage,
    FireInterval,
    Pierce,
    ExplosionRadius,
    HomingStrength,
    ProjectileSpeed,
    ProjectileRange,
    ProjectileSize,
    CritChance,
    DamageReduction,
    MagnetRadius,
    XpMultiplier,
    Knockback,
    FreezeChance,
}

impl StatId {
    pub fn parse(s: &str) -> Result<Self> {
        let stat = match s {
            "maxHp" => StatId::MaxHp,
            "moveSpeed" | "speed" => StatId::MoveSpeed,
            "damage" => StatId::Damage,
            "fireInterval" | "fireRate" => StatId::FireInterval,
            "pierce" => StatId::Pierce,
            "explosionRadius" => StatId::ExplosionRadius,
            "homingStrength" | "homing" => StatId::HomingStrength,
            "projectileSpeed" => StatId::ProjectileSpeed,
            "projectileRange" | "range" => StatId::ProjectileRange,
            "projectileSize" => StatId::ProjectileSize,
            "critChance" => StatId::CritChance,
            "damageReduction" => StatId::DamageReduction,
            "magnetRadius" => StatId::MagnetRadius,
            "xpMultiplier" => StatId::XpMultiplier,
            "knockback" | "knockbackStrength" => StatId::Knockback,
            "freezeChance" => StatId::FreezeChance,
            _ => return Err(SimError::UnknownStat(s.to_string())),
        };
        Ok(stat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatOp {
    Add,
    Multiply,
}

impl StatOp {
    fn apply(self, current: f32, value: f32) -> f32 {
        match self {
            StatOp::Add => current + value,
            StatOp::Multiply => current * value,
        }
    }
}

/// Named special effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpecialEffect {
    MultiShot,
    RearGun,
    ScatterShot,
    GiantTorpedo,
    OrbitMines,
    Pierce,
    Explosive,
    Homing,
    Helix,
    DepthCharge,
    PlasmaField,
    Sonar,
    Knockback,
    Freeze,
    Vampire,
    Repair,
}

impl SpecialEffect {
    pub fn parse(s: &str) -> Result<Self> {
        let effect = match s {
            "multi_shot" => SpecialEffect::MultiShot,
            "rear_gun" => SpecialEffect::RearGun,
            "scatter_shot" => SpecialEffect::ScatterShot,
            "giant_torpedo" => SpecialEffect::GiantTorpedo,
            "orbit_mines" => SpecialEffect::OrbitMines,
            "pierce" => SpecialEffect::Pierce,
            "explosive" => SpecialEffect::Explosive,
            "homing" => SpecialEffect::Homing,
            "helix" => SpecialEffect::Helix,
            "depth_charge" => SpecialEffect::DepthCharge,
            "plasma_field" => SpecialEffect::PlasmaField,
            "sonar" => SpecialEffect::Sonar,
            "knockback" => SpecialEffect::Knockback,
            "freeze" => SpecialEffect::Freeze,
            "vampire" => SpecialEffect::Vampire,
            "repair" => SpecialEffect::Repair,
            _ => return Err(SimError::UnknownEffect(s.to_string())),
        };
        Ok(effect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum UpgradeEffect {
    Stat { stat: StatId, op: StatOp, value: f32 },
    Special(SpecialEffect),
    /// Substituted for unusable records
    Noop,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeDef {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rarity: Rarity,
    pub effect: UpgradeEffect,
    /// Draws skip the upgrade once the player holds this many
    pub max_stacks: Option<u32>,
}

impl UpgradeDef {
    /// Zero-effect upgrade standing in for a bad record
    pub fn noop(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: "No effect".to_string(),
            rarity: Rarity::Common,
            effect: UpgradeEffect::Noop,
            max_stacks: Some(0),
        }
    }
}

/// Wire shape of an upgrade record
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUpgrade {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    rarity: Option<String>,
    kind: Option<String>,
    stat: Option<String>,
    op: Option<String>,
    value: Option<f32>,
    effect: Option<String>,
    max_stacks: Option<u32>,
}

impl TryFrom<RawUpgrade> for UpgradeDef {
    type Error = SimError;

    fn try_from(raw: RawUpgrade) -> Result<Self> {
        let id = raw.id.ok_or_else(|| SimError::MissingField {
            record: "<unnamed>".to_string(),
            field: "id",
        })?;
        let missing = |field| SimError::MissingField {
            record: id.clone(),
            field,
        };

        let kind = raw.kind.ok_or_else(|| missing("kind"))?;
        let effect = match kind.as_str() {
            "stat" => {
                let stat = StatId::parse(raw.stat.as_deref().ok_or_else(|| missing("stat"))?)?;
                let op = match raw.op.as_deref() {
                    None | Some("add") => StatOp::Add,
                    Some("multiply") => StatOp::Multiply,
                    Some(_) => {
                        return Err(SimError::InvalidField {
                            record: id.clone(),
                            field: "op",
                        });
                    }
                };
                let value = raw.value.ok_or_else(|| missing("value"))?;
                if !value.is_finite() {
                    return Err(SimError::InvalidField {
                        record: id.clone(),
                        field: "value",
                    });
                }
                UpgradeEffect::Stat { stat, op, value }
            }
            "special" => UpgradeEffect::Special(SpecialEffect::parse(
                raw.effect.as_deref().ok_or_else(|| missing("effect"))?,
            )?),
            other => return Err(SimError::UnknownKind(other.to_string())),
        };

        Ok(Self {
            name: raw.name.unwrap_or_else(|| id.clone()),
            description: raw.description.unwrap_or_default(),
            rarity: raw.rarity.as_deref().map(Rarity::parse).unwrap_or_default(),
            effect,
            max_stacks: raw.max_stacks,
            id,
        })
    }
}

/// Ordered upgrade table
#[derive(Debug, Clone)]
pub struct UpgradeTable {
    entries: Vec<Arc<UpgradeDef>>,
}

impl UpgradeTable {
    pub fn new(entries: Vec<UpgradeDef>) -> Self {
        Self {
            entries: entries.into_iter().map(Arc::new).collect(),
        }
    }

    /// The table shipped in `data/upgrades.json`
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_UPGRADES).unwrap_or_else(|_| Self::new(Vec::new()))
    }

    /// Parse a table, substituting a no-op upgrade for bad records
    pub fn from_json(json: &str) -> Result<Self> {
        let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let entries = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                let id = value
                    .get("id")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("invalid_{index}"));
                serde_json::from_value::<RawUpgrade>(value)
                    .map_err(SimError::from)
                    .and_then(UpgradeDef::try_from)
                    .unwrap_or_else(|err| {
                        log::warn!("Upgrade record {index} replaced with no-op: {err}");
                        UpgradeDef::noop(id)
                    })
            })
            .collect();
        Ok(Self::new(entries))
    }

    /// Parse a table, rejecting the first bad record
    pub fn from_json_strict(json: &str) -> Result<Self> {
        let raws: Vec<RawUpgrade> = serde_json::from_str(json)?;
        let entries = raws
            .into_iter()
            .map(UpgradeDef::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(entries))
    }

    /// Parse a table, falling back to the built-in table when the document is unreadable
    pub fn load_or_default(json: &str) -> Self {
        Self::from_json(json).unwrap_or_else(|err| {
            log::warn!("Upgrade table unreadable ({err}), using built-in table");
            Self::builtin()
        })
    }

    pub fn entries(&self) -> &[Arc<UpgradeDef>] {
        &self.entries
    }

    pub fn by_id(&self, id: &str) -> Option<&Arc<UpgradeDef>> {
        self.entries.iter().find(|u| u.id == id)
    }
}

impl Default for UpgradeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// One held upgrade and how many times it was taken
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeRecord {
    pub def: Arc<UpgradeDef>,
    pub stacks: u32,
}

/// Upgrades held by the player, in the order first taken
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub records: Vec<UpgradeRecord>,
}

impl Inventory {
    pub fn stacks(&self, id: &str) -> u32 {
        self.records
            .iter()
            .find(|r| r.def.id == id)
            .map_or(0, |r| r.stacks)
    }

    /// Count one more stack of `def`; returns the new stack count
    pub fn record(&mut self, def: &Arc<UpgradeDef>) -> u32 {
        if let Some(record) = self.records.iter_mut().find(|r| r.def.id == def.id) {
            record.stacks += 1;
            return record.stacks;
        }
        self.records.push(UpgradeRecord {
            def: Arc::clone(def),
            stacks: 1,
        });
        1
    }

    /// Whether another stack of `def` may be drawn or granted
    pub fn can_take(&self, def: &UpgradeDef) -> bool {
        def.max_stacks.is_none_or(|max| self.stacks(&def.id) < max)
    }
}

/// Draw up to `n` distinct upgrades for a level-up
///
/// Each pick rolls a rarity tier, then picks uniformly inside that tier;
/// repeats are discarded. Returns fewer than `n` only when fewer eligible
/// upgrades exist.
pub fn draw_upgrades(
    table: &UpgradeTable,
    inventory: &Inventory,
    n: usize,
    rng: &mut Pcg32,
    tuning: &Tuning,
) -> Vec<Arc<UpgradeDef>> {
    let eligible: Vec<&Arc<UpgradeDef>> = table
        .entries()
        .iter()
        .filter(|u| inventory.can_take(u))
        .collect();
    let distinct = eligible.iter().map(|u| u.id.as_str()).collect::<HashSet<_>>().len();
    let target = n.min(distinct);

    let mut picks: Vec<Arc<UpgradeDef>> = Vec::with_capacity(target);
    let mut attempts = 0;
    while picks.len() < target && attempts < MAX_DRAW_ATTEMPTS {
        attempts += 1;
        let rarity = roll_rarity(rng.random::<f32>(), tuning);
        let tier: Vec<_> = eligible.iter().filter(|u| u.rarity == rarity).collect();
        if tier.is_empty() {
            continue;
        }
        let pick = tier[rng.random_range(0..tier.len())];
        if !picks.iter().any(|p| p.id == pick.id) {
            picks.push(Arc::clone(pick));
        }
    }

    // Unlucky rolls: fill the remainder in table order
    for upgrade in eligible {
        if picks.len() >= target {
            break;
        }
        if !picks.iter().any(|p| p.id == upgrade.id) {
            picks.push(Arc::clone(upgrade));
        }
    }
    picks
}

/// Apply one upgrade at its new stack count
pub fn apply_upgrade(def: &UpgradeDef, stacks: u32, world: &mut World) {
    log::debug!("Applying upgrade {} (stack {})", def.id, stacks);
    match def.effect {
        UpgradeEffect::Stat { stat, op, value } => apply_stat(&mut world.player, stat, op, value),
        UpgradeEffect::Special(effect) => apply_special(effect, stacks, world),
        UpgradeEffect::Noop => {}
    }
}

/// Arithmetic stat mutation with per-stat clamping
pub fn apply_stat(player: &mut Player, stat: StatId, op: StatOp, value: f32) {
    let stats = &mut player.stats;
    match stat {
        StatId::MaxHp => {
            let before = player.max_hp;
            player.max_hp = op.apply(before, value).max(1.0);
            let delta = player.max_hp - before;
            player.hp = (player.hp + delta).clamp(0.0, player.max_hp);
        }
        StatId::MoveSpeed => stats.move_speed = op.apply(stats.move_speed, value).max(0.0),
        StatId::Damage => stats.damage = op.apply(stats.damage, value).max(0.0),
        StatId::FireInterval => {
            stats.fire_interval = op.apply(stats.fire_interval, value).max(MIN_FIRE_INTERVAL);
        }
        StatId::Pierce => stats.pierce = op.apply(stats.pierce as f32, value).round().max(0.0) as u32,
        StatId::ExplosionRadius => {
            stats.explosion_radius = op.apply(stats.explosion_radius, value).max(0.0);
        }
        StatId::HomingStrength => {
            stats.homing_strength = op.apply(stats.homing_strength, value).max(0.0);
        }
        StatId::ProjectileSpeed => {
            stats.projectile_speed = op.apply(stats.projectile_speed, value).max(0.1);
        }
        StatId::ProjectileRange => {
            stats.projectile_range = op.apply(stats.projectile_range, value).max(0.1);
        }
        StatId::ProjectileSize => {
            stats.projectile_size = op.apply(stats.projectile_size, value).max(0.1);
        }
        StatId::CritChance => stats.crit_chance = op.apply(stats.crit_chance, value).clamp(0.0, 1.0),
        StatId::DamageReduction => {
            stats.damage_reduction =
                op.apply(stats.damage_reduction, value).clamp(0.0, MAX_DAMAGE_REDUCTION);
        }
        StatId::MagnetRadius => stats.magnet_radius = op.apply(stats.magnet_radius, value).max(0.0),
        StatId::XpMultiplier => stats.xp_multiplier = op.apply(stats.xp_multiplier, value).max(0.0),
        StatId::Knockback => stats.knockback = op.apply(stats.knockback, value).max(0.0),
        StatId::FreezeChance => {
            stats.freeze_chance = op.apply(stats.freeze_chance, value).clamp(0.0, 1.0);
        }
    }
}

fn apply_special(effect: SpecialEffect, stacks: u32, world: &mut World) {
    let player = &mut world.player;
    let stats = &mut player.stats;
    match effect {
        SpecialEffect::MultiShot => stats.multi_shot += 1,
        SpecialEffect::RearGun => stats.rear_gun += 1,
        SpecialEffect::ScatterShot => stats.scatter += 1,
        SpecialEffect::GiantTorpedo => stats.giant_torpedo += 1,
        SpecialEffect::Pierce => stats.pierce += 1,
        SpecialEffect::Explosive => stats.explosion_radius += 30.0,
        SpecialEffect::Homing => stats.homing_strength += 1.0,
        SpecialEffect::Helix => stats.helix += 1,
        SpecialEffect::Knockback => stats.knockback += 150.0,
        SpecialEffect::Freeze => stats.freeze_chance = (stats.freeze_chance + 0.1).min(1.0),
        SpecialEffect::Vampire => stats.vampire += 1,
        SpecialEffect::DepthCharge => {
            stats.depth_charge += 1;
            player.timers.depth_charge = 0.0;
        }
        SpecialEffect::PlasmaField => {
            stats.plasma_field += 1;
            player.timers.plasma_field = 0.0;
        }
        SpecialEffect::Sonar => {
            stats.sonar += 1;
            player.timers.sonar = 0.0;
        }
        SpecialEffect::Repair => {
            let amount = player.max_hp * 0.5;
            player.heal(amount);
        }
        SpecialEffect::OrbitMines => rebuild_orbit_ring(world, stacks),
    }
}

/// Replace every orbiting mine with `count` mines evenly spaced by angle
pub fn rebuild_orbit_ring(world: &mut World, count: u32) {
    world.projectiles.retain(|p| !p.is_orbiting());
    let center = world.player.pos;
    let damage = world.player.stats.damage * MINE_DAMAGE_FACTOR;
    for i in 0..count {
        let angle = i as f32 * TAU / count as f32;
        world.spawn_projectile(Projectile::mine(center, angle, damage));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::projectile::Motion;
    use crate::sim::state::Player;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn world() -> World {
        World::new(Player::new(100.0))
    }

    fn stat(id: &str, rarity: Rarity, stat: StatId, op: StatOp, value: f32) -> UpgradeDef {
        UpgradeDef {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            rarity,
            effect: UpgradeEffect::Stat { stat, op, value },
            max_stacks: None,
        }
    }

    #[test]
    fn test_builtin_table_loads_strictly() {
        let table = UpgradeTable::from_json_strict(BUILTIN_UPGRADES).unwrap();
        assert!(table.entries().len() > 20);
        for rarity in [Rarity::Common, Rarity::Rare, Rarity::Legendary] {
            assert!(table.entries().iter().any(|u| u.rarity == rarity));
        }
    }

    #[test]
    fn test_unknown_stat_fails_at_load() {
        let json = r#"[{ "id": "x", "kind": "stat", "stat": "luck", "value": 1 }]"#;
        let err = UpgradeTable::from_json_strict(json).unwrap_err();
        assert!(matches!(err, SimError::UnknownStat(ref s) if s == "luck"));

        let table = UpgradeTable::from_json(json).unwrap();
        assert_eq!(table.entries()[0].effect, UpgradeEffect::Noop);
        assert_eq!(table.entries()[0].id, "x");
    }

    #[test]
    fn test_bad_records_become_noops() {
        let json = r#"[
            { "id": "a", "kind": "special", "effect": "teleport" },
            { "id": "b", "kind": "weird" },
            { "kind": "special", "effect": "pierce" },
            { "id": "c", "rarity": "mythic", "kind": "special", "effect": "pierce" }
        ]"#;
        let table = UpgradeTable::from_json(json).unwrap();
        let effects: Vec<_> = table.entries().iter().map(|u| u.effect).collect();
        assert_eq!(effects[0], UpgradeEffect::Noop);
        assert_eq!(effects[1], UpgradeEffect::Noop);
        assert_eq!(effects[2], UpgradeEffect::Noop);
        assert_eq!(effects[3], UpgradeEffect::Special(SpecialEffect::Pierce));
        // Unknown rarity clamps to common
        assert_eq!(table.entries()[3].rarity, Rarity::Common);
    }

    #[test]
    fn test_noop_upgrades_are_never_drawn() {
        let table = UpgradeTable::from_json(r#"[{ "id": "broken", "kind": "stat" }]"#).unwrap();
        let mut rng = Pcg32::seed_from_u64(1);
        let picks = draw_upgrades(&table, &Inventory::default(), 3, &mut rng, &Tuning::default());
        assert!(picks.is_empty());
    }

    #[test]
    fn test_rarity_roll_tiers() {
        let tuning = Tuning::default();
        assert_eq!(roll_rarity(0.1, &tuning), Rarity::Common);
        assert_eq!(roll_rarity(0.8, &tuning), Rarity::Rare);
        assert_eq!(roll_rarity(0.99, &tuning), Rarity::Legendary);
        assert_eq!(roll_rarity(f32::NAN, &tuning), Rarity::Common);
        assert_eq!(roll_rarity(1.5, &tuning), Rarity::Common);
        assert_eq!(roll_rarity(-0.2, &tuning), Rarity::Common);
    }

    #[test]
    fn test_draw_three_is_unique_even_with_one_tier() {
        // Everything common: every roll that lands in common hits the same tier
        let table = UpgradeTable::new(
            (0..4)
                .map(|i| stat(&format!("u{i}"), Rarity::Common, StatId::Damage, StatOp::Add, 1.0))
                .collect(),
        );
        let tuning = Tuning::default();
        for seed in 0..50 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let picks = draw_upgrades(&table, &Inventory::default(), 3, &mut rng, &tuning);
            assert_eq!(picks.len(), 3);
            let ids: HashSet<_> = picks.iter().map(|p| p.id.clone()).collect();
            assert_eq!(ids.len(), 3);
        }
    }

    #[test]
    fn test_draw_respects_small_tables_and_max_stacks() {
        let mut capped = stat("capped", Rarity::Rare, StatId::Damage, StatOp::Add, 1.0);
        capped.max_stacks = Some(1);
        let table = UpgradeTable::new(vec![
            stat("a", Rarity::Common, StatId::Damage, StatOp::Add, 1.0),
            capped,
        ]);
        let mut inventory = Inventory::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let tuning = Tuning::default();
        assert_eq!(draw_upgrades(&table, &inventory, 3, &mut rng, &tuning).len(), 2);

        let def = Arc::clone(table.by_id("capped").unwrap());
        inventory.record(&def);
        let picks = draw_upgrades(&table, &inventory, 3, &mut rng, &tuning);
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].id, "a");
    }

    #[test]
    fn test_max_hp_raises_current_hp() {
        let mut w = world();
        w.player.hp = 60.0;
        apply_stat(&mut w.player, StatId::MaxHp, StatOp::Add, 20.0);
        assert_eq!(w.player.max_hp, 120.0);
        assert_eq!(w.player.hp, 80.0);
        apply_stat(&mut w.player, StatId::MaxHp, StatOp::Multiply, 1.5);
        assert_eq!(w.player.max_hp, 180.0);
        assert_eq!(w.player.hp, 140.0);
    }

    #[test]
    fn test_stat_ops_and_clamps() {
        let mut w = world();
        apply_stat(&mut w.player, StatId::Damage, StatOp::Add, 5.0);
        assert_eq!(w.player.stats.damage, PLAYER_DAMAGE + 5.0);
        apply_stat(&mut w.player, StatId::FireInterval, StatOp::Multiply, 0.0);
        assert_eq!(w.player.stats.fire_interval, MIN_FIRE_INTERVAL);
        apply_stat(&mut w.player, StatId::CritChance, StatOp::Add, 3.0);
        assert_eq!(w.player.stats.crit_chance, 1.0);
        apply_stat(&mut w.player, StatId::Pierce, StatOp::Add, 2.0);
        assert_eq!(w.player.stats.pierce, 2);
    }

    #[test]
    fn test_special_effects_mutate_player() {
        let mut w = world();
        apply_special(SpecialEffect::MultiShot, 1, &mut w);
        apply_special(SpecialEffect::Explosive, 1, &mut w);
        apply_special(SpecialEffect::Sonar, 1, &mut w);
        apply_special(SpecialEffect::Freeze, 1, &mut w);
        assert_eq!(w.player.stats.multi_shot, 1);
        assert_eq!(w.player.stats.explosion_radius, 30.0);
        assert_eq!(w.player.stats.sonar, 1);
        assert!((w.player.stats.freeze_chance - 0.1).abs() < 1e-6);
        assert!(w.projectiles.is_empty());
    }

    #[test]
    fn test_repair_heals_half() {
        let mut w = world();
        w.player.hp = 10.0;
        apply_special(SpecialEffect::Repair, 1, &mut w);
        assert_eq!(w.player.hp, 60.0);
    }

    #[test]
    fn test_orbit_ring_rebuild_replaces_and_spaces_mines() {
        let mut w = world();
        rebuild_orbit_ring(&mut w, 2);
        let linear = Projectile::new(glam::Vec2::ZERO, glam::Vec2::X, 5.0, 1.0, 1.0);
        w.spawn_projectile(linear);
        let old_ids: Vec<_> = w.projectiles.iter().filter(|p| p.is_orbiting()).map(|p| p.id).collect();

        rebuild_orbit_ring(&mut w, 4);
        let mines: Vec<_> = w.projectiles.iter().filter(|p| p.is_orbiting()).collect();
        assert_eq!(mines.len(), 4);
        assert!(mines.iter().all(|m| !old_ids.contains(&m.id)));
        // The ordinary shot survives the rebuild
        assert_eq!(w.projectiles.len(), 5);

        let mut angles: Vec<f32> = mines
            .iter()
            .map(|m| match &m.motion {
                Motion::Orbiting(orbit) => orbit.angle,
                _ => unreachable!(),
            })
            .collect();
        angles.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for pair in angles.windows(2) {
            assert!((pair[1] - pair[0] - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        }
    }

    #[test]
    fn test_inventory_counts_stacks() {
        let def = Arc::new(UpgradeDef::noop("x"));
        let mut inventory = Inventory::default();
        assert_eq!(inventory.record(&def), 1);
        assert_eq!(inventory.record(&def), 2);
        assert_eq!(inventory.stacks("x"), 2);
        assert_eq!(inventory.records.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_builtin_draws_are_unique(seed in any::<u64>(), n in 1usize..6) {
            let table = UpgradeTable::builtin();
            let mut rng = Pcg32::seed_from_u64(seed);
            let picks = draw_upgrades(&table, &Inventory::default(), n, &mut rng, &Tuning::default());
            prop_assert_eq!(picks.len(), n);
            let ids: HashSet<_> = picks.iter().map(|p| p.id.as_str()).collect();
            prop_assert_eq!(ids.len(), n);
        }
    }
}
