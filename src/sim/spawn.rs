//! Spawn director
//!
//! Picks hostile archetypes by cumulative spawn weight and places them on a
//! ring just outside the visible play area.

use std::sync::Arc;

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::archetype::{ArchetypeTable, HostileArchetype};
use super::state::{EntityId, FrameCtx, GameEvent, World};
use crate::polar_to_cartesian;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpawnDirector {
    /// Seconds until the next spawn
    pub timer: f32,
    pub boss_spawned: bool,
    pub spawned: u32,
}

impl SpawnDirector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count down and spawn whatever is due this frame
    pub fn update(
        &mut self,
        world: &mut World,
        table: &ArchetypeTable,
        level: u32,
        ctx: &mut FrameCtx,
        dt: f32,
    ) {
        let tuning = ctx.tuning;
        if !self.boss_spawned && tuning.boss_level > 0 && level >= tuning.boss_level {
            let id = self.spawn(world, table.boss(), 1.0, ctx);
            self.boss_spawned = true;
            log::info!("Boss spawned at level {level} (id {id})");
            ctx.events.emit(GameEvent::BossSpawned { id });
        }

        self.timer -= dt;
        while self.timer <= 0.0 {
            self.timer += tuning.spawn_interval_at(level);
            if world.active_hostiles() >= tuning.max_hostiles {
                continue;
            }
            let archetype = pick_archetype(table, level, ctx.rng.random::<f32>());
            self.spawn(world, archetype, tuning.hp_scale_at(level), ctx);
        }
    }

    fn spawn(
        &mut self,
        world: &mut World,
        archetype: Arc<HostileArchetype>,
        hp_scale: f32,
        ctx: &mut FrameCtx,
    ) -> EntityId {
        let angle = ctx.rng.random_range(0.0..std::f32::consts::TAU);
        let pos = spawn_position(world.player.pos, angle, ctx.tuning);
        log::debug!("Spawning {} at ({:.0}, {:.0})", archetype.id, pos.x, pos.y);
        self.spawned += 1;
        world.spawn_hostile(archetype, pos, hp_scale)
    }
}

/// Cumulative-weight selection; `roll` is uniform in [0, 1)
///
/// Falls back to the default weak hostile when nothing is spawnable.
pub fn pick_archetype(table: &ArchetypeTable, level: u32, roll: f32) -> Arc<HostileArchetype> {
    let candidates: Vec<_> = table.spawnable(level).collect();
    let total: f32 = candidates.iter().map(|a| a.spawn_weight).sum();
    if candidates.is_empty() || total <= 0.0 {
        return Arc::new(HostileArchetype::fallback());
    }

    let target = roll.clamp(0.0, 1.0) * total;
    let mut cumulative = 0.0;
    for archetype in &candidates {
        cumulative += archetype.spawn_weight;
        if target < cumulative {
            return Arc::clone(archetype);
        }
    }
    // roll == 1.0 or rounding at the top end
    Arc::clone(candidates[candidates.len() - 1])
}

/// Point on the ring around `center` just outside the viewport
pub fn spawn_position(center: Vec2, angle: f32, tuning: &Tuning) -> Vec2 {
    center + polar_to_cartesian(tuning.spawn_distance(), angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::archetype::HostileArchetype;
    use crate::sim::state::{GameEvent, Player};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn archetype(id: &str, weight: f32) -> HostileArchetype {
        HostileArchetype {
            id: id.to_string(),
            spawn_weight: weight,
            ..HostileArchetype::fallback()
        }
    }

    fn table() -> ArchetypeTable {
        ArchetypeTable::new(vec![archetype("a", 10.0), archetype("b", 30.0)])
    }

    #[test]
    fn test_cumulative_weight_bounds() {
        let table = table();
        assert_eq!(pick_archetype(&table, 1, 0.0).id, "a");
        assert_eq!(pick_archetype(&table, 1, 0.2499).id, "a");
        assert_eq!(pick_archetype(&table, 1, 0.25).id, "b");
        assert_eq!(pick_archetype(&table, 1, 0.9999).id, "b");
        assert_eq!(pick_archetype(&table, 1, 1.0).id, "b");
    }

    #[test]
    fn test_zero_weight_table_falls_back() {
        let table = ArchetypeTable::new(vec![archetype("z", 0.0)]);
        assert_eq!(pick_archetype(&table, 1, 0.5).id, HostileArchetype::fallback().id);
    }

    #[test]
    fn test_spawn_position_is_outside_viewport() {
        let tuning = Tuning::default();
        let center = Vec2::new(100.0, -40.0);
        for i in 0..16 {
            let angle = i as f32 * 0.4;
            let pos = spawn_position(center, angle, &tuning);
            let dist = pos.distance(center);
            assert!((dist - tuning.spawn_distance()).abs() < 1e-2);
            let offset = pos - center;
            assert!(
                offset.x.abs() > tuning.viewport_width / 2.0
                    || offset.y.abs() > tuning.viewport_height / 2.0
            );
        }
    }

    #[test]
    fn test_director_paces_spawns_and_caps() {
        let tuning = Tuning {
            spawn_interval: 0.5,
            max_hostiles: 3,
            boss_level: 0,
            ..Default::default()
        };
        let table = table();
        let mut world = World::new(Player::new(100.0));
        let mut director = SpawnDirector::new();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut events: Vec<GameEvent> = Vec::new();
        let mut ctx = FrameCtx {
            rng: &mut rng,
            tuning: &tuning,
            events: &mut events,
        };

        // First frame spawns immediately, then every 0.5 s
        director.update(&mut world, &table, 1, &mut ctx, 0.1);
        assert_eq!(world.hostiles.len(), 1);
        director.update(&mut world, &table, 1, &mut ctx, 0.3);
        assert_eq!(world.hostiles.len(), 1);
        director.update(&mut world, &table, 1, &mut ctx, 0.2);
        assert_eq!(world.hostiles.len(), 2);
        director.update(&mut world, &table, 1, &mut ctx, 5.0);
        assert_eq!(world.hostiles.len(), 3);
        assert!(events.is_empty());
    }

    #[test]
    fn test_boss_spawns_once_at_boss_level() {
        let tuning = Tuning {
            boss_level: 3,
            ..Default::default()
        };
        let table = ArchetypeTable::builtin();
        let mut world = World::new(Player::new(100.0));
        let mut director = SpawnDirector::new();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut events: Vec<GameEvent> = Vec::new();
        let mut ctx = FrameCtx {
            rng: &mut rng,
            tuning: &tuning,
            events: &mut events,
        };

        director.update(&mut world, &table, 2, &mut ctx, 0.01);
        assert!(!world.hostiles.iter().any(|h| h.is_boss()));
        director.update(&mut world, &table, 3, &mut ctx, 0.01);
        director.update(&mut world, &table, 4, &mut ctx, 0.01);
        assert_eq!(world.hostiles.iter().filter(|h| h.is_boss()).count(), 1);
        assert_eq!(
            events.iter().filter(|e| matches!(e, GameEvent::BossSpawned { .. })).count(),
            1
        );
    }

    proptest! {
        #[test]
        fn prop_pick_matches_weights(roll in 0.0f32..1.0) {
            let table = table();
            let picked = pick_archetype(&table, 1, roll);
            let expected = if roll * 40.0 < 10.0 { "a" } else { "b" };
            prop_assert_eq!(picked.id.as_str(), expected);
        }
    }
}
