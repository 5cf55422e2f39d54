//! Fixed timestep simulation tick
//!
//! One call advances the run by `dt` in a fixed order: player, spawner,
//! movement, collision passes, progression, compaction, then phase
//! transitions. Everything a pass resolves sees the positions produced by
//! this frame's movement.

use std::sync::Arc;

use super::collision;
use super::progression::Progression;
use super::snapshot::{Hud, Snapshot};
use super::state::{EventSink, FrameCtx, GameEvent, GamePhase, GameState, Kill, World};
use super::upgrade::{self, UpgradeDef};
use super::weapons::{self, TickInput};
use crate::consts::*;
use crate::error::{Result, SimError};

/// Advance the game state by one frame
///
/// Does nothing outside `Playing`, and ignores a non-positive or
/// non-finite `dt`.
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32, events: &mut dyn EventSink) {
    if state.phase != GamePhase::Playing || !dt.is_finite() || dt <= 0.0 {
        return;
    }
    state.elapsed += dt;

    let (gained, boss_down) = {
        let GameState {
            rng,
            tuning,
            archetypes,
            world,
            progression,
            director,
            ..
        } = state;
        let mut ctx = FrameCtx {
            rng,
            tuning,
            events: &mut *events,
        };

        let pulses = weapons::update_player(world, input, &mut ctx, dt);
        director.update(world, archetypes, progression.level, &mut ctx, dt);
        world.update_hostiles(dt);
        let fuses = world.update_projectiles(dt);
        world.update_pickups(ctx.tuning.magnet_pull_speed, dt);

        let lost = collision::player_vs_hostiles(world, ctx.tuning, dt);
        if lost > 0.0 {
            ctx.events.emit(GameEvent::PlayerDamaged {
                amount: lost,
                hp: world.player.hp,
            });
        }

        let mut kills = collision::projectiles_vs_hostiles(world, ctx.rng);
        kills.extend(collision::resolve_pulses(world, &pulses));
        for blast in fuses {
            kills.extend(collision::area_damage(&mut world.hostiles, blast));
        }
        let boss_down = settle_kills(world, progression, &kills, ctx.events);

        let collected = collision::player_vs_pickups(world);
        let xp = (collected as f32 * world.player.stats.xp_multiplier.max(0.0)).round() as u32;
        let gained = progression.add_xp(xp);

        world.compact();
        (gained, boss_down)
    };

    let (score, level) = (state.progression.score, state.progression.level);
    if state.world.player.is_dead() {
        state.phase = GamePhase::GameOver;
        log::info!("Game over at level {level} with score {score}");
        events.emit(GameEvent::GameOver { score, level });
        return;
    }
    if boss_down {
        state.phase = GamePhase::Victory;
        log::info!("Boss destroyed: victory at level {level} with score {score}");
        events.emit(GameEvent::Victory { score, level });
        return;
    }

    state.pending_level_ups += gained;
    state.offer_level_up(events);
}

/// Credit score, drop xp and apply on-kill effects; returns whether the boss died
fn settle_kills(
    world: &mut World,
    progression: &mut Progression,
    kills: &[Kill],
    events: &mut dyn EventSink,
) -> bool {
    let mut boss_down = false;
    for kill in kills {
        progression.add_score(kill.archetype.score_reward);
        world.spawn_pickup(kill.pos, kill.archetype.xp_reward);

        let player = &mut world.player;
        player.kills += 1;
        let heal_due = player.kills_per_heal().is_some_and(|every| player.kills % every == 0);
        if heal_due {
            let healed = player.heal(KILL_HEAL_AMOUNT);
            if healed > 0.0 {
                events.emit(GameEvent::PlayerHealed {
                    amount: healed,
                    hp: player.hp,
                });
            }
        }

        events.emit(GameEvent::HostileKilled {
            id: kill.id,
            archetype: kill.archetype.id.clone(),
            pos: kill.pos,
            boss: kill.boss,
        });
        boss_down |= kill.boss;
    }
    boss_down
}

impl GameState {
    /// Advance one frame; see [`tick`]
    pub fn advance(&mut self, input: &TickInput, dt: f32, events: &mut dyn EventSink) {
        tick(self, input, dt, events);
    }

    /// Take one of the offered upgrades and resume play
    ///
    /// If more level-ups are queued the next offer opens immediately.
    pub fn choose_upgrade(&mut self, index: usize, events: &mut dyn EventSink) -> Result<()> {
        if self.phase != GamePhase::ChoosingUpgrade {
            return Err(SimError::NotChoosingUpgrade);
        }
        let def = self
            .choices
            .get(index)
            .cloned()
            .ok_or(SimError::InvalidChoice(index))?;

        self.apply(&def, events);
        self.choices.clear();
        self.phase = GamePhase::Playing;
        self.offer_level_up(events);
        Ok(())
    }

    /// Apply an upgrade by id outside the level-up flow; returns its stack count
    pub fn grant_upgrade(&mut self, id: &str, events: &mut dyn EventSink) -> Result<u32> {
        let def = self
            .upgrades
            .by_id(id)
            .cloned()
            .ok_or_else(|| SimError::UnknownUpgrade(id.to_string()))?;
        if !self.inventory.can_take(&def) {
            log::warn!("Upgrade {id} is already at its stack limit");
            return Ok(self.inventory.stacks(id));
        }
        Ok(self.apply(&def, events))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    pub fn hud(&self) -> Hud {
        Hud::capture(self)
    }

    fn apply(&mut self, def: &Arc<UpgradeDef>, events: &mut dyn EventSink) -> u32 {
        let stacks = self.inventory.record(def);
        let before = self.world.player.hp;
        upgrade::apply_upgrade(def, stacks, &mut self.world);

        let healed = self.world.player.hp - before;
        if healed > 0.0 {
            events.emit(GameEvent::PlayerHealed {
                amount: healed,
                hp: self.world.player.hp,
            });
        }
        events.emit(GameEvent::UpgradeApplied {
            id: def.id.clone(),
            stacks,
        });
        stacks
    }

    /// Open the next queued level-up, if any
    fn offer_level_up(&mut self, events: &mut dyn EventSink) {
        if self.pending_level_ups == 0 {
            return;
        }
        self.pending_level_ups -= 1;

        let choices = upgrade::draw_upgrades(
            &self.upgrades,
            &self.inventory,
            self.tuning.upgrade_choices,
            &mut self.rng,
            &self.tuning,
        );
        if choices.is_empty() {
            log::warn!("No upgrades left to offer; skipping level-up");
            self.pending_level_ups = 0;
            return;
        }

        let level = self.progression.level - self.pending_level_ups;
        events.emit(GameEvent::LevelUp {
            level,
            options: choices.iter().map(|c| c.id.clone()).collect(),
        });
        self.choices = choices;
        self.phase = GamePhase::ChoosingUpgrade;
    }
}
