//! Read-only per-frame view for rendering, HUD and audio collaborators

use glam::Vec2;
use serde::Serialize;

use super::projectile::Motion;
use super::state::{EntityId, GamePhase, GameState};
use super::upgrade::{Inventory, Rarity, UpgradeDef};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hud {
    pub score: u64,
    pub level: u32,
    pub hp: f32,
    pub max_hp: f32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub kills: u32,
    pub elapsed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub facing: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostileView {
    pub id: EntityId,
    pub pos: Vec2,
    pub radius: f32,
    pub archetype: String,
    pub color: String,
    pub hp_fraction: f32,
    pub frozen: bool,
    pub flashing: bool,
    pub boss: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProjectileKind {
    Linear,
    Homing,
    Helical,
    Orbiting,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectileView {
    pub id: EntityId,
    pub pos: Vec2,
    pub radius: f32,
    pub kind: ProjectileKind,
    pub giant: bool,
    /// Recovering mines are drawn hidden
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickupView {
    pub id: EntityId,
    pub pos: Vec2,
    pub radius: f32,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rarity: Rarity,
    pub stacks: u32,
}

/// Everything a frame's collaborators may read
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub hud: Hud,
    pub player: PlayerView,
    pub hostiles: Vec<HostileView>,
    pub projectiles: Vec<ProjectileView>,
    pub pickups: Vec<PickupView>,
    /// Offered upgrades while choosing
    pub choices: Vec<UpgradeView>,
    pub inventory: Vec<UpgradeView>,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        let world = &state.world;
        let player = &world.player;
        Self {
            phase: state.phase,
            hud: Hud::capture(state),
            player: PlayerView {
                pos: player.pos,
                facing: player.facing,
                radius: player.radius,
            },
            hostiles: world
                .hostiles
                .iter()
                .filter(|h| h.active)
                .map(|h| HostileView {
                    id: h.id,
                    pos: h.pos,
                    radius: h.radius,
                    archetype: h.archetype.id.clone(),
                    color: h.archetype.color.clone(),
                    hp_fraction: if h.max_hp > 0.0 { h.hp / h.max_hp } else { 0.0 },
                    frozen: h.status.is_frozen(),
                    flashing: h.status.flash > 0.0,
                    boss: h.is_boss(),
                })
                .collect(),
            projectiles: world
                .projectiles
                .iter()
                .filter(|p| p.active)
                .map(|p| ProjectileView {
                    id: p.id,
                    pos: p.pos,
                    radius: p.radius,
                    kind: match p.motion {
                        Motion::Linear => ProjectileKind::Linear,
                        Motion::Homing { .. } => ProjectileKind::Homing,
                        Motion::Helical { .. } => ProjectileKind::Helical,
                        Motion::Orbiting(_) => ProjectileKind::Orbiting,
                    },
                    giant: p.giant,
                    hidden: p.is_recovering(),
                })
                .collect(),
            pickups: world
                .pickups
                .iter()
                .filter(|p| p.active)
                .map(|p| PickupView {
                    id: p.id,
                    pos: p.pos,
                    radius: p.radius,
                    value: p.value,
                })
                .collect(),
            choices: state
                .choices
                .iter()
                .map(|def| UpgradeView::new(def, &state.inventory))
                .collect(),
            inventory: state
                .inventory
                .records
                .iter()
                .map(|r| UpgradeView::new(&r.def, &state.inventory))
                .collect(),
        }
    }
}

impl UpgradeView {
    fn new(def: &UpgradeDef, inventory: &Inventory) -> Self {
        Self {
            id: def.id.clone(),
            name: def.name.clone(),
            description: def.description.clone(),
            rarity: def.rarity,
            stacks: inventory.stacks(&def.id),
        }
    }
}

impl Hud {
    pub fn capture(state: &GameState) -> Self {
        let player = &state.world.player;
        Self {
            score: state.progression.score,
            level: state.progression.level,
            hp: player.hp,
            max_hp: player.max_hp,
            xp: state.progression.xp,
            xp_to_next: state.progression.xp_to_next,
            kills: player.kills,
            elapsed: state.elapsed,
        }
    }
}
