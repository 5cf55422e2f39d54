//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (collection order, by entity ID)
//! - No rendering or platform dependencies

pub mod archetype;
pub mod collision;
pub mod progression;
pub mod projectile;
pub mod snapshot;
pub mod spawn;
pub mod state;
pub mod status;
pub mod tick;
pub mod upgrade;
pub mod weapons;

pub use archetype::{ArchetypeTable, Behavior, HostileArchetype};
pub use progression::Progression;
pub use projectile::{Motion, Orbit, Projectile};
pub use snapshot::{HostileView, Hud, PickupView, PlayerView, ProjectileKind, ProjectileView, Snapshot, UpgradeView};
pub use spawn::SpawnDirector;
pub use state::{
    EntityId, EventSink, GameEvent, GamePhase, GameState, Hostile, NullSink, Pickup, Player,
    Stats, World,
};
pub use tick::tick;
pub use upgrade::{Inventory, Rarity, SpecialEffect, StatId, StatOp, UpgradeDef, UpgradeEffect, UpgradeTable};
pub use weapons::{Pulse, TickInput};
