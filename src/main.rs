//! Abyss Swarm - headless driver
//!
//! Runs a seeded session with a simple autopilot and prints the final HUD as
//! JSON. Usage: `abyss-swarm [seed] [seconds] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or_else(rand::random);
    let seconds = args
        .next()
        .and_then(|s| s.parse::<f32>().ok())
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(120.0);
    let tuning = args.next().map(|path| load_tuning(&path)).unwrap_or_default();

    log::info!("Abyss Swarm (headless) starting with seed {seed}");
    let summary = headless::run(seed, seconds, tuning);
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to encode summary: {e}"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation core is driven by an embedding host on the web
}

#[cfg(not(target_arch = "wasm32"))]
fn load_tuning(path: &str) -> abyss_swarm::Tuning {
    let loaded = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| abyss_swarm::Tuning::from_json(&json).map_err(|e| e.to_string()));
    match loaded {
        Ok(tuning) => {
            log::info!("Loaded tuning from {path}");
            tuning
        }
        Err(e) => {
            log::warn!("Failed to load tuning from {path}: {e}; using defaults");
            abyss_swarm::Tuning::default()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use abyss_swarm::consts::SIM_DT;
    use abyss_swarm::sim::{
        ArchetypeTable, EventSink, GameEvent, GamePhase, GameState, Hud, TickInput, UpgradeTable,
    };
    use abyss_swarm::{Tuning, rotate};
    use glam::Vec2;
    use serde::Serialize;

    /// Radius of the autopilot's strafing circle
    const STRAFE_RADIUS: f32 = 220.0;

    #[derive(Debug, Serialize)]
    pub struct Summary {
        pub seed: u64,
        pub phase: GamePhase,
        pub hud: Hud,
        pub upgrades: Vec<(String, u32)>,
        pub bosses_spawned: u32,
    }

    /// Logs notable events as they arrive
    #[derive(Default)]
    struct LogSink {
        bosses_spawned: u32,
    }

    impl EventSink for LogSink {
        fn emit(&mut self, event: GameEvent) {
            match event {
                GameEvent::LevelUp { level, options } => {
                    log::info!("Level {level}: offered {}", options.join(", "));
                }
                GameEvent::UpgradeApplied { id, stacks } => {
                    log::info!("Took {id} (x{stacks})");
                }
                GameEvent::BossSpawned { id } => {
                    self.bosses_spawned += 1;
                    log::warn!("Boss {id} has entered the arena");
                }
                GameEvent::HostileKilled { archetype, boss, .. } => {
                    if boss {
                        log::info!("Boss {archetype} destroyed");
                    } else {
                        log::trace!("Killed {archetype}");
                    }
                }
                GameEvent::PlayerDamaged { amount, hp } => {
                    log::trace!("Took {amount:.1} damage ({hp:.0} hp left)");
                }
                GameEvent::PlayerHealed { amount, hp } => {
                    log::debug!("Healed {amount:.1} ({hp:.0} hp)");
                }
                GameEvent::GameOver { score, level } => {
                    log::info!("Destroyed at level {level}, score {score}");
                }
                GameEvent::Victory { score, level } => {
                    log::info!("Victory at level {level}, score {score}");
                }
            }
        }
    }

    pub fn run(seed: u64, seconds: f32, tuning: Tuning) -> Summary {
        let mut state = GameState::new(seed, ArchetypeTable::builtin(), UpgradeTable::builtin(), tuning);
        let mut sink = LogSink::default();

        let frames = (seconds / SIM_DT).ceil() as u64;
        for _ in 0..frames {
            let input = autopilot(&state);
            state.advance(&input, SIM_DT, &mut sink);

            match state.phase {
                GamePhase::ChoosingUpgrade => {
                    if let Err(e) = state.choose_upgrade(0, &mut sink) {
                        log::error!("Upgrade choice rejected: {e}");
                        break;
                    }
                }
                GamePhase::GameOver | GamePhase::Victory => break,
                GamePhase::Playing => {}
            }
        }

        Summary {
            seed,
            phase: state.phase,
            hud: state.hud(),
            upgrades: state
                .inventory
                .records
                .iter()
                .map(|r| (r.def.id.clone(), r.stacks))
                .collect(),
            bosses_spawned: sink.bosses_spawned,
        }
    }

    /// Circle strafe around the origin, aim at the nearest hostile
    fn autopilot(state: &GameState) -> TickInput {
        let player = &state.world.player;
        let offset = player.pos;
        let tangent = if offset.length() < 1.0 {
            Vec2::X
        } else {
            rotate(offset.normalize(), std::f32::consts::FRAC_PI_2)
        };
        // Drift back toward the strafing circle
        let radial = if offset.length() > STRAFE_RADIUS {
            -offset.normalize_or_zero()
        } else {
            offset.normalize_or_zero() * 0.3
        };

        let aim = state
            .world
            .hostiles
            .iter()
            .filter(|h| h.active)
            .min_by(|a, b| {
                a.pos
                    .distance_squared(player.pos)
                    .total_cmp(&b.pos.distance_squared(player.pos))
            })
            .map(|h| h.pos)
            .unwrap_or(player.pos + player.facing);

        TickInput {
            move_axis: tangent + radial,
            aim,
        }
    }
}
