//! Hostile archetype table
//!
//! Archetypes are immutable after load and shared by every hostile spawned
//! from them. Bad records never abort loading: each one is replaced by the
//! default weak hostile and logged.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_SPAWN_WEIGHT;
use crate::error::{Result, SimError};

const BUILTIN_HOSTILES: &str = include_str!("../../data/hostiles.json");

/// Named movement behavior layered on top of "chase the player"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Behavior {
    #[default]
    Chase,
    /// Lateral sinusoidal sway while pursuing
    Wiggle,
    /// Alternates between pursuit bursts and rests
    StopAndGo,
}

impl Behavior {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "chase" | "default" => Ok(Behavior::Chase),
            "wiggle" => Ok(Behavior::Wiggle),
            "stop_and_go" | "stopandgo" | "stop-and-go" => Ok(Behavior::StopAndGo),
            _ => Err(SimError::UnknownBehavior(s.to_string())),
        }
    }
}

/// Immutable hostile template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostileArchetype {
    pub id: String,
    pub name: String,
    pub hp: f32,
    pub speed: f32,
    pub radius: f32,
    pub color: String,
    pub xp_reward: u32,
    pub score_reward: u64,
    pub behavior: Behavior,
    pub spawn_weight: f32,
    /// First progression level at which the director may pick this archetype
    pub min_level: u32,
    /// Overrides the tuning's default contact damage
    pub contact_dps: Option<f32>,
    pub boss: bool,
}

impl HostileArchetype {
    /// Default weak hostile substituted for unusable records
    pub fn fallback() -> Self {
        Self {
            id: "drifter".to_string(),
            name: "Drifter".to_string(),
            hp: 5.0,
            speed: 60.0,
            radius: 10.0,
            color: "#6b8e9f".to_string(),
            xp_reward: 1,
            score_reward: 10,
            behavior: Behavior::Chase,
            spawn_weight: DEFAULT_SPAWN_WEIGHT,
            min_level: 1,
            contact_dps: None,
            boss: false,
        }
    }

    /// Boss used when the table doesn't flag one
    pub fn fallback_boss() -> Self {
        Self {
            id: "warden".to_string(),
            name: "Abyssal Warden".to_string(),
            hp: 2000.0,
            speed: 45.0,
            radius: 55.0,
            color: "#14213d".to_string(),
            xp_reward: 100,
            score_reward: 5000,
            behavior: Behavior::Chase,
            spawn_weight: 0.0,
            min_level: 1,
            contact_dps: Some(50.0),
            boss: true,
        }
    }
}

/// Wire shape of an archetype record
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArchetype {
    id: Option<String>,
    name: Option<String>,
    hp: Option<f32>,
    speed: Option<f32>,
    radius: Option<f32>,
    color: Option<String>,
    xp_reward: Option<u32>,
    score_reward: Option<u64>,
    behavior: Option<String>,
    weight: Option<f32>,
    min_level: Option<u32>,
    contact_dps: Option<f32>,
    #[serde(default)]
    boss: bool,
}

fn positive(record: &str, field: &'static str, value: Option<f32>) -> Result<f32> {
    match value {
        None => Err(SimError::MissingField {
            record: record.to_string(),
            field,
        }),
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(_) => Err(SimError::InvalidField {
            record: record.to_string(),
            field,
        }),
    }
}

impl TryFrom<RawArchetype> for HostileArchetype {
    type Error = SimError;

    fn try_from(raw: RawArchetype) -> Result<Self> {
        let id = raw.id.ok_or_else(|| SimError::MissingField {
            record: "<unnamed>".to_string(),
            field: "id",
        })?;
        let hp = positive(&id, "hp", raw.hp)?;
        let speed = positive(&id, "speed", raw.speed)?;
        let radius = positive(&id, "radius", raw.radius)?;
        let behavior = match raw.behavior.as_deref() {
            Some(name) => Behavior::parse(name)?,
            None => Behavior::Chase,
        };
        let spawn_weight = match raw.weight {
            Some(w) if w.is_finite() => w.max(0.0),
            _ => DEFAULT_SPAWN_WEIGHT,
        };

        Ok(Self {
            name: raw.name.unwrap_or_else(|| id.clone()),
            id,
            hp,
            speed,
            radius,
            color: raw.color.unwrap_or_else(|| "#ffffff".to_string()),
            xp_reward: raw.xp_reward.unwrap_or(1),
            score_reward: raw.score_reward.unwrap_or(0),
            behavior,
            spawn_weight,
            min_level: raw.min_level.unwrap_or(1),
            contact_dps: raw.contact_dps.filter(|d| d.is_finite() && *d >= 0.0),
            boss: raw.boss,
        })
    }
}

/// Ordered archetype table
#[derive(Debug, Clone)]
pub struct ArchetypeTable {
    entries: Vec<Arc<HostileArchetype>>,
}

impl ArchetypeTable {
    pub fn new(entries: Vec<HostileArchetype>) -> Self {
        let mut entries: Vec<_> = entries.into_iter().map(Arc::new).collect();
        if entries.is_empty() {
            entries.push(Arc::new(HostileArchetype::fallback()));
        }
        Self { entries }
    }

    /// The table shipped in `data/hostiles.json`
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_HOSTILES)
            .unwrap_or_else(|_| Self::new(vec![HostileArchetype::fallback()]))
    }

    /// Parse a table, substituting the default hostile for bad records
    pub fn from_json(json: &str) -> Result<Self> {
        let values: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let entries = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                let parsed = serde_json::from_value::<RawArchetype>(value)
                    .map_err(SimError::from)
                    .and_then(HostileArchetype::try_from);
                parsed.unwrap_or_else(|err| {
                    log::warn!("Hostile record {index} replaced with default: {err}");
                    HostileArchetype::fallback()
                })
            })
            .collect();
        Ok(Self::new(entries))
    }

    /// Parse a table, rejecting the first bad record
    pub fn from_json_strict(json: &str) -> Result<Self> {
        let raws: Vec<RawArchetype> = serde_json::from_str(json)?;
        let entries = raws
            .into_iter()
            .map(HostileArchetype::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(entries))
    }

    /// Parse a table, falling back to the built-in table when the document is unreadable
    pub fn load_or_default(json: &str) -> Self {
        Self::from_json(json).unwrap_or_else(|err| {
            log::warn!("Hostile table unreadable ({err}), using built-in table");
            Self::builtin()
        })
    }

    pub fn entries(&self) -> &[Arc<HostileArchetype>] {
        &self.entries
    }

    pub fn by_id(&self, id: &str) -> Option<&Arc<HostileArchetype>> {
        self.entries.iter().find(|a| a.id == id)
    }

    /// Archetypes the director may pick at `level`, in table order
    pub fn spawnable(&self, level: u32) -> impl Iterator<Item = &Arc<HostileArchetype>> {
        self.entries
            .iter()
            .filter(move |a| !a.boss && a.min_level <= level && a.spawn_weight > 0.0)
    }

    /// The flagged boss archetype, or the default boss
    pub fn boss(&self) -> Arc<HostileArchetype> {
        self.entries
            .iter()
            .find(|a| a.boss)
            .cloned()
            .unwrap_or_else(|| Arc::new(HostileArchetype::fallback_boss()))
    }
}

impl Default for ArchetypeTable {
    fn default() -> Self {
        Self::builtin()
    }
}
