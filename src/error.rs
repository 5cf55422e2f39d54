//! Error types for static data loading and the command surface

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("malformed table JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown stat `{0}`")]
    UnknownStat(String),

    #[error("unknown special effect `{0}`")]
    UnknownEffect(String),

    #[error("unknown upgrade kind `{0}`")]
    UnknownKind(String),

    #[error("unknown movement behavior `{0}`")]
    UnknownBehavior(String),

    #[error("record `{record}` is missing field `{field}`")]
    MissingField { record: String, field: &'static str },

    #[error("record `{record}` has invalid `{field}`")]
    InvalidField { record: String, field: &'static str },

    #[error("unknown upgrade `{0}`")]
    UnknownUpgrade(String),

    #[error("no upgrade choice is pending")]
    NotChoosingUpgrade,

    #[error("upgrade choice {0} is out of range")]
    InvalidChoice(usize),
}

pub type Result<T> = std::result::Result<T, SimError>;
