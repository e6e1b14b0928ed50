//! Engine-level errors: contract breaches and load failures.
//!
//! Rule violations are not errors here. They are reported through a
//! `Verdict`; `EngineError` means the caller handed the engine something
//! it cannot reason about.

use thiserror::Error;

use crate::board::{TerritoryId, UnitId};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unknown unit: {0:?}")]
    UnknownUnit(UnitId),

    #[error("unknown territory: {0:?}")]
    UnknownTerritory(TerritoryId),

    #[error("unknown name: {0}")]
    UnknownName(String),

    #[error("candidate references unit {0:?} that is not among the moving units")]
    StrayAssignment(UnitId),

    #[error("accounting error: {0}")]
    Accounting(String),

    #[error("engine not ready: {0}")]
    NotReady(&'static str),

    #[error("invalid scenario: {0}")]
    Scenario(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
