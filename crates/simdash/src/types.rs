//! Shared data types and errors for the simdash core.

use serde::{Deserialize, Serialize};

use crate::units::Unit;

/// Lua-side type of a value produced by a simulator export call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    Table,
    List,
    Number,
    String,
    Boolean,
}

impl ReturnKind {
    /// Lua literal used as fallback when the simulator call yields nothing.
    pub fn default_lua_value(self) -> &'static str {
        match self {
            ReturnKind::Table | ReturnKind::List => "{}",
            ReturnKind::String => "\"\"",
            ReturnKind::Number => "0",
            ReturnKind::Boolean => "false",
        }
    }
}

/// All errors that can occur in the model/generation pipeline.
#[derive(thiserror::Error, Debug)]
pub enum DashError {
    /// A structural rule of the external model was violated.
    #[error("Invalid model: {0}")]
    Schema(String),

    /// A concrete field referenced a prototype that does not exist.
    #[error("Failed to populate model: prototype {0} not found")]
    UnknownPrototype(String),

    /// No conversion path between two units of different families.
    #[error("Missing converter from {src} to {dst}")]
    MissingConverter { src: Unit, dst: Unit },

    /// User-supplied export selection is invalid.
    #[error("Invalid export model: {0}")]
    InvalidExport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type DashResult<T> = Result<T, DashError>;
