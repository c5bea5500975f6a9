use std::path::PathBuf;

use thiserror::Error;

use crate::db::SystemId;

/// Convenient result alias for the navigation library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
///
/// Ordinary infeasibility (no route, missing jump tables, exhausted search
/// budgets) is never reported through this type; it is carried inside
/// [`crate::routing::RouteOutcome`]. These variants cover collaborator and
/// programmer failures only.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when attempting to load a schema that is not supported.
    #[error(
        "unsupported dataset schema; expected SolarSystems/Jumps or mapSolarSystems tables"
    )]
    UnsupportedSchema,

    /// Raised when a system name could not be found in the snapshot.
    #[error("unknown system name: {name}{}", format_suggestions(.suggestions))]
    UnknownSystem {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when graph data cannot form a consistent snapshot.
    #[error("malformed graph snapshot: {message}")]
    MalformedSnapshot { message: String },

    /// Raised when a system identifier appears more than once in the source data.
    #[error("duplicate system id {id} in graph source")]
    DuplicateSystem { id: SystemId },

    /// Raised when a range bucket outside 1..=10 is requested.
    #[error("range bucket {value} is outside the supported range 1..=10")]
    InvalidRangeBucket { value: i64 },

    /// Raised when a neighbor row blob cannot be encoded or decoded.
    #[error("neighbor codec error: {message}")]
    NeighborCodec { message: String },

    /// Raised when serializing a neighbor table snapshot fails.
    #[error("failed to serialize neighbor table: {message}")]
    NeighborTableSerialize { message: String },

    /// Raised when loading a neighbor table snapshot from a file fails.
    #[error("failed to load neighbor table from {path}: {message}")]
    NeighborTableLoad { path: PathBuf, message: String },

    /// Raised when engine configuration fails validation.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON errors (configuration and risk heatmaps).
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
