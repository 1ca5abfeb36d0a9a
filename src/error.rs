//! Error types for Flowplan.
//!
//! Compilation problems (unknown keys, malformed recipes) and an unreachable
//! solver are errors. An infeasible or unbounded solve is not: it is reported
//! through [`SolveStatus`](crate::solver::SolveStatus) so callers can render it.

use std::fmt;

/// Which settings family (or dataset field) referenced an unknown key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Input,
    Output,
    ResourceLimit,
    Recipe,
    MaxItem,
    PowerShare,
    /// An item named by a recipe but missing from the dataset catalog.
    RecipeItem,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceKind::Input => "input item",
            ReferenceKind::Output => "output item",
            ReferenceKind::ResourceLimit => "resource",
            ReferenceKind::Recipe => "recipe",
            ReferenceKind::MaxItem => "maximized item",
            ReferenceKind::PowerShare => "power item",
            ReferenceKind::RecipeItem => "recipe item",
        };
        f.write_str(name)
    }
}

/// Crate-wide error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown {kind} '{key}'")]
    UnknownReference { kind: ReferenceKind, key: String },

    #[error("invalid recipe '{recipe}': {reason}")]
    InvalidRecipe { recipe: String, reason: String },

    #[error("solver unavailable: {0}")]
    SolverUnavailable(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn unknown(kind: ReferenceKind, key: impl Into<String>) -> Self {
        Error::UnknownReference {
            kind,
            key: key.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
