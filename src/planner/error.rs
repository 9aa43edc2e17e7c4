//! Planner-specific errors.

use crate::catalog::CatalogError;

/// Errors that can occur during planning.
#[derive(Debug)]
pub enum PlannerError {
    /// Planner invariant violation (unexpected AST shape, malformed
    /// join condition).
    Internal(String),

    /// No usable join executor is enabled.
    Config(String),

    /// ORDER BY column matches more than one selected table.
    AmbiguousColumn { name: String },

    /// ORDER BY column matches no selected table.
    ColumnNotFound { name: String },

    /// Catalog error during table lookup.
    Catalog(CatalogError),
}

impl std::fmt::Display for PlannerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlannerError::Internal(msg) => write!(f, "internal planner error: {}", msg),
            PlannerError::Config(msg) => write!(f, "engine configuration error: {}", msg),
            PlannerError::AmbiguousColumn { name } => {
                write!(f, "column reference \"{}\" is ambiguous", name)
            }
            PlannerError::ColumnNotFound { name } => {
                write!(f, "column \"{}\" does not exist", name)
            }
            PlannerError::Catalog(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlannerError::Catalog(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CatalogError> for PlannerError {
    fn from(e: CatalogError) -> Self {
        PlannerError::Catalog(e)
    }
}
