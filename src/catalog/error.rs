//! Catalog-specific errors.

/// Errors that can occur during catalog operations.
#[derive(Debug)]
pub enum CatalogError {
    /// Referenced table does not exist.
    TableNotFound { name: String },

    /// Table already exists.
    TableExists { name: String },

    /// Referenced column does not exist.
    ColumnNotFound { table: String, name: String },

    /// No index on the given key columns.
    IndexNotFound { table: String, cols: Vec<String> },

    /// An index on the given key columns already exists.
    IndexExists { table: String, cols: Vec<String> },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::TableNotFound { name } => {
                write!(f, "table \"{}\" does not exist", name)
            }
            CatalogError::TableExists { name } => {
                write!(f, "table \"{}\" already exists", name)
            }
            CatalogError::ColumnNotFound { table, name } => {
                write!(f, "column \"{}\" does not exist in table \"{}\"", name, table)
            }
            CatalogError::IndexNotFound { table, cols } => {
                write!(f, "no index on {}({})", table, cols.join(", "))
            }
            CatalogError::IndexExists { table, cols } => {
                write!(f, "index on {}({}) already exists", table, cols.join(", "))
            }
        }
    }
}

impl std::error::Error for CatalogError {}
