//! Catalog data types for table, column, and index metadata.

use crate::datum::ColType;

/// Metadata for a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColMeta {
    /// Table this column belongs to.
    pub tab_name: String,
    /// Column name.
    pub name: String,
    /// Column type.
    pub ty: ColType,
    /// Byte length of the column's slot in a record.
    pub len: usize,
    /// Byte offset of the column within a record.
    pub offset: usize,
}

/// Metadata for an index.
///
/// The order of `cols` is the index key order and is semantically
/// significant: leftmost-prefix matching walks it front to back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMeta {
    /// Table the index is declared on.
    pub tab_name: String,
    /// Key columns in key order.
    pub cols: Vec<ColMeta>,
}

impl IndexMeta {
    /// Returns the key column names in key order.
    pub fn col_names(&self) -> Vec<String> {
        self.cols.iter().map(|c| c.name.clone()).collect()
    }
}

/// Metadata for a table: ordered columns plus declared indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabMeta {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub cols: Vec<ColMeta>,
    /// Indexes in declaration order.
    pub indexes: Vec<IndexMeta>,
}

impl TabMeta {
    /// Looks up a column by name.
    pub fn get_col(&self, col_name: &str) -> Option<&ColMeta> {
        self.cols.iter().find(|c| c.name == col_name)
    }

    /// Whether an index on exactly the given key columns exists.
    pub fn is_index(&self, col_names: &[String]) -> bool {
        self.indexes.iter().any(|idx| {
            idx.cols.len() == col_names.len()
                && idx.cols.iter().zip(col_names).all(|(c, n)| &c.name == n)
        })
    }

    /// Total record width in bytes.
    pub fn record_size(&self) -> usize {
        self.cols.iter().map(|c| c.len).sum()
    }
}
