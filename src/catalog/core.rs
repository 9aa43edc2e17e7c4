//! The in-memory catalog.

use std::collections::HashMap;

use crate::datum::ColType;
use crate::sql::ColDef;

use super::error::CatalogError;
use super::types::{ColMeta, IndexMeta, TabMeta};

/// Maps table names to their metadata.
///
/// Column byte offsets are assigned at creation time by accumulating
/// declared column lengths, so a table's record layout is fixed once
/// `create_table` returns.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: HashMap<String, TabMeta>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Looks up a table's metadata.
    pub fn get_table(&self, name: &str) -> Result<&TabMeta, CatalogError> {
        self.tables
            .get(name)
            .ok_or_else(|| CatalogError::TableNotFound {
                name: name.to_string(),
            })
    }

    /// Whether a table exists.
    pub fn is_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Creates a table from column definitions.
    pub fn create_table(&mut self, name: &str, columns: &[ColDef]) -> Result<(), CatalogError> {
        if self.tables.contains_key(name) {
            return Err(CatalogError::TableExists {
                name: name.to_string(),
            });
        }
        let mut cols = Vec::with_capacity(columns.len());
        let mut offset = 0;
        for def in columns {
            let len = type_len(def.ty, def.len);
            cols.push(ColMeta {
                tab_name: name.to_string(),
                name: def.name.clone(),
                ty: def.ty,
                len,
                offset,
            });
            offset += len;
        }
        self.tables.insert(
            name.to_string(),
            TabMeta {
                name: name.to_string(),
                cols,
                indexes: Vec::new(),
            },
        );
        Ok(())
    }

    /// Drops a table and all its indexes.
    pub fn drop_table(&mut self, name: &str) -> Result<(), CatalogError> {
        self.tables
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| CatalogError::TableNotFound {
                name: name.to_string(),
            })
    }

    /// Creates an index on the given key columns, in key order.
    pub fn create_index(
        &mut self,
        tab_name: &str,
        col_names: &[String],
    ) -> Result<(), CatalogError> {
        let tab = self
            .tables
            .get_mut(tab_name)
            .ok_or_else(|| CatalogError::TableNotFound {
                name: tab_name.to_string(),
            })?;
        if tab.is_index(col_names) {
            return Err(CatalogError::IndexExists {
                table: tab_name.to_string(),
                cols: col_names.to_vec(),
            });
        }
        let mut cols = Vec::with_capacity(col_names.len());
        for col_name in col_names {
            let col = tab
                .get_col(col_name)
                .ok_or_else(|| CatalogError::ColumnNotFound {
                    table: tab_name.to_string(),
                    name: col_name.clone(),
                })?;
            cols.push(col.clone());
        }
        tab.indexes.push(IndexMeta {
            tab_name: tab_name.to_string(),
            cols,
        });
        Ok(())
    }

    /// Drops the index on exactly the given key columns.
    pub fn drop_index(
        &mut self,
        tab_name: &str,
        col_names: &[String],
    ) -> Result<(), CatalogError> {
        let tab = self
            .tables
            .get_mut(tab_name)
            .ok_or_else(|| CatalogError::TableNotFound {
                name: tab_name.to_string(),
            })?;
        let pos = tab.indexes.iter().position(|idx| {
            idx.cols.len() == col_names.len()
                && idx.cols.iter().zip(col_names).all(|(c, n)| &c.name == n)
        });
        match pos {
            Some(i) => {
                tab.indexes.remove(i);
                Ok(())
            }
            None => Err(CatalogError::IndexNotFound {
                table: tab_name.to_string(),
                cols: col_names.to_vec(),
            }),
        }
    }
}

/// Returns the record slot length for a column type declaration.
///
/// Strings carry their declared length; INT and FLOAT are fixed-width.
pub(crate) fn type_len(ty: ColType, declared: usize) -> usize {
    match ty {
        ColType::Int => 4,
        ColType::Float => 8,
        ColType::Str => declared,
    }
}
