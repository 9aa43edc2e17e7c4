//! SQL statement representation consumed by the planner.
//!
//! Parsing the SQL surface is handled by an external frontend; this
//! module only defines the statement shapes the planner dispatches on.

mod ast;

pub use ast::{
    ColDef, CreateIndexStmt, CreateTableStmt, DeleteStmt, DropIndexStmt, DropTableStmt,
    InsertStmt, OrderBy, SelectStmt, ShowIndexStmt, Statement, UpdateStmt,
};
