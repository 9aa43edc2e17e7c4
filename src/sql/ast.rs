//! Abstract Syntax Tree (AST) for SQL statements.
//!
//! These are the semantically-validated statement shapes handed to the
//! planner. Expression-level details (the WHERE clause, SET values,
//! INSERT rows) arrive pre-extracted on [`Query`](crate::query::Query);
//! the AST carries what the planner dispatches on: the statement kind,
//! target table, DDL column information, and ORDER BY.

use crate::datum::ColType;

/// A SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// SELECT statement.
    Select(SelectStmt),
    /// INSERT statement.
    Insert(InsertStmt),
    /// UPDATE statement.
    Update(UpdateStmt),
    /// DELETE statement.
    Delete(DeleteStmt),
    /// CREATE TABLE statement.
    CreateTable(CreateTableStmt),
    /// DROP TABLE statement.
    DropTable(DropTableStmt),
    /// CREATE INDEX statement.
    CreateIndex(CreateIndexStmt),
    /// DROP INDEX statement.
    DropIndex(DropIndexStmt),
    /// SHOW INDEX statement.
    ShowIndex(ShowIndexStmt),
}

/// SELECT statement.
///
/// Selected columns, referenced tables, and predicates live on the
/// surrounding [`Query`](crate::query::Query).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStmt {
    /// ORDER BY clause, if present.
    pub order_by: Option<OrderBy>,
}

/// ORDER BY clause.
///
/// The column name is unqualified; the planner resolves it against the
/// schemas of every selected table.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Column name to order by.
    pub col_name: String,
    /// Descending order when true.
    pub desc: bool,
}

/// INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    /// Target table name.
    pub table: String,
}

/// UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    /// Target table name.
    pub table: String,
}

/// DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    /// Target table name.
    pub table: String,
}

/// CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStmt {
    /// Table name.
    pub table: String,
    /// Column definitions in declaration order.
    pub columns: Vec<ColDef>,
}

/// DROP TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStmt {
    /// Table name.
    pub table: String,
}

/// CREATE INDEX statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexStmt {
    /// Table name.
    pub table: String,
    /// Index key columns in key order.
    pub columns: Vec<String>,
}

/// DROP INDEX statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DropIndexStmt {
    /// Table name.
    pub table: String,
    /// Index key columns in key order.
    pub columns: Vec<String>,
}

/// SHOW INDEX statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowIndexStmt {
    /// Table name.
    pub table: String,
}

/// A column definition in CREATE TABLE.
#[derive(Debug, Clone, PartialEq)]
pub struct ColDef {
    /// Column name.
    pub name: String,
    /// Column type.
    pub ty: ColType,
    /// Byte length of the column's record slot.
    pub len: usize,
}
