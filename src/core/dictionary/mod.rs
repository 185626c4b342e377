// src/core/dictionary/mod.rs
//! Read-only access to the database data dictionary
//!
//! Every query the extractors need is one method on [`DictionarySource`].
//! Rows mirror the dictionary views they come from and keep their nulls, so
//! extractors decide how to default a missing name, type or comment.

mod snapshot;

#[cfg(test)]
pub(crate) mod fixtures;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use super::model::RoutineKind;

pub use snapshot::SnapshotSource;
#[cfg(test)]
pub use snapshot::DictionarySnapshot;

/// A routine as listed by the dictionary, before its details are fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineRow {
    pub name: String,
    pub kind: RoutineKind,
    /// `ALL_PROCEDURES.SUBPROGRAM_ID`, set for packaged routines
    pub subprogram_id: Option<u32>,
}

/// One `ALL_ARGUMENTS` row, nulls preserved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentRow {
    pub name: Option<String>,
    pub data_type: Option<String>,
}

/// Line where a named subprogram is defined inside a package body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionPoint {
    pub name: String,
    /// 1-based line number within the package body source
    pub line: usize,
}

#[cfg(test)]
impl DefinitionPoint {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self { name: name.into(), line }
    }
}

/// One `ALL_DEPENDENCIES` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRow {
    pub referenced_name: String,
    pub referenced_type: String,
    pub referenced_owner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub name: String,
    pub comment: Option<String>,
}

/// `ALL_TAB_COLUMNS` joined with `ALL_COL_COMMENTS`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnRow {
    pub name: String,
    pub data_type: String,
    pub data_length: Option<u32>,
    pub data_precision: Option<u32>,
    pub data_scale: Option<i32>,
    pub nullable: bool,
    pub data_default: Option<String>,
    pub comment: Option<String>,
}

/// Constraint column as used for key marking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyColumnRow {
    pub column: String,
    /// `ALL_CONSTRAINTS.CONSTRAINT_TYPE` code (P, U, R, C, ...)
    pub constraint_type: String,
    pub referenced_table: Option<String>,
}

/// One constraint column, ordered by constraint name and position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRow {
    pub name: String,
    pub constraint_type: String,
    pub column: String,
    pub referenced_table: Option<String>,
    pub referenced_column: Option<String>,
}

/// One index column, ordered by index name and column position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRow {
    pub name: String,
    pub unique: bool,
    pub column: String,
}

/// Read-only queries against the data dictionary of one database
#[async_trait]
pub trait DictionarySource: Send + Sync {
    /// Fails with a connectivity error when the database cannot be reached
    async fn ping(&self) -> Result<()>;

    async fn list_packages(&self, owner: &str) -> Result<Vec<String>>;

    /// Subprograms of a package in `SUBPROGRAM_ID` order
    async fn list_package_routines(&self, owner: &str, package: &str) -> Result<Vec<RoutineRow>>;

    /// Procedures, functions and triggers that no package owns
    async fn list_standalone_routines(&self, owner: &str) -> Result<Vec<RoutineRow>>;

    /// Arguments in declared position order; the return slot comes first
    async fn routine_arguments(
        &self,
        owner: &str,
        name: &str,
        package: Option<&str>,
        subprogram_id: Option<u32>,
    ) -> Result<Vec<ArgumentRow>>;

    /// `PACKAGE BODY` source lines ordered by line number
    async fn package_body_source(&self, owner: &str, package: &str) -> Result<Vec<String>>;

    /// Procedure and function definitions in the package body, by line
    async fn package_definitions(&self, owner: &str, package: &str) -> Result<Vec<DefinitionPoint>>;

    async fn routine_source(&self, owner: &str, name: &str, kind: RoutineKind) -> Result<Vec<String>>;

    /// Static dependencies on tables, views, procedures and functions
    async fn routine_dependencies(&self, owner: &str, name: &str) -> Result<Vec<DependencyRow>>;

    async fn list_tables(&self, owner: &str) -> Result<Vec<TableRow>>;

    async fn table_columns(&self, owner: &str, table: &str) -> Result<Vec<ColumnRow>>;

    async fn key_columns(&self, owner: &str, table: &str) -> Result<Vec<KeyColumnRow>>;

    async fn table_constraints(&self, owner: &str, table: &str) -> Result<Vec<ConstraintRow>>;

    async fn table_indexes(&self, owner: &str, table: &str) -> Result<Vec<IndexRow>>;

    /// `SELECT COUNT(DISTINCT column)` against the user table
    async fn count_distinct(&self, owner: &str, table: &str, column: &str) -> Result<u64>;

    /// Up to `limit` distinct non-null values of the column
    async fn sample_distinct(
        &self,
        owner: &str,
        table: &str,
        column: &str,
        limit: usize,
    ) -> Result<Vec<String>>;
}

/// Quote an identifier for use in generated SQL
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Distinct-count query issued against a user table column
pub fn count_distinct_sql(owner: &str, table: &str, column: &str) -> String {
    format!(
        "SELECT COUNT(DISTINCT {}) FROM {}.{}",
        quote_identifier(column),
        quote_identifier(owner),
        quote_identifier(table)
    )
}

/// Value sampling query issued for low-cardinality columns
pub fn sample_distinct_sql(owner: &str, table: &str, column: &str, limit: usize) -> String {
    let column = quote_identifier(column);
    format!(
        "SELECT DISTINCT {col} FROM {}.{} WHERE {col} IS NOT NULL FETCH FIRST {} ROWS ONLY",
        quote_identifier(owner),
        quote_identifier(table),
        limit,
        col = column
    )
}
