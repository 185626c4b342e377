// src/core/dictionary/snapshot.rs
//! Dictionary source backed by a JSON export of dictionary rows
//!
//! The export holds, per schema, the rows a live connection would return for
//! the dictionary views the extractors query. Lookups by owner are
//! case-insensitive; object names are matched the same way.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::Path;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CatalogError, Result};
use super::super::model::RoutineKind;
use super::{
    ArgumentRow, ColumnRow, ConstraintRow, DefinitionPoint, DependencyRow, DictionarySource,
    IndexRow, KeyColumnRow, RoutineRow, TableRow, count_distinct_sql, sample_distinct_sql,
};

/// Object types `ALL_DEPENDENCIES` is filtered to
const DEPENDENCY_TYPES: [&str; 4] = ["TABLE", "VIEW", "PROCEDURE", "FUNCTION"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DictionarySnapshot {
    /// Keyed by owner
    #[serde(default)]
    pub schemas: BTreeMap<String, SchemaSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    #[serde(default)]
    pub packages: Vec<PackageSnapshot>,

    #[serde(default)]
    pub standalone: Vec<StandaloneSnapshot>,

    #[serde(default)]
    pub dependencies: Vec<DependencySnapshot>,

    #[serde(default)]
    pub tables: Vec<TableSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageSnapshot {
    pub name: String,

    /// `PACKAGE BODY` source, one entry per line
    #[serde(default)]
    pub body: Vec<String>,

    #[serde(default)]
    pub definitions: Vec<DefinitionPoint>,

    #[serde(default)]
    pub subprograms: Vec<SubprogramSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubprogramSnapshot {
    pub name: String,
    pub subprogram_id: u32,

    /// In position order; an unnamed first argument is the return slot
    #[serde(default)]
    pub arguments: Vec<ArgumentRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandaloneSnapshot {
    pub name: String,

    /// Raw `OBJECT_TYPE`; rows with a type other than procedure, function or trigger are ignored
    pub object_type: String,

    #[serde(default)]
    pub source: Vec<String>,

    #[serde(default)]
    pub arguments: Vec<ArgumentRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencySnapshot {
    /// Dependent object
    pub name: String,
    pub referenced_name: String,
    pub referenced_type: String,
    /// Defaults to the dependent's owner
    pub referenced_owner: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub name: String,
    pub comment: Option<String>,

    #[serde(default)]
    pub columns: Vec<ColumnSnapshot>,

    #[serde(default)]
    pub constraints: Vec<ConstraintRow>,

    #[serde(default)]
    pub indexes: Vec<IndexRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    #[serde(flatten)]
    pub column: ColumnRow,

    /// Exported column data, nulls included
    #[serde(default)]
    pub values: Option<Vec<Option<String>>>,
}

impl DictionarySnapshot {
    fn schema(&self, owner: &str) -> Option<&SchemaSnapshot> {
        self.schemas
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(owner))
            .map(|(_, schema)| schema)
    }
}

impl SchemaSnapshot {
    fn package(&self, name: &str) -> Option<&PackageSnapshot> {
        self.packages.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    fn table(&self, owner: &str, name: &str) -> Result<&TableSnapshot> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CatalogError::query(
                format!("{}.{}", owner, name),
                "table or view does not exist",
            ))
    }
}

impl TableSnapshot {
    fn column(&self, owner: &str, column: &str) -> Result<&ColumnSnapshot> {
        self.columns
            .iter()
            .find(|c| c.column.name.eq_ignore_ascii_case(column))
            .ok_or_else(|| CatalogError::query(
                count_distinct_sql(owner, &self.name, column),
                "invalid identifier",
            ))
    }
}

impl ColumnSnapshot {
    /// Distinct non-null values in export order
    fn distinct_values(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.values
            .iter()
            .flatten()
            .filter_map(|value| value.as_deref())
            .filter(|value| seen.insert(*value))
            .collect()
    }
}

/// [`DictionarySource`] answering from a [`DictionarySnapshot`]
pub struct SnapshotSource {
    snapshot: DictionarySnapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: DictionarySnapshot) -> Self {
        Self { snapshot }
    }

    /// Load an exported snapshot; an unreadable file counts as an unreachable database
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            CatalogError::Connectivity(format!(
                "cannot open dictionary snapshot {}: {}",
                path.display(),
                e
            ))
        })?;
        let snapshot: DictionarySnapshot = serde_json::from_str(&content)?;
        info!("Loaded dictionary snapshot with {} schema(s) from {}", snapshot.schemas.len(), path.display());
        Ok(Self::new(snapshot))
    }

    fn schema(&self, owner: &str) -> Option<&SchemaSnapshot> {
        let schema = self.snapshot.schema(owner);
        if schema.is_none() {
            debug!("Schema {} not present in snapshot", owner);
        }
        schema
    }

    fn table(&self, owner: &str, table: &str) -> Result<&TableSnapshot> {
        match self.schema(owner) {
            Some(schema) => schema.table(owner, table),
            None => Err(CatalogError::query(
                format!("{}.{}", owner, table),
                "table or view does not exist",
            )),
        }
    }
}

#[async_trait]
impl DictionarySource for SnapshotSource {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn list_packages(&self, owner: &str) -> Result<Vec<String>> {
        Ok(self
            .schema(owner)
            .map(|s| s.packages.iter().map(|p| p.name.clone()).collect())
            .unwrap_or_default())
    }

    async fn list_package_routines(&self, owner: &str, package: &str) -> Result<Vec<RoutineRow>> {
        let Some(package) = self.schema(owner).and_then(|s| s.package(package)) else {
            return Ok(Vec::new());
        };

        let mut subprograms: Vec<&SubprogramSnapshot> = package.subprograms.iter().collect();
        subprograms.sort_by_key(|s| s.subprogram_id);

        Ok(subprograms
            .into_iter()
            .map(|s| RoutineRow {
                name: s.name.clone(),
                kind: RoutineKind::from_leading_argument(
                    s.arguments.first().map(|a| a.name.as_deref()),
                ),
                subprogram_id: Some(s.subprogram_id),
            })
            .collect())
    }

    async fn list_standalone_routines(&self, owner: &str) -> Result<Vec<RoutineRow>> {
        let Some(schema) = self.schema(owner) else {
            return Ok(Vec::new());
        };

        Ok(schema
            .standalone
            .iter()
            .filter_map(|s| match RoutineKind::from_object_type(&s.object_type) {
                Some(kind) => Some(RoutineRow {
                    name: s.name.clone(),
                    kind,
                    subprogram_id: None,
                }),
                None => {
                    debug!("Skipping {} of unsupported type {}", s.name, s.object_type);
                    None
                }
            })
            .collect())
    }

    async fn routine_arguments(
        &self,
        owner: &str,
        name: &str,
        package: Option<&str>,
        subprogram_id: Option<u32>,
    ) -> Result<Vec<ArgumentRow>> {
        let Some(schema) = self.schema(owner) else {
            return Ok(Vec::new());
        };

        let arguments = match package {
            Some(package) => schema
                .package(package)
                .map(|p| {
                    p.subprograms
                        .iter()
                        .filter(|s| s.name.eq_ignore_ascii_case(name))
                        .filter(|s| subprogram_id.map_or(true, |id| s.subprogram_id == id))
                        .flat_map(|s| s.arguments.iter().cloned())
                        .collect()
                })
                .unwrap_or_default(),
            None => schema
                .standalone
                .iter()
                .filter(|s| s.name.eq_ignore_ascii_case(name))
                .flat_map(|s| s.arguments.iter().cloned())
                .collect(),
        };

        Ok(arguments)
    }

    async fn package_body_source(&self, owner: &str, package: &str) -> Result<Vec<String>> {
        Ok(self
            .schema(owner)
            .and_then(|s| s.package(package))
            .map(|p| p.body.clone())
            .unwrap_or_default())
    }

    async fn package_definitions(&self, owner: &str, package: &str) -> Result<Vec<DefinitionPoint>> {
        let mut definitions = self
            .schema(owner)
            .and_then(|s| s.package(package))
            .map(|p| p.definitions.clone())
            .unwrap_or_default();
        definitions.sort_by_key(|d| d.line);
        Ok(definitions)
    }

    async fn routine_source(&self, owner: &str, name: &str, kind: RoutineKind) -> Result<Vec<String>> {
        Ok(self
            .schema(owner)
            .and_then(|s| {
                s.standalone.iter().find(|r| {
                    r.name.eq_ignore_ascii_case(name)
                        && RoutineKind::from_object_type(&r.object_type) == Some(kind)
                })
            })
            .map(|r| r.source.clone())
            .unwrap_or_default())
    }

    async fn routine_dependencies(&self, owner: &str, name: &str) -> Result<Vec<DependencyRow>> {
        let Some(schema) = self.schema(owner) else {
            return Ok(Vec::new());
        };

        Ok(schema
            .dependencies
            .iter()
            .filter(|d| d.name.eq_ignore_ascii_case(name))
            .filter(|d| DEPENDENCY_TYPES.contains(&d.referenced_type.to_ascii_uppercase().as_str()))
            .map(|d| DependencyRow {
                referenced_name: d.referenced_name.clone(),
                referenced_type: d.referenced_type.clone(),
                referenced_owner: d
                    .referenced_owner
                    .clone()
                    .unwrap_or_else(|| owner.to_ascii_uppercase()),
            })
            .collect())
    }

    async fn list_tables(&self, owner: &str) -> Result<Vec<TableRow>> {
        Ok(self
            .schema(owner)
            .map(|s| {
                s.tables
                    .iter()
                    .map(|t| TableRow {
                        name: t.name.clone(),
                        comment: t.comment.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn table_columns(&self, owner: &str, table: &str) -> Result<Vec<ColumnRow>> {
        let table = self.table(owner, table)?;
        Ok(table.columns.iter().map(|c| c.column.clone()).collect())
    }

    async fn key_columns(&self, owner: &str, table: &str) -> Result<Vec<KeyColumnRow>> {
        let table = self.table(owner, table)?;
        Ok(table
            .constraints
            .iter()
            .map(|c| KeyColumnRow {
                column: c.column.clone(),
                constraint_type: c.constraint_type.clone(),
                referenced_table: c.referenced_table.clone(),
            })
            .collect())
    }

    async fn table_constraints(&self, owner: &str, table: &str) -> Result<Vec<ConstraintRow>> {
        let table = self.table(owner, table)?;
        let mut rows = table.constraints.clone();
        // Stable sort keeps the exported column position order within a constraint
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn table_indexes(&self, owner: &str, table: &str) -> Result<Vec<IndexRow>> {
        let table = self.table(owner, table)?;
        let mut rows = table.indexes.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn count_distinct(&self, owner: &str, table: &str, column: &str) -> Result<u64> {
        let column = self.table(owner, table)?.column(owner, column)?;
        Ok(column.distinct_values().len() as u64)
    }

    async fn sample_distinct(
        &self,
        owner: &str,
        table: &str,
        column: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        let table_snapshot = self.table(owner, table)?;
        let column_snapshot = table_snapshot.column(owner, column).map_err(|_| {
            CatalogError::query(sample_distinct_sql(owner, table, column, limit), "invalid identifier")
        })?;

        Ok(column_snapshot
            .distinct_values()
            .into_iter()
            .take(limit)
            .map(str::to_string)
            .collect())
    }
}
