// src/core/table_analyzer.rs
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use super::dictionary::{ColumnRow, ConstraintRow, DictionarySource, IndexRow, KeyColumnRow, TableRow};
use super::model::{Column, Constraint, ConstraintKind, Index, Table};
use super::SAMPLE_LIMIT;

/// Outcome of a table analysis run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableReport {
    /// Successfully analyzed tables, sorted by name
    pub tables: Vec<Table>,
    pub failures: Vec<TableFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableFailure {
    pub table: String,
    pub error: String,
}

/// Describes the tables of a schema, several at a time
#[derive(Clone)]
pub struct TableAnalyzer {
    source: Arc<dyn DictionarySource>,
}

impl TableAnalyzer {
    pub fn new(source: Arc<dyn DictionarySource>) -> Self {
        Self { source }
    }

    /// Analyze every table of `schema` whose name contains `filter`.
    ///
    /// Only the table listing is fatal; a table that fails is logged,
    /// recorded in the report and left out.
    pub async fn analyze_tables(
        &self,
        schema: &str,
        max_concurrency: usize,
        filter: Option<&str>,
    ) -> Result<TableReport> {
        let owner = schema.to_ascii_uppercase();
        info!("🗄️ Starting table analysis for schema: {}", owner);

        let mut rows = self.source.list_tables(&owner).await?;
        if let Some(filter) = filter.map(str::to_ascii_uppercase) {
            rows.retain(|row| row.name.to_ascii_uppercase().contains(&filter));
        }
        info!("Found {} tables to analyze", rows.len());

        let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut pending: HashSet<String> = HashSet::new();

        for row in rows {
            pending.insert(row.name.clone());
            let analyzer = self.clone();
            let semaphore = Arc::clone(&semaphore);
            let owner = owner.clone();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let name = row.name.clone();
                let result = analyzer.analyze_table(&owner, row).await;
                (name, result)
            });
        }

        let mut report = TableReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Ok(table))) => {
                    pending.remove(&name);
                    report.tables.push(table);
                }
                Ok((name, Err(e))) => {
                    pending.remove(&name);
                    error!("❌ Failed to analyze table {}: {}", name, e);
                    report.failures.push(TableFailure { table: name, error: e.to_string() });
                }
                Err(e) => {
                    error!("❌ Table analysis task failed: {}", e);
                }
            }
        }

        // A panicked task never reports its table name back
        let mut panicked: Vec<String> = pending.into_iter().collect();
        panicked.sort();
        for name in panicked {
            report.failures.push(TableFailure { table: name, error: "analysis task panicked".to_string() });
        }

        report.tables.sort_by(|a, b| a.name.cmp(&b.name));
        report.failures.sort_by(|a, b| a.table.cmp(&b.table));

        info!(
            "✅ Table analysis completed: {} tables, {} failures",
            report.tables.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Columns, keys, sampled values, constraints and indexes of one table
    pub async fn analyze_table(&self, schema: &str, table: TableRow) -> Result<Table> {
        describe_table(self.source.as_ref(), &schema.to_ascii_uppercase(), table).await
    }
}

async fn describe_table(source: &dyn DictionarySource, owner: &str, row: TableRow) -> Result<Table> {
    debug!("Analyzing table: {}.{}", owner, row.name);

    let column_rows = source.table_columns(owner, &row.name).await?;
    let mut columns: Vec<Column> = column_rows.into_iter().map(column_from_row).collect();

    let keys = source.key_columns(owner, &row.name).await?;
    mark_keys(&mut columns, &keys);

    for column in columns.iter_mut() {
        sample_column(source, owner, &row.name, column).await;
    }

    let constraints = group_constraints(source.table_constraints(owner, &row.name).await?);
    let indexes = group_indexes(source.table_indexes(owner, &row.name).await?);

    debug!(
        "Table {}: {} columns, {} constraints, {} indexes",
        row.name,
        columns.len(),
        constraints.len(),
        indexes.len()
    );

    Ok(Table {
        name: row.name,
        schema: owner.to_string(),
        comment: row.comment,
        columns,
        constraints,
        indexes,
    })
}

fn column_from_row(row: ColumnRow) -> Column {
    Column {
        name: row.name,
        data_type: row.data_type,
        data_length: row.data_length,
        data_precision: row.data_precision,
        data_scale: row.data_scale,
        nullable: row.nullable,
        default_value: row.data_default.map(|d| d.trim().to_string()),
        comment: row.comment,
        ..Column::default()
    }
}

fn mark_keys(columns: &mut [Column], keys: &[KeyColumnRow]) {
    for key in keys {
        let Some(column) = columns.iter_mut().find(|c| c.name == key.column) else {
            continue;
        };

        match ConstraintKind::from_code(&key.constraint_type) {
            ConstraintKind::PrimaryKey => column.is_primary_key = true,
            ConstraintKind::ForeignKey => {
                column.is_foreign_key = true;
                column.foreign_key_reference = key.referenced_table.clone();
            }
            _ => {}
        }
    }
}

/// Distinct count, plus the values themselves for low-cardinality columns.
/// The column is only touched when every query succeeds.
async fn sample_column(source: &dyn DictionarySource, owner: &str, table: &str, column: &mut Column) {
    let count = match source.count_distinct(owner, table, &column.name).await {
        Ok(count) => count,
        Err(e) => {
            warn!("⚠️ Could not count distinct values of {}.{}: {}", table, column.name, e);
            return;
        }
    };

    let values = if count < SAMPLE_LIMIT as u64 {
        match source.sample_distinct(owner, table, &column.name, SAMPLE_LIMIT).await {
            Ok(values) => Some(values),
            Err(e) => {
                warn!("⚠️ Could not sample values of {}.{}: {}", table, column.name, e);
                return;
            }
        }
    } else {
        None
    };

    column.distinct_count = Some(count);
    column.sample_values = values;
    column.sampled = true;
}

fn group_constraints(rows: Vec<ConstraintRow>) -> Vec<Constraint> {
    let mut grouped: BTreeMap<String, Constraint> = BTreeMap::new();

    for row in rows {
        let constraint = grouped.entry(row.name.clone()).or_insert_with(|| Constraint {
            name: row.name.clone(),
            kind: ConstraintKind::from_code(&row.constraint_type),
            columns: Vec::new(),
            reference_table: None,
            reference_columns: None,
        });

        constraint.columns.push(row.column);
        if row.referenced_table.is_some() {
            constraint.reference_table = row.referenced_table;
        }
        if let Some(referenced) = row.referenced_column {
            constraint.reference_columns.get_or_insert_with(Vec::new).push(referenced);
        }
    }

    grouped.into_values().collect()
}

fn group_indexes(rows: Vec<IndexRow>) -> Vec<Index> {
    let mut grouped: BTreeMap<String, Index> = BTreeMap::new();

    for row in rows {
        grouped
            .entry(row.name.clone())
            .or_insert_with(|| Index {
                name: row.name.clone(),
                unique: row.unique,
                columns: Vec::new(),
            })
            .columns
            .push(row.column);
    }

    grouped.into_values().collect()
}
