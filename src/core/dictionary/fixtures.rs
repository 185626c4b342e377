// src/core/dictionary/fixtures.rs
//! Test-only dictionary contents and wrapper sources

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use serde_json::json;

use crate::error::{CatalogError, Result};
use super::super::model::RoutineKind;
use super::{
    ArgumentRow, ColumnRow, ConstraintRow, DefinitionPoint, DependencyRow, DictionarySnapshot,
    DictionarySource, IndexRow, KeyColumnRow, RoutineRow, SnapshotSource, TableRow,
};

/// Package body used by the slicing and extraction tests
pub fn order_pkg_body() -> Vec<String> {
    [
        "PACKAGE BODY order_pkg AS",
        "  PROCEDURE place_order(p_customer NUMBER, p_amount NUMBER) IS",
        "  BEGIN",
        "    -- record the order",
        "    INSERT INTO orders (customer_id, amount) VALUES (p_customer, p_amount);",
        "    SELECT name INTO v_name FROM customers WHERE customer_id = p_customer;",
        "  END place_order;",
        "  FUNCTION order_total(p_order_id NUMBER) RETURN NUMBER IS",
        "  BEGIN",
        "    RETURN 0;",
        "  END order_total;",
        "  FUNCTION order_total(p_order_id NUMBER, p_currency VARCHAR2) RETURN NUMBER IS",
        "    v_total NUMBER; /* running",
        "       total */",
        "  BEGIN",
        "    SELECT SUM(amount) INTO v_total FROM orders WHERE order_id = p_order_id;",
        "    RETURN v_total;",
        "  END order_total;",
        "END order_pkg;",
    ]
    .iter()
    .map(|line| line.to_string())
    .collect()
}

pub fn order_pkg_definitions() -> Vec<DefinitionPoint> {
    vec![
        DefinitionPoint::new("PLACE_ORDER", 2),
        DefinitionPoint::new("ORDER_TOTAL", 8),
        DefinitionPoint::new("ORDER_TOTAL", 12),
    ]
}

fn status_values() -> serde_json::Value {
    json!(["NEW", "SHIPPED", null, "NEW", "CANCELLED"])
}

fn customer_names() -> serde_json::Value {
    let names: Vec<String> = (1..=25).map(|i| format!("Customer {}", i)).collect();
    json!(names)
}

/// One schema with a package, standalone routines, dependencies and two tables
pub fn sales_snapshot() -> DictionarySnapshot {
    serde_json::from_value(json!({
        "schemas": {
            "SALES": {
                "packages": [{
                    "name": "ORDER_PKG",
                    "body": order_pkg_body(),
                    "definitions": order_pkg_definitions(),
                    "subprograms": [
                        { "name": "PLACE_ORDER", "subprogram_id": 1, "arguments": [
                            { "name": "P_CUSTOMER", "data_type": "NUMBER" },
                            { "name": "P_AMOUNT", "data_type": "NUMBER" }
                        ]},
                        { "name": "ORDER_TOTAL", "subprogram_id": 3, "arguments": [
                            { "name": null, "data_type": "NUMBER" },
                            { "name": "P_ORDER_ID", "data_type": "NUMBER" },
                            { "name": "P_CURRENCY", "data_type": null }
                        ]},
                        { "name": "ORDER_TOTAL", "subprogram_id": 2, "arguments": [
                            { "name": null, "data_type": "NUMBER" },
                            { "name": "P_ORDER_ID", "data_type": "NUMBER" }
                        ]}
                    ]
                }],
                "standalone": [
                    { "name": "PURGE_ORDERS", "object_type": "PROCEDURE",
                      "source": [
                          "PROCEDURE purge_orders IS",
                          "BEGIN",
                          "  DELETE FROM orders WHERE status = 'CANCELLED'; -- housekeeping",
                          "END;"
                      ],
                      "arguments": [] },
                    { "name": "ORDER_ROW_T", "object_type": "TYPE" },
                    { "name": "ORDERS_AUDIT_TRG", "object_type": "TRIGGER",
                      "source": [
                          "TRIGGER orders_audit_trg AFTER UPDATE ON orders FOR EACH ROW",
                          "BEGIN",
                          "  INSERT INTO orders_audit (order_id) VALUES (:new.order_id);",
                          "END;"
                      ] }
                ],
                "dependencies": [
                    { "name": "PLACE_ORDER", "referenced_name": "ORDERS", "referenced_type": "TABLE" },
                    { "name": "PLACE_ORDER", "referenced_name": "CUSTOMERS", "referenced_type": "TABLE" },
                    { "name": "PLACE_ORDER", "referenced_name": "DUAL", "referenced_type": "SYNONYM",
                      "referenced_owner": "PUBLIC" },
                    { "name": "PLACE_ORDER", "referenced_name": "FX_RATE", "referenced_type": "FUNCTION",
                      "referenced_owner": "FINANCE" },
                    { "name": "ORDER_TOTAL", "referenced_name": "ORDERS", "referenced_type": "TABLE" },
                    { "name": "PURGE_ORDERS", "referenced_name": "ORDERS", "referenced_type": "TABLE" },
                    { "name": "ORDERS_AUDIT_TRG", "referenced_name": "ORDERS_AUDIT", "referenced_type": "TABLE" }
                ],
                "tables": [
                    {
                        "name": "ORDERS",
                        "comment": "Customer orders",
                        "columns": [
                            { "name": "ORDER_ID", "data_type": "NUMBER", "data_precision": 10,
                              "data_scale": 0, "nullable": false, "values": ["1", "2", "3", "4", "5"] },
                            { "name": "CUSTOMER_ID", "data_type": "NUMBER", "data_precision": 10,
                              "nullable": false, "comment": "Ordering customer" },
                            { "name": "STATUS", "data_type": "VARCHAR2", "data_length": 20,
                              "nullable": true, "data_default": "'NEW'", "values": status_values() }
                        ],
                        "constraints": [
                            { "name": "ORDERS_PK", "constraint_type": "P", "column": "ORDER_ID",
                              "referenced_table": null, "referenced_column": null },
                            { "name": "ORDERS_CUSTOMER_FK", "constraint_type": "R", "column": "CUSTOMER_ID",
                              "referenced_table": "CUSTOMERS", "referenced_column": "CUSTOMER_ID" },
                            { "name": "ORDERS_STATUS_CK", "constraint_type": "C", "column": "STATUS",
                              "referenced_table": null, "referenced_column": null }
                        ],
                        "indexes": [
                            { "name": "ORDERS_STATUS_IX", "unique": false, "column": "STATUS" },
                            { "name": "ORDERS_PK", "unique": true, "column": "ORDER_ID" }
                        ]
                    },
                    {
                        "name": "CUSTOMERS",
                        "comment": null,
                        "columns": [
                            { "name": "CUSTOMER_ID", "data_type": "NUMBER", "nullable": false },
                            { "name": "NAME", "data_type": "VARCHAR2", "data_length": 100,
                              "nullable": true, "values": customer_names() }
                        ],
                        "constraints": [
                            { "name": "CUSTOMERS_PK", "constraint_type": "P", "column": "CUSTOMER_ID",
                              "referenced_table": null, "referenced_column": null }
                        ],
                        "indexes": []
                    }
                ]
            }
        }
    }))
    .expect("fixture snapshot is valid")
}

pub fn sales_source() -> Arc<dyn DictionarySource> {
    Arc::new(SnapshotSource::new(sales_snapshot()))
}

/// Injects query failures for chosen objects
#[derive(Default)]
pub struct Faults {
    /// Tables whose column query fails
    pub column_fetch: HashSet<String>,
    /// `TABLE.COLUMN` pairs whose distinct count fails
    pub distinct_count: HashSet<String>,
    /// Routines whose dependency query fails
    pub dependencies: HashSet<String>,
}

/// Wraps a snapshot, counting fetches and injecting faults
pub struct InstrumentedSource {
    inner: SnapshotSource,
    faults: Faults,
    body_fetches: AtomicUsize,
    definition_fetches: AtomicUsize,
    column_delay: Option<Duration>,
    columns_in_flight: AtomicUsize,
    peak_columns_in_flight: AtomicUsize,
}

impl InstrumentedSource {
    pub fn new(snapshot: DictionarySnapshot) -> Self {
        Self::with_faults(snapshot, Faults::default())
    }

    pub fn with_faults(snapshot: DictionarySnapshot, faults: Faults) -> Self {
        Self {
            inner: SnapshotSource::new(snapshot),
            faults,
            body_fetches: AtomicUsize::new(0),
            definition_fetches: AtomicUsize::new(0),
            column_delay: None,
            columns_in_flight: AtomicUsize::new(0),
            peak_columns_in_flight: AtomicUsize::new(0),
        }
    }

    /// Hold every column query open for `delay`
    pub fn with_column_delay(mut self, delay: Duration) -> Self {
        self.column_delay = Some(delay);
        self
    }

    pub fn body_fetches(&self) -> usize {
        self.body_fetches.load(Ordering::SeqCst)
    }

    pub fn definition_fetches(&self) -> usize {
        self.definition_fetches.load(Ordering::SeqCst)
    }

    /// Most column queries seen running at once
    pub fn peak_column_fetches(&self) -> usize {
        self.peak_columns_in_flight.load(Ordering::SeqCst)
    }
}

fn injected(context: &str) -> CatalogError {
    CatalogError::query(context, "injected failure")
}

#[async_trait]
impl DictionarySource for InstrumentedSource {
    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }

    async fn list_packages(&self, owner: &str) -> Result<Vec<String>> {
        self.inner.list_packages(owner).await
    }

    async fn list_package_routines(&self, owner: &str, package: &str) -> Result<Vec<RoutineRow>> {
        self.inner.list_package_routines(owner, package).await
    }

    async fn list_standalone_routines(&self, owner: &str) -> Result<Vec<RoutineRow>> {
        self.inner.list_standalone_routines(owner).await
    }

    async fn routine_arguments(
        &self,
        owner: &str,
        name: &str,
        package: Option<&str>,
        subprogram_id: Option<u32>,
    ) -> Result<Vec<ArgumentRow>> {
        self.inner.routine_arguments(owner, name, package, subprogram_id).await
    }

    async fn package_body_source(&self, owner: &str, package: &str) -> Result<Vec<String>> {
        self.body_fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.package_body_source(owner, package).await
    }

    async fn package_definitions(&self, owner: &str, package: &str) -> Result<Vec<DefinitionPoint>> {
        self.definition_fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.package_definitions(owner, package).await
    }

    async fn routine_source(&self, owner: &str, name: &str, kind: RoutineKind) -> Result<Vec<String>> {
        self.inner.routine_source(owner, name, kind).await
    }

    async fn routine_dependencies(&self, owner: &str, name: &str) -> Result<Vec<DependencyRow>> {
        if self.faults.dependencies.contains(name) {
            return Err(injected(name));
        }
        self.inner.routine_dependencies(owner, name).await
    }

    async fn list_tables(&self, owner: &str) -> Result<Vec<TableRow>> {
        self.inner.list_tables(owner).await
    }

    async fn table_columns(&self, owner: &str, table: &str) -> Result<Vec<ColumnRow>> {
        if self.faults.column_fetch.contains(table) {
            return Err(injected(table));
        }

        let running = self.columns_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_columns_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.column_delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.inner.table_columns(owner, table).await;
        self.columns_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn key_columns(&self, owner: &str, table: &str) -> Result<Vec<KeyColumnRow>> {
        self.inner.key_columns(owner, table).await
    }

    async fn table_constraints(&self, owner: &str, table: &str) -> Result<Vec<ConstraintRow>> {
        self.inner.table_constraints(owner, table).await
    }

    async fn table_indexes(&self, owner: &str, table: &str) -> Result<Vec<IndexRow>> {
        self.inner.table_indexes(owner, table).await
    }

    async fn count_distinct(&self, owner: &str, table: &str, column: &str) -> Result<u64> {
        let key = format!("{}.{}", table, column);
        if self.faults.distinct_count.contains(&key) {
            return Err(injected(&key));
        }
        self.inner.count_distinct(owner, table, column).await
    }

    async fn sample_distinct(
        &self,
        owner: &str,
        table: &str,
        column: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        self.inner.sample_distinct(owner, table, column, limit).await
    }
}

/// Snapshot with one table whose `CODE` column holds `distinct` distinct values
pub fn single_column_snapshot(table: &str, distinct: usize) -> DictionarySnapshot {
    let values: Vec<String> = (0..distinct).map(|i| format!("V{:05}", i)).collect();
    serde_json::from_value(json!({
        "schemas": {
            "APP": {
                "tables": [{
                    "name": table,
                    "columns": [
                        { "name": "CODE", "data_type": "VARCHAR2", "data_length": 10,
                          "nullable": true, "values": values }
                    ]
                }]
            }
        }
    }))
    .expect("fixture snapshot is valid")
}
