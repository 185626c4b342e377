// src/core/model.rs
//! In-memory catalog model produced by extraction and consumed by the writers.

use std::fmt;
use serde::{Deserialize, Serialize};

/// Pseudo-package holding routines that are not owned by any package
pub const STANDALONE_PACKAGE: &str = "[Standalone]";

/// Parameter name used for the return slot of a function
pub const RETURN_PARAMETER: &str = "RETURN";

/// Type name used when the dictionary reports no data type for an argument
pub const UNKNOWN_TYPE: &str = "UNKNOWN";

/// Root of the routine catalog for one schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub packages: Vec<Package>,
}

impl Catalog {
    /// Iterate over every routine together with its owning package name
    pub fn routines(&self) -> impl Iterator<Item = (&str, &Routine)> {
        self.packages.iter().flat_map(|pkg| {
            pkg.routines().map(move |routine| (pkg.name.as_str(), routine))
        })
    }

    pub fn routine_count(&self) -> usize {
        self.packages.iter().map(|p| p.procedures.len() + p.functions.len()).sum()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub procedures: Vec<Routine>,
    pub functions: Vec<Routine>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            procedures: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn is_standalone(&self) -> bool {
        self.name == STANDALONE_PACKAGE
    }

    /// Procedures first, then functions, each in discovery order
    pub fn routines(&self) -> impl Iterator<Item = &Routine> {
        self.procedures.iter().chain(self.functions.iter())
    }

    /// File a routine into the list matching its kind
    pub fn push(&mut self, routine: Routine) {
        match routine.kind {
            RoutineKind::Procedure => self.procedures.push(routine),
            RoutineKind::Function | RoutineKind::Trigger => self.functions.push(routine),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutineKind {
    Procedure,
    Function,
    Trigger,
}

impl RoutineKind {
    /// Dictionary object type (`ALL_SOURCE.TYPE`, `ALL_OBJECTS.OBJECT_TYPE`)
    pub fn object_type(&self) -> &'static str {
        match self {
            RoutineKind::Procedure => "PROCEDURE",
            RoutineKind::Function => "FUNCTION",
            RoutineKind::Trigger => "TRIGGER",
        }
    }

    pub fn from_object_type(object_type: &str) -> Option<Self> {
        match object_type.trim().to_ascii_uppercase().as_str() {
            "PROCEDURE" => Some(RoutineKind::Procedure),
            "FUNCTION" => Some(RoutineKind::Function),
            "TRIGGER" => Some(RoutineKind::Trigger),
            _ => None,
        }
    }

    /// A packaged subprogram is a function when its leading argument row has
    /// no name, i.e. it is the return slot.
    pub fn from_leading_argument(argument_name: Option<Option<&str>>) -> Self {
        match argument_name {
            Some(None) => RoutineKind::Function,
            _ => RoutineKind::Procedure,
        }
    }
}

impl fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.object_type().to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routine {
    pub name: String,
    pub kind: RoutineKind,
    /// Source text with comments stripped
    pub body: String,
    /// Filled by the optional summarizer, empty otherwise
    pub description: String,
    pub parameters: Vec<Parameter>,
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub kind: ReferencedKind,
    pub schema: String,
    pub usage: Usage,
}

impl Dependency {
    pub fn new(
        name: impl Into<String>,
        kind: ReferencedKind,
        schema: impl Into<String>,
        usage: Usage,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            schema: schema.into(),
            usage,
        }
    }

    /// Two entries describe the same logical dependency when name and kind agree
    pub fn same_target(&self, other: &Dependency) -> bool {
        self.kind == other.kind && self.name.eq_ignore_ascii_case(&other.name)
    }
}

/// Kind of object a dependency points at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReferencedKind {
    Table,
    View,
    Procedure,
    Function,
    /// Inferred from a read, where table and view cannot be told apart
    TableOrView,
    /// Inferred from a call or assignment
    ProcedureOrFunction,
    Other(String),
}

impl ReferencedKind {
    pub fn as_str(&self) -> &str {
        match self {
            ReferencedKind::Table => "TABLE",
            ReferencedKind::View => "VIEW",
            ReferencedKind::Procedure => "PROCEDURE",
            ReferencedKind::Function => "FUNCTION",
            ReferencedKind::TableOrView => "TABLE/VIEW",
            ReferencedKind::ProcedureOrFunction => "PROCEDURE/FUNCTION",
            ReferencedKind::Other(kind) => kind,
        }
    }
}

impl From<String> for ReferencedKind {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "TABLE" => ReferencedKind::Table,
            "VIEW" => ReferencedKind::View,
            "PROCEDURE" => ReferencedKind::Procedure,
            "FUNCTION" => ReferencedKind::Function,
            "TABLE/VIEW" => ReferencedKind::TableOrView,
            "PROCEDURE/FUNCTION" => ReferencedKind::ProcedureOrFunction,
            _ => ReferencedKind::Other(value),
        }
    }
}

impl From<&str> for ReferencedKind {
    fn from(value: &str) -> Self {
        ReferencedKind::from(value.to_string())
    }
}

impl From<ReferencedKind> for String {
    fn from(kind: ReferencedKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ReferencedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a routine uses the object it depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Usage {
    #[serde(rename = "read")]
    Read,
    #[serde(rename = "write")]
    Write,
    #[serde(rename = "read/write")]
    ReadWrite,
    #[serde(rename = "call")]
    Call,
    #[serde(rename = "reference")]
    Reference,
    #[serde(rename = "unknown", other)]
    Unknown,
}

impl Usage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Usage::Read => "read",
            Usage::Write => "write",
            Usage::ReadWrite => "read/write",
            Usage::Call => "call",
            Usage::Reference => "reference",
            Usage::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub schema: String,
    pub comment: Option<String>,
    pub columns: Vec<Column>,
    pub constraints: Vec<Constraint>,
    pub indexes: Vec<Index>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub data_length: Option<u32>,
    pub data_precision: Option<u32>,
    pub data_scale: Option<i32>,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
    pub foreign_key_reference: Option<String>,
    pub comment: Option<String>,

    /// Number of distinct non-null values, when sampling succeeded
    pub distinct_count: Option<u64>,
    /// Up to [`crate::core::SAMPLE_LIMIT`] values, only for low-cardinality columns
    pub sample_values: Option<Vec<String>>,
    /// False when sampling failed, so "no values" and "not sampled" stay distinct
    pub sampled: bool,
}

impl Column {
    /// Type with its length or precision, e.g. `VARCHAR2(30)` or `NUMBER(8,2)`
    pub fn display_type(&self) -> String {
        let data_type = self.data_type.to_ascii_uppercase();
        match data_type.as_str() {
            "VARCHAR2" | "CHAR" | "NVARCHAR2" | "NCHAR" | "RAW" => match self.data_length {
                Some(length) => format!("{}({})", data_type, length),
                None => data_type,
            },
            "NUMBER" | "DECIMAL" => match (self.data_precision, self.data_scale) {
                (Some(precision), Some(scale)) if scale != 0 => {
                    format!("{}({},{})", data_type, precision, scale)
                }
                (Some(precision), _) => format!("{}({})", data_type, precision),
                _ => data_type,
            },
            _ => data_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    #[serde(rename = "PRIMARY KEY")]
    PrimaryKey,
    #[serde(rename = "UNIQUE")]
    Unique,
    #[serde(rename = "FOREIGN KEY")]
    ForeignKey,
    #[serde(rename = "OTHER")]
    Other,
}

impl ConstraintKind {
    /// Decode `ALL_CONSTRAINTS.CONSTRAINT_TYPE`
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "P" => ConstraintKind::PrimaryKey,
            "U" => ConstraintKind::Unique,
            "R" => ConstraintKind::ForeignKey,
            _ => ConstraintKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    pub columns: Vec<String>,
    pub reference_table: Option<String>,
    pub reference_columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routine(name: &str, kind: RoutineKind) -> Routine {
        Routine {
            name: name.to_string(),
            kind,
            body: String::new(),
            description: String::new(),
            parameters: vec![],
            dependencies: vec![],
        }
    }

    #[test]
    fn test_package_push_files_by_kind() {
        let mut package = Package::new(STANDALONE_PACKAGE);
        package.push(routine("P", RoutineKind::Procedure));
        package.push(routine("F", RoutineKind::Function));
        package.push(routine("T", RoutineKind::Trigger));

        assert!(package.is_standalone());
        assert_eq!(package.procedures.len(), 1);
        assert_eq!(package.functions.len(), 2);
        let names: Vec<_> = package.routines().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["P", "F", "T"]);
    }

    #[test]
    fn test_referenced_kind_serializes_as_dictionary_string() {
        let dep = Dependency::new("ORDERS", ReferencedKind::TableOrView, "SALES", Usage::ReadWrite);
        let json = serde_json::to_value(&dep).unwrap();
        assert_eq!(json["kind"], "TABLE/VIEW");
        assert_eq!(json["usage"], "read/write");

        let back: Dependency = serde_json::from_value(json).unwrap();
        assert_eq!(back, dep);

        let odd: ReferencedKind = serde_json::from_str("\"SYNONYM\"").unwrap();
        assert_eq!(odd, ReferencedKind::Other("SYNONYM".to_string()));
    }

    #[test]
    fn test_same_target_ignores_name_case_only() {
        let a = Dependency::new("orders", ReferencedKind::Table, "S", Usage::Write);
        let b = Dependency::new("ORDERS", ReferencedKind::Table, "S", Usage::ReadWrite);
        let c = Dependency::new("ORDERS", ReferencedKind::View, "S", Usage::Read);
        assert!(a.same_target(&b));
        assert!(!b.same_target(&c));
    }

    #[test]
    fn test_leading_argument_decides_function() {
        assert_eq!(RoutineKind::from_leading_argument(Some(None)), RoutineKind::Function);
        assert_eq!(RoutineKind::from_leading_argument(Some(Some("P_ID"))), RoutineKind::Procedure);
        assert_eq!(RoutineKind::from_leading_argument(None), RoutineKind::Procedure);
    }

    #[test]
    fn test_display_type() {
        let mut col = Column {
            data_type: "varchar2".to_string(),
            data_length: Some(30),
            ..Default::default()
        };
        assert_eq!(col.display_type(), "VARCHAR2(30)");

        col.data_type = "NUMBER".to_string();
        col.data_precision = Some(8);
        col.data_scale = Some(2);
        assert_eq!(col.display_type(), "NUMBER(8,2)");

        col.data_scale = Some(0);
        assert_eq!(col.display_type(), "NUMBER(8)");

        col.data_type = "DATE".to_string();
        assert_eq!(col.display_type(), "DATE");
    }
}
