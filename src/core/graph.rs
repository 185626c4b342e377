// src/core/graph.rs
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use super::model::{Catalog, ReferencedKind, Usage};

/// Style bucket of a dependency target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeClass {
    Table,
    View,
    Function,
    Procedure,
    Unknown,
}

impl NodeClass {
    pub fn from_kind(kind: &ReferencedKind) -> Self {
        match kind.as_str().to_ascii_uppercase().as_str() {
            "TABLE" => NodeClass::Table,
            "VIEW" => NodeClass::View,
            "FUNCTION" => NodeClass::Function,
            "PROCEDURE" => NodeClass::Procedure,
            _ => NodeClass::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeClass::Table => "TABLE",
            NodeClass::View => "VIEW",
            NodeClass::Function => "FUNCTION",
            NodeClass::Procedure => "PROCEDURE",
            NodeClass::Unknown => "UNKNOWN",
        }
    }

    fn mermaid_style(&self) -> &'static str {
        match self {
            NodeClass::Table => "fill:#ffefef,stroke:#ffaaaa",
            NodeClass::View => "fill:#e0f7fa,stroke:#4dd0e1",
            NodeClass::Function => "fill:#e8f5e9,stroke:#81c784",
            NodeClass::Procedure => "fill:#fff3e0,stroke:#ffb74d",
            NodeClass::Unknown => "fill:#eeeeee,stroke:#aaaaaa",
        }
    }

    const ALL: [NodeClass; 5] = [
        NodeClass::Table,
        NodeClass::View,
        NodeClass::Function,
        NodeClass::Procedure,
        NodeClass::Unknown,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// `PACKAGE.ROUTINE`
    pub from: String,
    /// `SCHEMA.NAME` across schemas, `NAME` otherwise
    pub to: String,
    pub target_name: String,
    pub target_schema: String,
    pub usage: Usage,
    pub kind: ReferencedKind,
    pub cross_schema: bool,
}

impl GraphEdge {
    /// Usage, or the target kind when usage is unknown
    pub fn label(&self) -> String {
        match self.usage {
            Usage::Unknown => self.kind.to_string(),
            usage => usage.to_string(),
        }
    }

    pub fn target_class(&self) -> NodeClass {
        NodeClass::from_kind(&self.kind)
    }
}

/// Directed routine-to-object dependency graph of one catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub schema: String,
    pub edges: Vec<GraphEdge>,
}

impl DependencyGraph {
    pub fn build(catalog: &Catalog, schema: &str, cross_schema_only: bool) -> Self {
        let mut edges = Vec::new();

        for (package, routine) in catalog.routines() {
            let from = format!("{}.{}", package, routine.name);
            for dep in &routine.dependencies {
                let cross_schema = !dep.schema.eq_ignore_ascii_case(schema);
                if cross_schema_only && !cross_schema {
                    continue;
                }

                let to = if cross_schema {
                    format!("{}.{}", dep.schema, dep.name)
                } else {
                    dep.name.clone()
                };

                edges.push(GraphEdge {
                    from: from.clone(),
                    to,
                    target_name: dep.name.clone(),
                    target_schema: dep.schema.clone(),
                    usage: dep.usage,
                    kind: dep.kind.clone(),
                    cross_schema,
                });
            }
        }

        Self {
            schema: schema.to_string(),
            edges,
        }
    }

    /// Graphviz source
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph G {\n");
        dot.push_str("\trankdir=LR;\n");
        dot.push_str("\tnode [shape=box];\n");

        for edge in &self.edges {
            let _ = writeln!(
                dot,
                "\t\"{}\" -> \"{}\" [label=\"{}\"];",
                dot_escape(&edge.from),
                dot_escape(&edge.to),
                dot_escape(&edge.label())
            );
        }

        dot.push_str("}\n");
        dot
    }

    /// Mermaid flowchart with one class per target kind
    pub fn to_mermaid(&self) -> String {
        let mut mermaid = String::from("graph TD\n");

        for edge in &self.edges {
            let _ = writeln!(
                mermaid,
                "    {}[\"{}\"] -->|{}| {}[\"{}\"]:::{}",
                mermaid_id(&edge.from),
                mermaid_escape(&edge.from),
                mermaid_escape(&edge.label()),
                mermaid_id(&edge.to),
                mermaid_escape(&edge.to),
                edge.target_class().as_str()
            );
        }

        for class in NodeClass::ALL {
            let _ = writeln!(mermaid, "classDef {} {};", class.as_str(), class.mermaid_style());
        }

        mermaid
    }
}

fn dot_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn mermaid_escape(text: &str) -> String {
    text.replace('"', "#quot;").replace('|', "#124;")
}

/// Node id made of characters Mermaid accepts unquoted
fn mermaid_id(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Dependency, Package, Routine, RoutineKind};

    fn catalog() -> Catalog {
        let mut package = Package::new("ORDER_PKG");
        package.push(Routine {
            name: "PLACE_ORDER".into(),
            kind: RoutineKind::Procedure,
            body: String::new(),
            description: String::new(),
            parameters: vec![],
            dependencies: vec![
                Dependency::new("ORDERS", ReferencedKind::Table, "SALES", Usage::Write),
                Dependency::new("FX_RATE", ReferencedKind::Function, "FINANCE", Usage::Call),
                Dependency::new("ORDERS_V", ReferencedKind::View, "sales", Usage::Unknown),
            ],
        });
        Catalog { packages: vec![package] }
    }

    #[test]
    fn test_edges_mark_cross_schema_targets() {
        let graph = DependencyGraph::build(&catalog(), "SALES", false);
        assert_eq!(graph.edges.len(), 3);

        let targets: Vec<_> = graph.edges.iter().map(|e| (e.to.as_str(), e.cross_schema)).collect();
        assert_eq!(
            targets,
            vec![("ORDERS", false), ("FINANCE.FX_RATE", true), ("ORDERS_V", false)]
        );
        assert!(graph.edges.iter().all(|e| e.from == "ORDER_PKG.PLACE_ORDER"));
    }

    #[test]
    fn test_cross_schema_only_filter() {
        let graph = DependencyGraph::build(&catalog(), "sales", true);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].target_schema, "FINANCE");
        assert_eq!(graph.edges[0].target_class(), NodeClass::Function);
    }

    #[test]
    fn test_node_classes() {
        assert_eq!(NodeClass::from_kind(&ReferencedKind::Table), NodeClass::Table);
        assert_eq!(NodeClass::from_kind(&ReferencedKind::Procedure), NodeClass::Procedure);
        assert_eq!(NodeClass::from_kind(&ReferencedKind::TableOrView), NodeClass::Unknown);
        assert_eq!(NodeClass::from_kind(&ReferencedKind::Other("SEQUENCE".into())), NodeClass::Unknown);
    }

    #[test]
    fn test_label_falls_back_to_kind() {
        let graph = DependencyGraph::build(&catalog(), "SALES", false);
        assert_eq!(graph.edges[0].label(), "write");
        assert_eq!(graph.edges[2].label(), "VIEW");
    }

    #[test]
    fn test_dot_output() {
        let dot = DependencyGraph::build(&catalog(), "SALES", false).to_dot();
        assert!(dot.starts_with("digraph G {"));
        assert!(dot.contains("\"ORDER_PKG.PLACE_ORDER\" -> \"FINANCE.FX_RATE\" [label=\"call\"];"));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn test_mermaid_output() {
        let mermaid = DependencyGraph::build(&catalog(), "SALES", false).to_mermaid();
        assert!(mermaid.starts_with("graph TD\n"));
        assert!(mermaid.contains(
            "ORDER_PKG_PLACE_ORDER[\"ORDER_PKG.PLACE_ORDER\"] -->|write| ORDERS[\"ORDERS\"]:::TABLE"
        ));
        assert!(mermaid.contains("FINANCE_FX_RATE[\"FINANCE.FX_RATE\"]:::FUNCTION"));
        assert!(mermaid.contains("classDef UNKNOWN fill:#eeeeee,stroke:#aaaaaa;"));
    }
}
