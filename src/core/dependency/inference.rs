// src/core/dependency/inference.rs
use regex::Regex;

use super::super::model::{Dependency, ReferencedKind, Usage};

/// Object name reported when a statement line names no recognisable target
pub const UNKNOWN_OBJECT: &str = "UNKNOWN";

/// Strategy turning routine text into candidate dependencies
pub trait DependencyInference: Send + Sync {
    /// Candidates in the order they appear in `body`, tagged with `schema`
    fn infer(&self, schema: &str, body: &str) -> Vec<Dependency>;
}

/// Line-by-line keyword scan.
///
/// A line can yield several candidates (a read, a write and a call); all of
/// them share the first object name the line mentions after `FROM`, `INTO`
/// or `UPDATE`. Statements split across lines and dynamic SQL are missed.
pub struct KeywordInference {
    read_regex: Regex,
    write_regex: Regex,
    call_regex: Regex,
    object_regex: Regex,
}

impl KeywordInference {
    pub fn new() -> Self {
        Self {
            read_regex: Regex::new(r"(?i)\bSELECT\b")
                .expect("Invalid read regex"),
            write_regex: Regex::new(r"(?i)\bINSERT\b|\bUPDATE\b|\bDELETE\b")
                .expect("Invalid write regex"),
            call_regex: Regex::new(r"(?i)\bEXECUTE\b|\bCALL\b| := ")
                .expect("Invalid call regex"),
            object_regex: Regex::new(r"(?i)\bFROM\b\s+(\w+)|\bINTO\b\s+(\w+)|\bUPDATE\b\s+(\w+)|\bINTO\b\s+(\w+)")
                .expect("Invalid object name regex"),
        }
    }

    /// First filled capture of the leftmost keyword match
    fn object_name(&self, line: &str) -> String {
        self.object_regex
            .captures(line)
            .and_then(|caps| caps.iter().skip(1).flatten().next())
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| UNKNOWN_OBJECT.to_string())
    }
}

impl DependencyInference for KeywordInference {
    fn infer(&self, schema: &str, body: &str) -> Vec<Dependency> {
        let schema = schema.to_ascii_uppercase();
        let mut candidates = Vec::new();

        for line in body.split('\n') {
            let checks = [
                (&self.read_regex, ReferencedKind::TableOrView, Usage::Read),
                (&self.write_regex, ReferencedKind::Table, Usage::Write),
                (&self.call_regex, ReferencedKind::ProcedureOrFunction, Usage::Call),
            ];

            for (regex, kind, usage) in checks {
                if regex.is_match(line) {
                    candidates.push(Dependency::new(self.object_name(line), kind, schema.clone(), usage));
                }
            }
        }

        candidates
    }
}

impl Default for KeywordInference {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes `/* ... */` blocks and `--` line comments from routine source
pub struct CommentStripper {
    comment_regex: Regex,
}

impl CommentStripper {
    pub fn new() -> Self {
        Self {
            comment_regex: Regex::new(r"(?ms)/\*.*?\*/|--.*?$")
                .expect("Invalid comment regex"),
        }
    }

    pub fn strip(&self, body: &str) -> String {
        self.comment_regex.replace_all(body, "").into_owned()
    }
}

impl Default for CommentStripper {
    fn default() -> Self {
        Self::new()
    }
}
