// src/core/dependency/mod.rs
//! Dependency reconciliation
//!
//! The dictionary's static dependency edges are authoritative on what a
//! routine depends on; scanning the routine text only refines how each of
//! those objects is used.

mod inference;

pub use inference::{DependencyInference, KeywordInference, CommentStripper};

use super::dictionary::DependencyRow;
use super::model::{Dependency, ReferencedKind, Usage};

/// Coarse usage implied by the kind of the referenced object alone
pub fn default_usage(kind: &ReferencedKind) -> Usage {
    match kind {
        ReferencedKind::Table => Usage::ReadWrite,
        ReferencedKind::View => Usage::Read,
        ReferencedKind::Procedure | ReferencedKind::Function => Usage::Call,
        _ => Usage::Reference,
    }
}

/// Turn dictionary rows into authoritative dependencies with default usages
pub fn authoritative_dependencies(rows: Vec<DependencyRow>) -> Vec<Dependency> {
    rows.into_iter()
        .map(|row| {
            let kind = ReferencedKind::from(row.referenced_type);
            let usage = default_usage(&kind);
            Dependency::new(row.referenced_name, kind, row.referenced_owner, usage)
        })
        .collect()
}

/// Merge inferred usages into the authoritative dependency list.
///
/// The result holds exactly the authoritative entries, first occurrence of
/// each `(name, kind)` kept, in listing order. An inferred entry
/// overwrites the usage of the matching authoritative entry; later inferred
/// entries win. Inferred entries with no authoritative match are dropped.
pub fn resolve(authoritative: Vec<Dependency>, inferred: &[Dependency]) -> Vec<Dependency> {
    let mut resolved: Vec<Dependency> = Vec::with_capacity(authoritative.len());
    for dep in authoritative {
        if !resolved.iter().any(|existing| existing.same_target(&dep)) {
            resolved.push(dep);
        }
    }

    for candidate in inferred {
        if let Some(target) = resolved.iter_mut().find(|dep| dep.same_target(candidate)) {
            target.usage = candidate.usage;
        }
    }

    resolved
}
