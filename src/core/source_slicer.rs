// src/core/source_slicer.rs
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use super::dictionary::{DefinitionPoint, DictionarySource};

/// Separator placed between the bodies of overloaded routines
pub const OVERLOAD_SEPARATOR: &str = "\n\n-- overload --\n\n";

/// Source lines and definition points of one package body
#[derive(Debug, Clone, Default)]
pub struct CompoundUnit {
    pub lines: Vec<String>,
    /// Sorted by line
    pub definitions: Vec<DefinitionPoint>,
}

impl CompoundUnit {
    pub fn new(lines: Vec<String>, mut definitions: Vec<DefinitionPoint>) -> Self {
        definitions.sort_by_key(|d| d.line);
        Self { lines, definitions }
    }

    /// Text of every definition of `target`, one block per overload
    pub fn routine_blocks(&self, target: &str) -> Vec<String> {
        slice_definitions(&self.lines, &self.definitions, target)
    }
}

/// Carve the text of every definition of `target` out of a compound unit.
///
/// Each block runs from the definition's start line up to the line before the
/// next definition point of any name, or to the end of the source.
pub fn slice_definitions(lines: &[String], definitions: &[DefinitionPoint], target: &str) -> Vec<String> {
    let mut ordered: Vec<&DefinitionPoint> = definitions.iter().collect();
    ordered.sort_by_key(|d| d.line);

    ordered
        .iter()
        .filter(|d| d.name.eq_ignore_ascii_case(target))
        .filter_map(|def| {
            let start = def.line.max(1);
            if start > lines.len() {
                return None;
            }

            let end = ordered
                .iter()
                .find(|next| next.line > def.line)
                .map(|next| next.line - 1)
                .unwrap_or(lines.len())
                .min(lines.len());

            let block = lines[start - 1..end]
                .iter()
                .map(|line| line.trim_end_matches(['\r', '\n']))
                .collect::<Vec<_>>()
                .join("\n");
            Some(block)
        })
        .collect()
}

pub fn join_overloads(blocks: &[String]) -> String {
    blocks.join(OVERLOAD_SEPARATOR)
}

/// Slices packaged routine bodies, fetching each package body at most once
pub struct SourceSlicer {
    cache: HashMap<(String, String), Arc<CompoundUnit>>,
}

impl SourceSlicer {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Source and definition points of a package, read through the cache
    pub async fn unit(
        &mut self,
        source: &dyn DictionarySource,
        owner: &str,
        package: &str,
    ) -> Result<Arc<CompoundUnit>> {
        let key = (owner.to_ascii_uppercase(), package.to_ascii_uppercase());
        if let Some(unit) = self.cache.get(&key) {
            return Ok(Arc::clone(unit));
        }

        debug!("Loading package body source for {}.{}", owner, package);
        let lines = source.package_body_source(owner, package).await?;
        let definitions = source.package_definitions(owner, package).await?;
        debug!("{}.{}: {} lines, {} definitions", owner, package, lines.len(), definitions.len());

        let unit = Arc::new(CompoundUnit::new(lines, definitions));
        self.cache.insert(key, Arc::clone(&unit));
        Ok(unit)
    }

    /// Overload blocks of a packaged routine; empty when the package does not define it.
    /// Callers clean each block before joining them with [`join_overloads`].
    pub async fn routine_blocks(
        &mut self,
        source: &dyn DictionarySource,
        owner: &str,
        package: &str,
        routine: &str,
    ) -> Result<Vec<String>> {
        let unit = self.unit(source, owner, package).await?;
        let blocks = unit.routine_blocks(routine);
        if blocks.is_empty() {
            debug!("No definition of {} found in {}.{}", routine, owner, package);
        }
        Ok(blocks)
    }

    #[cfg(test)]
    pub fn cached_units(&self) -> usize {
        self.cache.len()
    }
}

impl Default for SourceSlicer {
    fn default() -> Self {
        Self::new()
    }
}
