// src/core/render/writer.rs
use std::fs;
use std::path::{Path, PathBuf};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use super::super::model::{Catalog, Table};
use super::markdown::MarkdownRenderer;

/// Writes generated artifacts below one output directory
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write_text(&self, file_name: &str, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(file_name);
        fs::write(&path, content)?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Pretty-printed JSON
    pub fn write_json<T: Serialize + ?Sized>(&self, file_name: &str, value: &T) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(value)?;
        self.write_text(file_name, &json)
    }

    /// One Markdown page per package, the standalone pseudo-package included
    pub fn write_package_pages(
        &self,
        renderer: &MarkdownRenderer,
        catalog: &Catalog,
        schema: &str,
    ) -> Result<Vec<PathBuf>> {
        catalog
            .packages
            .iter()
            .map(|package| {
                let page = renderer.render_package(package, schema)?;
                self.write_text(&format!("{}.md", file_stem(&package.name)), &page)
            })
            .collect()
    }

    pub fn write_table_pages(&self, renderer: &MarkdownRenderer, tables: &[Table]) -> Result<Vec<PathBuf>> {
        tables
            .iter()
            .map(|table| {
                let page = renderer.render_table(table)?;
                self.write_text(&format!("{}.md", file_stem(&table.name)), &page)
            })
            .collect()
    }
}

/// File name stem for an object name; keeps letters, digits, `_`, `$`, `#`, `-` and `.`
pub fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '$' | '#' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    stem.trim_matches('_').to_string()
}
