// src/core/engine.rs
use std::path::Path;
use std::sync::Arc;
use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::CatalogError;
use super::catalog_builder::CatalogBuilder;
use super::dictionary::{DictionarySource, SnapshotSource};
use super::graph::DependencyGraph;
use super::llm::{create_summarizer, RoutineSummarizer};
use super::model::Catalog;
use super::render::{MarkdownRenderer, OutputWriter};
use super::table_analyzer::TableAnalyzer;

/// Main orchestration engine: opens the dictionary, runs an analysis and writes its artifacts
pub struct Engine {
    config: Config,
    writer: OutputWriter,
    renderer: MarkdownRenderer,
}

impl Engine {
    /// Create an engine from a fully resolved configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        debug!("Loaded configuration for schema {}", config.connection.owner());

        let writer = OutputWriter::new(&config.output.docs_dir);
        let renderer = MarkdownRenderer::new(config.output.include_metadata)?;

        Ok(Self { config, writer, renderer })
    }

    fn schema(&self) -> String {
        self.config.connection.owner()
    }

    /// Open the configured dictionary and check that it answers
    async fn open_source(&self) -> Result<Arc<dyn DictionarySource>> {
        let Some(snapshot) = self.config.source.snapshot.as_ref() else {
            debug!("Connect descriptor: {}", self.config.connection.connect_descriptor());
            return Err(CatalogError::Connectivity(
                "No dictionary source configured (set source.snapshot or pass --snapshot)".to_string(),
            )
            .into());
        };

        info!("🔌 Opening dictionary snapshot: {}", snapshot.display());
        let source = SnapshotSource::load(snapshot).await?;
        source.ping().await?;
        Ok(Arc::new(source))
    }

    fn summarizer(&self, summarize: bool) -> Option<Arc<dyn RoutineSummarizer>> {
        if !summarize && !self.config.llm.enabled {
            debug!("Summarization disabled");
            return None;
        }

        let mut llm = self.config.llm.clone();
        llm.enabled = true;
        match create_summarizer(&llm) {
            Ok(summarizer) => {
                info!("✅ Summarizer enabled: {}", summarizer.provider_name());
                Some(Arc::from(summarizer))
            }
            Err(e) => {
                warn!("⚠️ Failed to initialize summarizer: {}", e);
                warn!("Continuing without routine descriptions");
                None
            }
        }
    }

    /// Catalog every routine of the schema, then write JSON, Markdown and graphs
    pub async fn analyse_schema(&self, summarize: bool) -> Result<()> {
        let schema = self.schema();
        let source = self.open_source().await?;

        let mut builder = CatalogBuilder::new(source).with_summarizer(self.summarizer(summarize));
        let catalog = builder.extract(&schema).await?;

        let path = self.writer.write_json("db_catalog.json", &catalog)?;
        info!("💾 Catalog written to {}", path.display());

        let pages = self.writer.write_package_pages(&self.renderer, &catalog, &schema)?;
        info!("📝 Wrote {} package pages", pages.len());

        self.write_graphs(&catalog, "dependency_graph", self.config.analysis.cross_schema_only)?;

        info!("✅ Schema documentation completed in {}", self.writer.root().display());
        Ok(())
    }

    /// Catalog one package and write its own JSON, Markdown and graphs
    pub async fn analyse_package(&self, package: &str, summarize: bool) -> Result<()> {
        let schema = self.schema();
        let package = package.trim().to_ascii_uppercase();
        let source = self.open_source().await?;

        let known = source.list_packages(&schema).await?;
        if !known.iter().any(|name| name.eq_ignore_ascii_case(&package)) {
            warn!("⚠️ Package {} not found in schema {}", package, schema);
        }

        let mut builder = CatalogBuilder::new(source).with_summarizer(self.summarizer(summarize));
        let extracted = builder.extract_package(&schema, &package).await?;
        let catalog = Catalog { packages: vec![extracted] };

        let path = self.writer.write_json(&format!("catalog_{}.json", package), &catalog)?;
        info!("💾 Catalog written to {}", path.display());

        self.writer.write_package_pages(&self.renderer, &catalog, &schema)?;
        self.write_graphs(&catalog, &format!("graph_{}", package), self.config.analysis.cross_schema_only)?;

        info!("✅ Package {} documented", package);
        Ok(())
    }

    /// Describe the schema's tables and write `table_catalog.json` plus one page per table
    pub async fn analyse_tables(&self, filter: Option<&str>, max_concurrency: Option<usize>) -> Result<()> {
        let schema = self.schema();
        let source = self.open_source().await?;

        let concurrency = max_concurrency.unwrap_or(self.config.analysis.max_concurrency);
        let report = TableAnalyzer::new(source)
            .analyze_tables(&schema, concurrency, filter)
            .await?;

        let path = self.writer.write_json("table_catalog.json", &report.tables)?;
        info!("💾 Table catalog written to {}", path.display());

        let pages = self.writer.write_table_pages(&self.renderer, &report.tables)?;
        info!("📝 Wrote {} table pages", pages.len());

        if !report.failures.is_empty() {
            warn!("⚠️ {} tables could not be analyzed:", report.failures.len());
            for failure in &report.failures {
                warn!("  - {}: {}", failure.table, failure.error);
            }
        }

        Ok(())
    }

    /// Re-render the dependency graphs of a previously exported catalog
    pub async fn render_graph(&self, catalog_path: &Path, cross_schema_only: bool) -> Result<()> {
        info!("🕸️ Rendering dependency graph from {}", catalog_path.display());

        let content = tokio::fs::read_to_string(catalog_path)
            .await
            .map_err(CatalogError::from)?;
        let catalog: Catalog = serde_json::from_str(&content).map_err(CatalogError::from)?;

        self.write_graphs(&catalog, "dependency_graph", cross_schema_only || self.config.analysis.cross_schema_only)?;
        Ok(())
    }

    /// Package names of the schema, sorted
    pub async fn list_packages(&self) -> Result<Vec<String>> {
        let source = self.open_source().await?;
        let mut packages = source.list_packages(&self.schema()).await?;
        packages.sort();
        Ok(packages)
    }

    fn write_graphs(&self, catalog: &Catalog, stem: &str, cross_schema_only: bool) -> Result<()> {
        let graph = DependencyGraph::build(catalog, &self.schema(), cross_schema_only);
        debug!("Dependency graph: {} edges", graph.edges.len());

        let dot = self.writer.write_text(&format!("{}.dot", stem), &graph.to_dot())?;
        let mermaid = self.writer.write_text(&format!("{}.mmd", stem), &graph.to_mermaid())?;
        info!("🕸️ Graphs written to {} and {}", dot.display(), mermaid.display());
        Ok(())
    }
}
