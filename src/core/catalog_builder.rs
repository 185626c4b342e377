// src/core/catalog_builder.rs
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{CatalogError, Result};
use super::dependency::{self, CommentStripper, DependencyInference, KeywordInference};
use super::dictionary::{DictionarySource, RoutineRow};
use super::llm::{describe_routine, RoutineSummarizer};
use super::model::{
    Catalog, Package, Parameter, Routine, RoutineKind, RETURN_PARAMETER, STANDALONE_PACKAGE, UNKNOWN_TYPE,
};
use super::source_slicer::{join_overloads, SourceSlicer};

/// Extracts the routines of a schema into a [`Catalog`]
///
/// One builder covers one extraction run; its source cache and the
/// descriptions of overloaded routines live as long as the builder does.
pub struct CatalogBuilder {
    source: Arc<dyn DictionarySource>,
    slicer: SourceSlicer,
    inference: Box<dyn DependencyInference>,
    stripper: CommentStripper,
    summarizer: Option<Arc<dyn RoutineSummarizer>>,
    /// Keyed by (package, routine); overloads share one body and one description
    descriptions: HashMap<(String, String), String>,
}

impl CatalogBuilder {
    pub fn new(source: Arc<dyn DictionarySource>) -> Self {
        Self::with_inference(source, Box::new(KeywordInference::new()))
    }

    /// Builder using `inference` to refine dependency usage
    pub fn with_inference(source: Arc<dyn DictionarySource>, inference: Box<dyn DependencyInference>) -> Self {
        Self {
            source,
            slicer: SourceSlicer::new(),
            inference,
            stripper: CommentStripper::new(),
            summarizer: None,
            descriptions: HashMap::new(),
        }
    }

    pub fn with_summarizer(mut self, summarizer: Option<Arc<dyn RoutineSummarizer>>) -> Self {
        self.summarizer = summarizer;
        self
    }

    /// Every package of the schema followed by the standalone pseudo-package
    pub async fn extract(&mut self, schema: &str) -> Result<Catalog> {
        let owner = schema.to_ascii_uppercase();
        info!("📦 Starting extraction for schema: {}", owner);

        let mut catalog = Catalog::default();

        let packages = self.source.list_packages(&owner).await?;
        debug!("Found {} packages", packages.len());
        for package_name in &packages {
            let package = self.extract_package(&owner, package_name).await?;
            catalog.packages.push(package);
        }
        info!("Extracted {} packages", packages.len());

        let standalone = self.extract_standalone(&owner).await?;
        catalog.packages.push(standalone);

        info!("✅ Extraction completed: {} routines", catalog.routine_count());
        Ok(catalog)
    }

    pub async fn extract_package(&mut self, schema: &str, package_name: &str) -> Result<Package> {
        if package_name.eq_ignore_ascii_case(STANDALONE_PACKAGE) {
            return Err(CatalogError::ReservedName(package_name.to_string()));
        }

        let owner = schema.to_ascii_uppercase();
        debug!("Analyzing package: {}", package_name);

        let rows = self
            .source
            .list_package_routines(&owner, package_name)
            .await
            .map_err(|e| CatalogError::extraction(format!("package {}", package_name), e))?;

        let mut package = Package::new(package_name);
        for row in rows {
            let routine = self.extract_routine(&owner, Some(package_name), &row).await?;
            package.push(routine);
        }

        debug!(
            "Package {}: {} procedures, {} functions",
            package.name,
            package.procedures.len(),
            package.functions.len()
        );
        Ok(package)
    }

    /// Procedures, functions and triggers owned by no package
    pub async fn extract_standalone(&mut self, schema: &str) -> Result<Package> {
        let owner = schema.to_ascii_uppercase();
        debug!("Extracting standalone routines...");

        let rows = self
            .source
            .list_standalone_routines(&owner)
            .await
            .map_err(|e| CatalogError::extraction("standalone routines", e))?;

        let mut package = Package::new(STANDALONE_PACKAGE);
        for row in rows {
            let routine = self.extract_routine(&owner, None, &row).await?;
            package.push(routine);
        }

        info!("Standalone routines extraction completed: {}", package.procedures.len() + package.functions.len());
        Ok(package)
    }

    async fn extract_routine(&mut self, owner: &str, package: Option<&str>, row: &RoutineRow) -> Result<Routine> {
        let qualified = match package {
            Some(package) => format!("{}.{}", package, row.name),
            None => row.name.clone(),
        };
        debug!("Analyzing {} {}", row.kind, qualified);

        self.load_routine(owner, package, row)
            .await
            .map_err(|e| CatalogError::extraction(format!("{} {}", row.kind, qualified), e))
    }

    async fn load_routine(&mut self, owner: &str, package: Option<&str>, row: &RoutineRow) -> Result<Routine> {
        let parameters = match row.kind {
            RoutineKind::Trigger => Vec::new(),
            _ => self.load_parameters(owner, package, row).await?,
        };

        // Overload blocks are cleaned one by one so the separator survives
        let body = match (package, row.kind) {
            (Some(package), RoutineKind::Procedure | RoutineKind::Function) => {
                let blocks = self.slicer.routine_blocks(self.source.as_ref(), owner, package, &row.name).await?;
                let cleaned: Vec<String> = blocks.iter().map(|block| self.clean(block)).collect();
                join_overloads(&cleaned)
            }
            _ => {
                let lines = self.source.routine_source(owner, &row.name, row.kind).await?;
                self.clean(&lines.join("\n"))
            }
        };

        let rows = self.source.routine_dependencies(owner, &row.name).await?;
        let authoritative = dependency::authoritative_dependencies(rows);
        let inferred = self.inference.infer(owner, &body);
        let dependencies = dependency::resolve(authoritative, &inferred);

        let description = self.describe(package, &row.name, &body).await;

        Ok(Routine {
            name: row.name.clone(),
            kind: row.kind,
            body,
            description,
            parameters,
            dependencies,
        })
    }

    fn clean(&self, text: &str) -> String {
        if text.trim().is_empty() {
            text.to_string()
        } else {
            self.stripper.strip(text)
        }
    }

    async fn describe(&mut self, package: Option<&str>, name: &str, body: &str) -> String {
        let key = (package.unwrap_or(STANDALONE_PACKAGE).to_string(), name.to_string());
        if let Some(description) = self.descriptions.get(&key) {
            return description.clone();
        }

        let description = describe_routine(self.summarizer.as_deref(), body, name).await;
        self.descriptions.insert(key, description.clone());
        description
    }

    async fn load_parameters(&self, owner: &str, package: Option<&str>, row: &RoutineRow) -> Result<Vec<Parameter>> {
        let arguments = self
            .source
            .routine_arguments(owner, &row.name, package, row.subprogram_id)
            .await?;

        Ok(arguments
            .into_iter()
            .map(|arg| Parameter {
                name: arg.name.unwrap_or_else(|| RETURN_PARAMETER.to_string()),
                type_name: arg.data_type.unwrap_or_else(|| UNKNOWN_TYPE.to_string()),
            })
            .collect())
    }
}
