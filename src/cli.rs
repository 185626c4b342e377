use clap::{Parser, Subcommand};
use std::path::PathBuf;
use anyhow::Result;

use crate::config::Config;
use crate::core::Engine;

#[derive(Parser)]
#[command(name = "oradoc")]
#[command(about = "Catalog, document and graph the stored routines and tables of an Oracle schema")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Schema (owner) to analyse
    #[arg(short, long, global = true)]
    pub schema: Option<String>,

    /// Dictionary snapshot (JSON) to read instead of a live database
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Output directory for generated files
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Catalog every package and standalone routine of the schema
    Full {
        /// Describe each routine with the configured summarizer
        #[arg(long)]
        summarize: bool,
    },

    /// Catalog a single package
    Package {
        /// Package name
        #[arg(short, long)]
        package: String,

        /// Describe each routine with the configured summarizer
        #[arg(long)]
        summarize: bool,
    },

    /// Describe tables, columns, keys, constraints and indexes
    Tables {
        /// Only tables whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Tables analysed in parallel
        #[arg(long)]
        max_concurrency: Option<usize>,
    },

    /// Re-render dependency graphs from an exported catalog
    Graph {
        /// Catalog JSON written by `full` or `package`
        #[arg(long)]
        catalog: PathBuf,

        /// Keep only edges that leave the schema
        #[arg(long)]
        cross_schema_only: bool,
    },

    /// List the packages of the schema
    Packages,
}

impl Cli {
    /// Configuration file values with command line overrides applied
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load_or_default(self.config.as_deref())?;

        if let Some(schema) = &self.schema {
            config.connection.schema = schema.clone();
        }
        if let Some(snapshot) = &self.snapshot {
            config.source.snapshot = Some(snapshot.clone());
        }
        if let Some(output) = &self.output {
            config.output.docs_dir = output.clone();
        }
        if let Commands::Tables { max_concurrency: Some(n), .. } = &self.command {
            config.analysis.max_concurrency = *n;
        }

        Ok(config)
    }

    pub async fn execute(self, engine: Engine) -> Result<()> {
        match self.command {
            Commands::Full { summarize } => {
                engine.analyse_schema(summarize).await
            }
            Commands::Package { package, summarize } => {
                engine.analyse_package(&package, summarize).await
            }
            Commands::Tables { filter, max_concurrency } => {
                engine.analyse_tables(filter.as_deref(), max_concurrency).await
            }
            Commands::Graph { catalog, cross_schema_only } => {
                engine.render_graph(&catalog, cross_schema_only).await
            }
            Commands::Packages => {
                for package in engine.list_packages().await? {
                    println!("{}", package);
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "oradoc",
            "--schema", "hr",
            "--snapshot", "hr.json",
            "--config", "/definitely/not/here.toml",
            "tables",
            "--filter", "emp",
            "--max-concurrency", "8",
        ]);

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.connection.owner(), "HR");
        assert_eq!(config.source.snapshot, Some(PathBuf::from("hr.json")));
        assert_eq!(config.analysis.max_concurrency, 8);
        assert!(matches!(cli.command, Commands::Tables { filter: Some(ref f), .. } if f == "emp"));
    }

    #[test]
    fn test_package_requires_name() {
        assert!(Cli::try_parse_from(["oradoc", "package"]).is_err());
        let cli = Cli::try_parse_from(["oradoc", "package", "--package", "ORDER_PKG", "--summarize"]).unwrap();
        assert!(matches!(cli.command, Commands::Package { summarize: true, .. }));
    }
}
