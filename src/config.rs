use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Whether to summarize routines
    pub enabled: bool,

    /// Summarizer provider (openai)
    pub provider: String,

    /// Model name (e.g., "gpt-4")
    pub model: String,

    /// API key; falls back to OPENAI_API_KEY
    pub api_key: Option<String>,

    /// Base URL for OpenAI-compatible endpoints
    pub base_url: Option<String>,

    /// Maximum tokens per summary
    pub max_tokens: Option<u32>,

    /// Temperature (0.0 to 1.0)
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database connection settings
    pub connection: ConnectionConfig,

    /// Where dictionary rows are read from
    pub source: SourceConfig,

    /// Analysis tuning
    pub analysis: AnalysisConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Summarizer settings
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub service: String,
    pub username: String,
    pub password: Option<String>,

    /// Schema (owner) to analyse
    pub schema: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Exported dictionary snapshot (JSON)
    pub snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Tables analysed in parallel
    pub max_concurrency: usize,

    /// Keep only dependency edges that leave the analysed schema
    pub cross_schema_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Documentation output directory
    pub docs_dir: PathBuf,

    /// Include front matter headers in Markdown
    pub include_metadata: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: "openai".to_string(),
            model: "gpt-4".to_string(),
            api_key: None,
            base_url: None,
            max_tokens: Some(1000),
            temperature: Some(0.3),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1521,
            service: String::new(),
            username: String::new(),
            password: None,
            schema: String::new(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            cross_schema_only: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("docs"),
            include_metadata: true,
        }
    }
}

impl ConnectionConfig {
    /// Connect descriptor for an Oracle driver; carries no credentials
    pub fn connect_descriptor(&self) -> String {
        format!(
            "(DESCRIPTION=(ADDRESS=(PROTOCOL=TCP)(HOST={})(PORT={}))(CONNECT_DATA=(SERVICE_NAME={})))",
            self.host, self.port, self.service
        )
    }

    /// Owner name as stored in the dictionary
    pub fn owner(&self) -> String {
        self.schema.trim().to_ascii_uppercase()
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| CatalogError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                // Try common config file locations
                let candidates = [
                    "Oradoc.toml",
                    "oradoc.toml",
                    ".oradoc.toml",
                ];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    /// Check the settings a schema run cannot do without
    pub fn validate(&self) -> Result<()> {
        if self.connection.owner().is_empty() {
            return Err(CatalogError::Config("No schema given (use --schema or connection.schema)".to_string()));
        }
        if self.analysis.max_concurrency == 0 {
            return Err(CatalogError::Config("analysis.max_concurrency must be at least 1".to_string()));
        }
        Ok(())
    }
}
