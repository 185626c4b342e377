use thiserror::Error;

/// Main error type for catalog extraction and rendering
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Query failed ({context}): {message}")]
    Query { context: String, message: String },

    #[error("Failed to extract {object}: {source}")]
    Extraction {
        object: String,
        #[source]
        source: Box<CatalogError>,
    },

    #[error("Package name {0} is reserved for standalone routines")]
    ReservedName(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Summarizer error: {0}")]
    Summarizer(String),
}

impl CatalogError {
    pub fn query(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Wrap a failure so it names the routine being extracted
    pub fn extraction(object: impl Into<String>, source: CatalogError) -> Self {
        Self::Extraction {
            object: object.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
