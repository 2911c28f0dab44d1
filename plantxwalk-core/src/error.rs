//! Error types for registry loading and match queries

use thiserror::Error;

/// Errors that abort a whole load run
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read registry file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no registry file found in {0}")]
    NoRegistryFile(String),

    #[error("registry is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors while writing or reading crosswalk output files
#[derive(Debug, Error)]
pub enum CrosswalkError {
    #[error("failed to access crosswalk file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error for {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("manifest serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors scoped to a single query; never abort a batch
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("query supplies neither an external ID nor a usable plant name")]
    InvalidQuery,
}
