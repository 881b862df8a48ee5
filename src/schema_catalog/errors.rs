//! Error types for schema catalog loading and lookup.
//!
//! These errors occur while parsing a catalog document or while resolving
//! by-name references (association targets, query origins, nested sources)
//! into shared definitions.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaCatalogError {
    #[error("Failed to parse schema catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No definition found for `{name}`")]
    DefinitionNotFound { name: String },

    #[error("Definition `{referenced_by}` references unknown definition `{name}`")]
    UnknownReference { name: String, referenced_by: String },

    #[error("Circular definition chain detected at `{name}`")]
    CircularDefinition { name: String },
}
