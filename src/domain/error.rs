//! Domain-level errors

use thiserror::Error;

/// Errors reported by tree operations and the document loader.
///
/// Every variant is a recoverable, structured outcome: callers decide
/// whether to surface it as user feedback. No operation leaves the tree
/// partially mutated after returning one of these.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("decision not found: {0}")]
    DecisionNotFound(String),

    #[error("parent decision not found: {0}")]
    ParentNotFound(String),

    #[error("duplicate decision id: {0}")]
    DuplicateId(String),

    #[error("no parent given for non-root decision: {0}")]
    MissingParent(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to parse tree document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("internal tree inconsistency: {0}")]
    InternalError(String),
}

pub type TreeResult<T> = Result<T, TreeError>;
