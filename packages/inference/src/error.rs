use quill_parser::{NodeId, NodeKind};
use thiserror::Error;

/// Errors from questions asked of a context about nodes it cannot answer for
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Name '{0}' not found in scope")]
    UnknownName(String),

    #[error("Node {0} is not part of this program")]
    NotInTree(NodeId),

    #[error("Expected a reference, found {0:?}")]
    NotAReference(NodeKind),
}

pub type InferenceResult<T> = Result<T, InferenceError>;
