//! Error types for the editor
//!
//! Every edit that cannot be performed comes back as one of these instead of
//! a new snapshot. Callers treat any of them as "nothing happened".

use quill_parser::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Offset {offset} is outside 0..={length}")]
    OutOfBounds { offset: usize, length: usize },

    #[error("Node {0} is not part of this source")]
    NotFound(NodeId),

    #[error("No list holds this position")]
    NoContainingList,

    #[error("Node {0} is not rooted in the tree it was used with")]
    NotRooted(NodeId),

    #[error("No edit applies here")]
    NoTransform,

    #[error("Source '{0}' is not part of this project")]
    UnknownSource(String),

    #[error("Cannot place a {given} there")]
    InvalidTarget { given: String },
}

pub type EditResult<T> = Result<T, EditError>;
