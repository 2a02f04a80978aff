//! # Quill Inference
//!
//! The context a structured editor consults about a program: which
//! definitions are in scope where, what type each expression has, what type
//! each position expects, and which conflicts the program has.
//!
//! ## Example
//!
//! ```rust
//! use quill_inference::{Context, Type};
//! use quill_parser::parse;
//!
//! let program = parse("c: 1\nc + 2");
//! let statements = program.get("block").unwrap().list("statements").unwrap().to_vec();
//! let context = Context::new(program);
//!
//! assert_eq!(context.type_of(&statements[1]), Type::Number);
//! assert!(context.conflicts().is_empty());
//! ```

pub mod conflicts;
pub mod context;
pub mod error;
#[cfg(feature = "pretty-errors")]
pub mod report;
pub mod scope;
pub mod types;

pub use conflicts::{Conflict, ConflictKind};
pub use context::Context;
pub use error::{InferenceError, InferenceResult};
#[cfg(feature = "pretty-errors")]
pub use report::format_conflicts;
pub use scope::{names_of, preferred_name, Name, Scope};
pub use types::{FunctionType, Type};
