//! # Quill Editor
//!
//! Editing core for Quill: keeps a syntax tree and its text in step while
//! the text is typed into or the tree is rearranged by dragging.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: text → tree, tree + spaces → text   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ inference: scopes, types, conflicts         │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: snapshots and edits                 │
//! │  - Source: text, tree and whitespace map    │
//! │  - Caret: offsets, selections, movement     │
//! │  - Drag/drop into insertion points          │
//! │  - Transforms offered at the caret          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Snapshots, not state**: every edit returns a new `Source` (and a new
//!    `Caret` or `Project`); nothing is mutated in place
//! 2. **Round trip always holds**: rendering a source's tree with its spaces
//!    gives back its text exactly
//! 3. **Spacing beside the tree**: whitespace is keyed by token identity, so
//!    structural edits never reparse
//! 4. **No edit is an answer**: an edit that cannot happen is an `EditError`
//!    and the caller's snapshot stays current
//!
//! ## Usage
//!
//! ```rust
//! use quill_editor::{get_edits_at, Caret, Project, Source, TransformKind};
//!
//! let source = Source::new("main", "a:");
//! let project = Project::new("demo", vec![source.clone()]);
//! let caret = Caret::at(source, 2);
//!
//! let edits = get_edits_at(&project, &caret);
//! let zero = edits
//!     .iter()
//!     .find(|t| t.kind() == TransformKind::Assign && t.text(project.locales()) == "0")
//!     .unwrap();
//! let edit = zero.edit(project.locales()).unwrap();
//! assert_eq!(edit.source.code().as_str(), "a: 0");
//! ```

pub mod affordances;
mod autocomplete;
pub mod caret;
mod code;
pub mod drag;
mod errors;
pub mod geometry;
mod project;
mod source;
mod spaces;
pub mod transform;

pub use autocomplete::get_edits_at;
pub use caret::{Caret, Direction, Edit, InsertionContext, Position};
pub use code::Code;
pub use drag::{drop_node_at_offset, drop_node_on_source, get_insertion_point, DropTarget, InsertionPoint};
pub use errors::{EditError, EditResult};
pub use geometry::{Geometry, Monospace, Rect};
pub use project::Project;
pub use source::Source;
pub use spaces::Spaces;
pub use transform::{Action, Candidate, Transform, TransformKind, TransformSummary};
