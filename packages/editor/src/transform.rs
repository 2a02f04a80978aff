//! Transforms: concrete edits offered at a position
//!
//! A transform names what it would do (replace a node, insert into a list,
//! set an optional field, remove) and what it would put there. Nothing is
//! built until asked: `new_node` materializes the candidate for a set of
//! locales, `text` renders it for display, and `edit` applies it to the
//! source it was computed against.
//!
//! Structural edits keep the edited tree instead of reparsing its text, so
//! the nodes of the new source are the very nodes the transform built. An
//! edit whose text would parse into a different tree is refused.

use crate::caret::{Caret, Edit};
use crate::errors::{EditError, EditResult};
use crate::source::Source;
use quill_inference::{preferred_name, Type};
use quill_parser::{builders, Field, Node, NodeKind, TokenType};
use serde::Serialize;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformKind {
    Replace,
    Insert,
    Append,
    Assign,
    Remove,
}

/// What a transform would put in place
#[derive(Debug, Clone)]
pub enum Candidate {
    /// A prepared node, copied afresh every time it is materialized
    Node(Node),
    /// A reference to a definition, named for the requested locales
    Reference { definition: Node },
    /// A call of a function with a typed placeholder per input
    Evaluate { definition: Node, inputs: Vec<Type> },
    /// An existing expression inside a new block
    Wrap(Node),
}

impl Candidate {
    pub fn materialize(&self, locales: &[String]) -> Option<Node> {
        match self {
            Candidate::Node(node) => Some(node.duplicate()),
            Candidate::Reference { definition } => {
                preferred_name(definition, locales).map(|name| builders::reference(&name))
            }
            Candidate::Evaluate { definition, inputs } => {
                let name = preferred_name(definition, locales)?;
                let placeholders = inputs
                    .iter()
                    .map(|input| builders::placeholder_expression(input.to_node()))
                    .collect();
                Some(builders::evaluate(builders::reference(&name), placeholders))
            }
            Candidate::Wrap(node) => Some(builders::block(vec![detached(node)])),
        }
    }
}

/// Copy of a subtree whose tokens carry no lexed spacing
fn detached(node: &Node) -> Node {
    if let Some(token) = node.as_token() {
        return Node::token(token.text.clone(), &token.types);
    }
    let fields = node
        .fields()
        .iter()
        .map(|field| match field {
            Field::One(child) => Field::One(detached(child)),
            Field::Maybe(child) => Field::Maybe(child.as_ref().map(detached)),
            Field::List(children) => Field::List(children.iter().map(detached).collect()),
        })
        .collect();
    Node::new(node.kind(), fields)
}

#[derive(Debug, Clone)]
pub enum Action {
    Replace {
        node: Node,
        candidate: Candidate,
    },
    /// Insert before the list element now at `index`
    Insert {
        parent: Node,
        field: &'static str,
        index: usize,
        candidate: Candidate,
    },
    /// Insert at `index`, which may be the end of the list
    Append {
        parent: Node,
        field: &'static str,
        index: usize,
        candidate: Candidate,
    },
    /// Set an unset optional field, adding its companion token if needed
    Assign {
        parent: Node,
        field: &'static str,
        candidate: Candidate,
    },
    Remove {
        parent: Node,
        node: Node,
    },
}

/// A transform and the source snapshot it applies to
#[derive(Debug, Clone)]
pub struct Transform {
    source: Source,
    action: Action,
}

/// Display form of a transform
#[derive(Debug, Clone, Serialize)]
pub struct TransformSummary {
    pub kind: TransformKind,
    /// Text of the node replaced, removed, or inserted into
    pub target: String,
    pub text: String,
}

/// The token that goes with an optional field, like the `:` before a value
fn companion(kind: NodeKind, field: &str) -> Option<(&'static str, fn() -> Node)> {
    match (kind, field) {
        (NodeKind::Bind, "value") => Some(("colon", builders::bind_colon)),
        (NodeKind::Bind, "type")
        | (NodeKind::FunctionDefinition, "output")
        | (NodeKind::ExpressionPlaceholder, "type") => Some(("dot", builders::type_dot)),
        _ => None,
    }
}

impl Transform {
    pub fn new(source: Source, action: Action) -> Self {
        Self { source, action }
    }

    pub fn replace(source: &Source, node: &Node, candidate: Candidate) -> Self {
        Self::new(
            source.clone(),
            Action::Replace {
                node: node.clone(),
                candidate,
            },
        )
    }

    pub fn remove(source: &Source, parent: &Node, node: &Node) -> Self {
        Self::new(
            source.clone(),
            Action::Remove {
                parent: parent.clone(),
                node: node.clone(),
            },
        )
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn kind(&self) -> TransformKind {
        match self.action {
            Action::Replace { .. } => TransformKind::Replace,
            Action::Insert { .. } => TransformKind::Insert,
            Action::Append { .. } => TransformKind::Append,
            Action::Assign { .. } => TransformKind::Assign,
            Action::Remove { .. } => TransformKind::Remove,
        }
    }

    /// The node replaced or removed, or the parent inserted into
    pub fn target(&self) -> &Node {
        match &self.action {
            Action::Replace { node, .. } | Action::Remove { node, .. } => node,
            Action::Insert { parent, .. } | Action::Append { parent, .. } | Action::Assign { parent, .. } => parent,
        }
    }

    fn candidate(&self) -> Option<&Candidate> {
        match &self.action {
            Action::Replace { candidate, .. }
            | Action::Insert { candidate, .. }
            | Action::Append { candidate, .. }
            | Action::Assign { candidate, .. } => Some(candidate),
            Action::Remove { .. } => None,
        }
    }

    /// The node this transform would add, built fresh for `locales`
    pub fn new_node(&self, locales: &[String]) -> Option<Node> {
        self.candidate()?.materialize(locales)
    }

    /// The added node rendered with preferred spacing; empty for removals
    pub fn text(&self, locales: &[String]) -> String {
        self.new_node(locales).map(|node| node.to_text()).unwrap_or_default()
    }

    pub fn summary(&self, locales: &[String]) -> TransformSummary {
        TransformSummary {
            kind: self.kind(),
            target: self.target().to_text(),
            text: self.text(locales),
        }
    }

    /// Apply to the source this transform was computed against
    #[instrument(skip_all, fields(kind = ?self.kind(), source = %self.source.name()))]
    pub fn edit(&self, locales: &[String]) -> EditResult<Edit> {
        let source = &self.source;
        let spaces = source.spaces();

        let (program, spaces, added) = match &self.action {
            Action::Replace { node, .. } => {
                let new = self.new_node(locales).ok_or(EditError::NoTransform)?;
                let program = replace_in(source, node, new.clone())?;
                (program, spaces.with_replacement(node, Some(&new)), Some(new))
            }
            Action::Insert { parent, field, index, .. } | Action::Append { parent, field, index, .. } => {
                let new = self.new_node(locales).ok_or(EditError::NoTransform)?;
                let list = parent.list(field).ok_or(EditError::NoContainingList)?;
                if *index > list.len() {
                    return Err(EditError::OutOfBounds {
                        offset: *index,
                        length: list.len(),
                    });
                }
                let following = list.get(*index).cloned();
                let mut items = list.to_vec();
                items.insert(*index, new.clone());
                let edited = parent.with_list(field, items).ok_or_else(|| invalid(&new))?;
                let program = replace_in(source, parent, edited)?;

                // The new element takes over the space before the one it now
                // precedes, which falls back to its preferred separator
                let spaces = match following {
                    Some(following) => spaces
                        .with_replacement(&following, Some(&new))
                        .without_space(&following),
                    None => spaces.clone(),
                };
                (program, spaces, Some(new))
            }
            Action::Assign { parent, field, .. } => {
                let new = self.new_node(locales).ok_or(EditError::NoTransform)?;
                let mut edited = parent
                    .with_field(field, Field::Maybe(Some(new.clone())))
                    .ok_or_else(|| invalid(&new))?;
                if let Some((name, token)) = companion(parent.kind(), field) {
                    if edited.get(name).is_none() {
                        edited = edited
                            .with_field(name, Field::Maybe(Some(token())))
                            .ok_or_else(|| invalid(&new))?;
                    }
                }
                let program = replace_in(source, parent, edited)?;
                (program, spaces.clone(), Some(new))
            }
            Action::Remove { parent, node } => {
                let mut edited = parent.replace_child(node, None).ok_or_else(|| invalid(node))?;
                if let Some(spec) = parent.field_of_child(node) {
                    if let Some((name, _)) = companion(parent.kind(), spec.name) {
                        let without = edited.with_field(name, Field::Maybe(None));
                        // A bind left with neither `•` nor `:` would read back as a reference
                        let reads_back = |n: &Node| {
                            n.kind() != NodeKind::Bind || n.get("dot").is_some() || n.get("colon").is_some()
                        };
                        if let Some(without) = without.filter(reads_back) {
                            edited = without;
                        }
                    }
                }
                let program = replace_in(source, parent, edited)?;
                (program, spaces.clone(), None)
            }
        };

        let edited = source.with_program(program, spaces);
        // The rendered text has to read back as the edited tree
        if !edited.reads_back() {
            debug!(code = %edited.code(), "edit does not read back");
            return Err(EditError::NoTransform);
        }
        let caret = match (&self.action, added) {
            (Action::Remove { node, .. }, _) => {
                let start = source.node_range(node).map(|(start, _)| start).unwrap_or(0);
                Caret::at(edited.clone(), start)
            }
            (_, Some(added)) => caret_after(&edited, &added),
            (_, None) => Caret::at(edited.clone(), 0),
        };
        debug!(code = %edited.code(), "applied transform");
        Ok(Edit { source: edited, caret })
    }
}

fn invalid(node: &Node) -> EditError {
    EditError::InvalidTarget {
        given: format!("{:?}", node.kind()),
    }
}

/// The program with `original` substituted
fn replace_in(source: &Source, original: &Node, replacement: Node) -> EditResult<Node> {
    let program = source.program();
    if !source.contains(original) {
        return Err(EditError::NotFound(original.id()));
    }
    if program.same(original) {
        return Ok(replacement);
    }
    let kind = replacement.kind();
    program
        .try_replace(original, Some(replacement))
        .ok_or_else(|| EditError::InvalidTarget {
            given: format!("{:?}", kind),
        })
}

/// Select the first placeholder of a newly added node, else sit after it
pub(crate) fn caret_after(source: &Source, added: &Node) -> Caret {
    let placeholder = added
        .nodes()
        .into_iter()
        .find(|node| node.kind().is_placeholder())
        .and_then(|placeholder| placeholder.first_token())
        .filter(|token| token.is(TokenType::Placeholder));
    if let Some(token) = placeholder {
        return Caret::selecting(source.clone(), token);
    }
    let end = source.node_range(added).map(|(_, end)| end).unwrap_or(0);
    Caret::at(source.clone(), end)
}
