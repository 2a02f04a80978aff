//! Insertion points and drag/drop
//!
//! A drop never moves a node. It inserts a copy at the destination and then
//! deals with the origin according to the removal policy of the field the
//! node came from: vacate it, leave a typed placeholder, or leave it alone
//! (the drop becomes a copy). An origin that would no longer read back as
//! its tree gets the next option instead. Both sides are committed to the
//! project in one step, or neither is.

use crate::affordances::{removal_policy, stand_in, Removal};
use crate::errors::{EditError, EditResult};
use crate::project::Project;
use crate::source::Source;
use crate::spaces::Spaces;
use quill_parser::{Node, NodeKind};
use tracing::{debug, instrument};

/// A slot in a list field: the parent, the field and its current list, the
/// delimiting token the slot was found from, which line of the space before
/// the following node to land on, and the index to insert at
#[derive(Debug, Clone)]
pub struct InsertionPoint {
    pub node: Node,
    pub field: &'static str,
    pub list: Vec<Node>,
    pub token: Node,
    pub line: usize,
    pub index: usize,
}

impl InsertionPoint {
    pub fn new(node: Node, field: &'static str, list: Vec<Node>, token: Node, line: usize, index: usize) -> Self {
        Self {
            node,
            field,
            list,
            token,
            line,
            index,
        }
    }

    /// Same slot of the same tree
    pub fn equals(&self, other: &InsertionPoint) -> bool {
        self.node.same(&other.node)
            && self.field == other.field
            && self.list.len() == other.list.len()
            && self.list.iter().zip(&other.list).all(|(a, b)| a.same(b))
            && self.token.same(&other.token)
            && self.line == other.line
            && self.index == other.index
    }
}

/// The list slot just before (or after) `node`. The END token of a program
/// stands for the end of its top-level statements; a delimiter stands for
/// the start or end of the list it opens or closes.
pub fn get_insertion_point(
    source: &Source,
    node: &Node,
    before: bool,
    token: &Node,
    line: usize,
) -> EditResult<InsertionPoint> {
    let root = source.root();
    if !source.contains(node) {
        return Err(EditError::NotFound(node.id()));
    }

    if root.is_end(node) {
        let block = root
            .node()
            .get("block")
            .ok_or(EditError::NoContainingList)?
            .clone();
        let list = block.list("statements").unwrap_or(&[]).to_vec();
        let index = list.len();
        return Ok(InsertionPoint::new(block, "statements", list, node.clone(), line, index));
    }

    if node.is_token() {
        if let Some((parent, spec)) = root.list_beside(node, before) {
            let list = parent.list(spec.name).unwrap_or(&[]).to_vec();
            let index = if before { list.len() } else { 0 };
            return Ok(InsertionPoint::new(parent, spec.name, list, token.clone(), line, index));
        }
    }

    let (parent, spec, element) = root.containing_list(node).ok_or(EditError::NoContainingList)?;
    let list = parent.list(spec.name).unwrap_or(&[]).to_vec();
    let position = list
        .iter()
        .position(|n| n.same(&element))
        .ok_or(EditError::NoContainingList)?;
    let index = if before { position } else { position + 1 };
    Ok(InsertionPoint::new(parent, spec.name, list, token.clone(), line, index))
}

/// Where a dragged node lands
#[derive(Debug, Clone)]
pub enum DropTarget {
    /// Take the place of an existing node
    Node(Node),
    Insertion(InsertionPoint),
}

/// Split a space after its `line`th newline
fn split_space(space: &str, line: usize) -> (String, String) {
    let mut newlines = 0;
    for (offset, character) in space.char_indices() {
        if character == '\n' {
            newlines += 1;
            if newlines > line {
                return (space[..offset].to_string(), space[offset..].to_string());
            }
        }
    }
    (space.to_string(), String::new())
}

/// Drop `dragged` on `source`, returning the new project, the new source and
/// the copy that was inserted
#[instrument(skip_all, fields(source = %source.name(), dragged = dragged.id()))]
pub fn drop_node_on_source(
    project: &Project,
    source: &Source,
    dragged: &Node,
    target: &DropTarget,
) -> EditResult<(Project, Source, Node)> {
    if !project.sources().iter().any(|s| s.same(source)) {
        return Err(EditError::UnknownSource(source.name().to_string()));
    }

    let clone = dragged.duplicate();
    let origin = project.get_root(dragged);
    let origin_spaces: Spaces = origin.map(|o| o.spaces().clone()).unwrap_or_default();
    let replacements = origin.map(|o| origin_replacements(o, dragged)).unwrap_or_default();

    let program = source.program();
    let spaces = source.spaces().with_copied(&origin_spaces, dragged, &clone);

    let (program, spaces) = match target {
        DropTarget::Node(existing) => {
            if !source.contains(existing) {
                return Err(EditError::NotRooted(existing.id()));
            }
            let edited = if program.same(existing) {
                None
            } else {
                program.try_replace(existing, Some(clone.clone()))
            };
            let edited = edited.ok_or_else(|| EditError::InvalidTarget {
                given: format!("{:?}", clone.kind()),
            })?;
            (edited, spaces.with_replacement(existing, Some(&clone)))
        }
        DropTarget::Insertion(point) => {
            if !source.contains(&point.node) {
                return Err(EditError::NotRooted(point.node.id()));
            }
            let list = point.node.list(point.field).ok_or(EditError::NoContainingList)?;
            if point.index > list.len() {
                return Err(EditError::OutOfBounds {
                    offset: point.index,
                    length: list.len(),
                });
            }
            let mut items = list.to_vec();
            items.insert(point.index, clone.clone());
            let parent = point
                .node
                .with_list(point.field, items)
                .ok_or_else(|| EditError::InvalidTarget {
                    given: format!("{:?}", clone.kind()),
                })?;
            let edited = program
                .try_replace(&point.node, Some(parent))
                .ok_or(EditError::NoContainingList)?;

            // The node the clone now precedes gives up part of its space
            let following = list
                .get(point.index)
                .cloned()
                .or_else(|| point.node.node_after_field(point.field))
                .or_else(|| source.root().leaf_after(&point.node).cloned())
                .or_else(|| program.get("end").cloned());
            let spaces = match following {
                Some(following) => {
                    let (before, after) = split_space(source.spaces().get_space(&following), point.line);
                    spaces.with_space(&clone, before).with_space(&following, after)
                }
                None => spaces,
            };
            (edited, spaces)
        }
    };

    let mut staged = Vec::new();
    let mut vacated = None;
    if let Some(origin) = origin {
        if origin.same(source) {
            for replacement in &replacements {
                let Some(edited) = program.try_replace(dragged, replacement.clone()) else {
                    continue;
                };
                let candidate = settle(source, edited, spaces.with_replacement(dragged, replacement.as_ref()));
                if candidate.reads_back() {
                    vacated = Some(candidate);
                    break;
                }
            }
        } else {
            for replacement in replacements {
                if let Ok(candidate) = origin.replace(dragged, replacement) {
                    if candidate.reads_back() {
                        staged.push((origin.clone(), candidate));
                        break;
                    }
                }
            }
        }
    }

    // Without an origin edit that reads back, the drop is a copy
    let edited = match vacated {
        Some(edited) => edited,
        None => settle(source, program, spaces),
    };
    if !edited.reads_back() {
        return Err(EditError::NoTransform);
    }
    staged.push((source.clone(), edited.clone()));
    let project = project.with_sources(staged)?;
    debug!(kind = ?clone.kind(), code = %edited.code(), "dropped node");

    Ok((project, edited, clone))
}

/// What the origin slot can become, most preferred first. A vacated slot
/// may read back as part of its neighbor, so a stand-in follows it.
fn origin_replacements(origin: &Source, dragged: &Node) -> Vec<Option<Node>> {
    let Some(parent) = origin.root().parent(dragged) else {
        return Vec::new();
    };
    let context = origin.context();
    match removal_policy(&context, parent, dragged) {
        Removal::Vacate => {
            let fallback = parent
                .field_of_child(dragged)
                .and_then(|spec| stand_in(&context, spec, dragged));
            std::iter::once(None).chain(fallback.map(Some)).collect()
        }
        Removal::Replace(placeholder) => vec![Some(placeholder)],
        Removal::Keep => Vec::new(),
    }
}

fn settle(source: &Source, program: Node, spaces: Spaces) -> Source {
    let spaces = spaces.with_preferred_space(&program);
    source.with_program(program, spaces)
}

/// Drop `dragged` into the list slot nearest `offset` of `source`
pub fn drop_node_at_offset(
    project: &Project,
    source: &Source,
    dragged: &Node,
    offset: usize,
) -> EditResult<(Project, Source, Node)> {
    let token = source
        .get_token_with_space_at(offset)
        .or_else(|| source.get_token_at(offset, true))
        .ok_or(EditError::OutOfBounds {
            offset,
            length: source.code().len(),
        })?
        .clone();
    let line = source
        .token_space_index(&token)
        .and_then(|start| source.code().slice(start, offset))
        .map_or(0, |space| space.matches('\n').count());

    // Insert before the token, or into the list it closes
    let point = get_insertion_point(source, &token, true, &token, line).or_else(|_| {
        let element = source
            .root()
            .ancestors(&token)
            .into_iter()
            .find(|a| a.first_token().is_some_and(|first| first.same(&token)) && a.kind() != NodeKind::Program)
            .ok_or(EditError::NoContainingList)?;
        get_insertion_point(source, &element, true, &token, line)
    })?;
    drop_node_on_source(project, source, dragged, &DropTarget::Insertion(point))
}
