//! The caret: a text offset or a selected node in one source snapshot
//!
//! Carets are values. An edit returns a new source together with a caret
//! for it; a caret held from before the edit describes the old snapshot and
//! must not be used against the new one.

use crate::affordances;
use crate::errors::{EditError, EditResult};
use crate::geometry::Geometry;
use crate::source::Source;
use quill_parser::tokenizer::PLACEHOLDER_SYMBOL;
use quill_parser::{grapheme_len, Node, TokenType};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum Position {
    Index(usize),
    Node(Node),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

/// A new source and the caret that goes with it
#[derive(Debug, Clone)]
pub struct Edit {
    pub source: Source,
    pub caret: Caret,
}

/// Nodes whose content starts right after (`before`) or ends right before
/// (`after`) a text offset. Each is a place something could be inserted.
#[derive(Debug, Clone, Default)]
pub struct InsertionContext {
    pub before: Vec<Node>,
    pub after: Vec<Node>,
}

#[derive(Clone)]
pub struct Caret {
    source: Source,
    position: Position,
    token: Option<Node>,
    token_excluding_space: Option<Node>,
    token_prior: Option<Node>,
    token_space_index: Option<usize>,
}

impl Caret {
    /// A caret at `position`, with offsets clamped to the text
    pub fn new(source: Source, position: Position) -> Self {
        let position = match position {
            Position::Index(index) => Position::Index(index.min(source.code().len())),
            node => node,
        };
        let (token, token_excluding_space, token_prior) = match &position {
            Position::Index(index) => (
                source.get_token_at(*index, true).cloned(),
                source.get_token_at(*index, false).cloned(),
                index
                    .checked_sub(1)
                    .and_then(|prior| source.get_token_at(prior, false))
                    .cloned(),
            ),
            Position::Node(_) => (None, None, None),
        };
        let token_space_index = token.as_ref().and_then(|t| source.token_space_index(t));

        Self {
            source,
            position,
            token,
            token_excluding_space,
            token_prior,
            token_space_index,
        }
    }

    pub fn at(source: Source, index: usize) -> Self {
        Self::new(source, Position::Index(index))
    }

    pub fn selecting(source: Source, node: Node) -> Self {
        Self::new(source, Position::Node(node))
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn index(&self) -> Option<usize> {
        match self.position {
            Position::Index(index) => Some(index),
            Position::Node(_) => None,
        }
    }

    pub fn node(&self) -> Option<&Node> {
        match &self.position {
            Position::Node(node) => Some(node),
            Position::Index(_) => None,
        }
    }

    pub fn is_index(&self) -> bool {
        self.index().is_some()
    }

    pub fn is_node(&self) -> bool {
        self.node().is_some()
    }

    /// Token at the position, counting its preceding space as part of it
    pub fn token(&self) -> Option<&Node> {
        self.token.as_ref()
    }

    pub fn token_excluding_space(&self) -> Option<&Node> {
        self.token_excluding_space.as_ref()
    }

    /// Token holding the character just before the position
    pub fn token_prior(&self) -> Option<&Node> {
        self.token_prior.as_ref()
    }

    pub fn token_space_index(&self) -> Option<usize> {
        self.token_space_index
    }

    /// Same position against another source, collapsing a selection the
    /// other source does not contain
    pub fn with_source(&self, source: Source) -> Caret {
        let position = match &self.position {
            Position::Node(node) if !source.contains(node) => Position::Index(0),
            position => position.clone(),
        };
        Caret::new(source, position)
    }

    pub fn with_position(&self, position: Position) -> Caret {
        Caret::new(self.source.clone(), position)
    }

    pub fn with_index(&self, index: usize) -> Caret {
        self.with_position(Position::Index(index))
    }

    pub fn is_end(&self) -> bool {
        self.index() == Some(self.source.code().len())
    }

    pub fn at_beginning_of_token(&self) -> bool {
        match (self.index(), &self.token_excluding_space) {
            (Some(index), Some(token)) => self.source.token_text_index(token) == Some(index),
            _ => false,
        }
    }

    /// True if the caret is an offset in `start..=end`
    pub fn between(&self, start: usize, end: usize) -> bool {
        self.index().is_some_and(|index| start <= index && index <= end)
    }

    /// Graphemes between the start of the line and the caret. A selection
    /// counts from where the node starts.
    pub fn column(&self) -> usize {
        let offset = match &self.position {
            Position::Index(index) => *index,
            Position::Node(node) => self.range(node).map(|(start, _)| start).unwrap_or(0),
        };
        offset - self.source.code().line_start(offset)
    }

    /// Offset where row `row` (zero based) starts
    pub fn row_position(&self, row: usize) -> Option<usize> {
        if row == 0 {
            return Some(0);
        }
        let code = self.source.code();
        let mut rows = 0;
        for index in 0..code.len() {
            if code.at(index) == Some("\n") {
                rows += 1;
                if rows == row {
                    return Some(index + 1);
                }
            }
        }
        None
    }

    /// The offset of the nearest newline in `direction`
    pub fn next_newline(&self, direction: Direction) -> Option<Caret> {
        let index = self.index()?;
        let code = self.source.code();
        let found = match direction {
            Direction::Forward => (index + 1..code.len()).find(|&i| code.at(i) == Some("\n")),
            Direction::Backward => (0..index).rev().find(|&i| code.at(i) == Some("\n")),
        };
        found.map(|i| self.with_index(i))
    }

    /// Offsets from the start of a node's first token to the end of its last
    pub fn range(&self, node: &Node) -> Option<(usize, usize)> {
        self.source.node_range(node)
    }

    pub fn left(&self) -> Caret {
        self.move_horizontal(Direction::Backward)
    }

    pub fn right(&self) -> Caret {
        self.move_horizontal(Direction::Forward)
    }

    /// Move one grapheme. A selection collapses to the side moved toward,
    /// and stepping onto a placeholder selects the whole placeholder.
    pub fn move_horizontal(&self, direction: Direction) -> Caret {
        let index = match &self.position {
            Position::Node(node) => {
                let Some((start, end)) = self.range(node) else {
                    return self.clone();
                };
                return self.with_index(if direction == Direction::Backward { start } else { end });
            }
            Position::Index(index) => *index,
        };

        let length = self.source.code().len();
        let (adjacent, next) = match direction {
            Direction::Backward if index == 0 => return self.clone(),
            Direction::Forward if index >= length => return self.clone(),
            Direction::Backward => (index - 1, index - 1),
            Direction::Forward => (index, index + 1),
        };

        if self.source.code().at(adjacent) == Some(PLACEHOLDER_SYMBOL) {
            if let Some(token) = self.source.get_token_at(adjacent, false) {
                if token.is(TokenType::Placeholder) && self.source.token_text_index(token) == Some(adjacent) {
                    return self.with_position(Position::Node(token.clone()));
                }
            }
        }
        self.with_index(next)
    }

    /// Move to the previous or next line, landing as close as the geometry
    /// allows to the caret's current x. `None` for selections.
    pub fn move_vertical(&self, geometry: &dyn Geometry, direction: Direction) -> Option<Caret> {
        let position = self.index()?;
        let code = self.source.code();
        let length = code.len();

        let line_start = match direction {
            Direction::Backward => {
                let current = code.line_start(position);
                if current == 0 {
                    return Some(self.with_index(0));
                }
                code.line_start(current - 1)
            }
            Direction::Forward => {
                let newline = (position..length).find(|&i| code.at(i) == Some("\n"));
                match newline {
                    Some(newline) => newline + 1,
                    None => return Some(self.with_index(length)),
                }
            }
        };
        let line_end = (line_start..length)
            .find(|&i| code.at(i) == Some("\n"))
            .unwrap_or(length);
        let raw = (line_start + self.column()).min(line_end);

        // Tokens whose text starts on the destination line
        let on_line: Vec<&Node> = self
            .source
            .tokens()
            .iter()
            .filter(|token| {
                self.source
                    .token_text_index(token)
                    .is_some_and(|start| line_start <= start && start <= line_end)
            })
            .collect();

        let Some(first) = on_line.first() else {
            return Some(self.with_index(raw));
        };
        if self.source.token_text_index(first).is_some_and(|start| start > raw) {
            return Some(self.with_index(raw));
        }

        let Some(x) = geometry.caret_x() else {
            return Some(self.with_index(raw));
        };
        let mut closest: Option<(&Node, f64)> = None;
        for token in on_line {
            if let Some(rect) = geometry.token_rect(token) {
                let distance = rect.distance(x);
                if closest.map_or(true, |(_, best)| distance < best) {
                    closest = Some((token, distance));
                }
            }
        }
        let Some((token, _)) = closest else {
            return Some(self.with_index(raw));
        };
        let rect = geometry.token_rect(token)?;
        let start = self.source.token_text_index(token)?;
        let token_length = grapheme_len(token.text());

        let offset = if x >= rect.right {
            token_length
        } else if x <= rect.left || rect.width == 0.0 {
            0
        } else {
            ((token_length as f64 * (x - rect.left) / rect.width).round() as usize).min(token_length)
        };
        Some(self.with_index(start + offset))
    }

    /// Type text at the caret. Typing on a selected placeholder replaces it;
    /// typing on any other selection replaces the selected node's text.
    pub fn insert(&self, text: &str) -> EditResult<Edit> {
        match &self.position {
            Position::Index(index) => {
                let source = self.source.with_graphemes_at(text, *index)?;
                let caret = Caret::at(source.clone(), index + grapheme_len(text));
                Ok(Edit { source, caret })
            }
            Position::Node(node) => self.replace(node, text),
        }
    }

    /// Delete the node's text and put `text` in its place
    pub fn replace(&self, node: &Node, text: &str) -> EditResult<Edit> {
        let (start, end) = self.range(node).ok_or(EditError::NotFound(node.id()))?;
        let source = self
            .source
            .without_graphemes_between(start, end)?
            .with_graphemes_at(text, start)?;
        let caret = Caret::at(source.clone(), start + grapheme_len(text));
        Ok(Edit { source, caret })
    }

    /// Delete backward. A selection is removed the way its parent allows,
    /// else its text is deleted.
    pub fn backspace(&self) -> EditResult<Edit> {
        match &self.position {
            Position::Index(0) => Err(EditError::OutOfBounds {
                offset: 0,
                length: self.source.code().len(),
            }),
            Position::Index(index) => {
                let source = self.source.without_grapheme_at(index - 1)?;
                let caret = Caret::at(source.clone(), index - 1);
                Ok(Edit { source, caret })
            }
            Position::Node(node) => {
                let root = self.source.root();
                // A selected placeholder token stands for its placeholder node
                let subject = match root.parent(node) {
                    Some(parent) if node.is(TokenType::Placeholder) => parent.clone(),
                    _ => node.clone(),
                };
                if let Some(parent) = root.parent(&subject) {
                    if let Some(removal) = affordances::child_removal(&self.source, parent, &subject) {
                        debug!(node = subject.id(), "removing selection");
                        match removal.edit(&[]) {
                            Ok(edit) => return Ok(edit),
                            Err(error) => debug!(%error, "removal refused, deleting text"),
                        }
                    }
                }
                let (start, end) = self.range(node).ok_or(EditError::NotFound(node.id()))?;
                let source = self.source.without_graphemes_between(start, end)?;
                let caret = Caret::at(source.clone(), start);
                Ok(Edit { source, caret })
            }
        }
    }

    /// Nodes this offset sits immediately before and immediately after
    pub fn nodes_between(&self) -> Option<InsertionContext> {
        let position = self.index()?;
        let root = self.source.root();
        let token_after = self.source.get_token_with_space_at(position)?;

        let mut before = vec![token_after.clone()];
        for ancestor in root.ancestors(token_after) {
            let starts_here = ancestor.first_token().is_some_and(|first| first.same(token_after));
            if !starts_here || root.parent(&ancestor).is_none() {
                break;
            }
            before.push(ancestor);
        }

        let mut after = Vec::new();
        if let Some(token_before) = self.source.previous_token(token_after) {
            after.push(token_before.clone());
            for ancestor in root.ancestors(token_before) {
                let ends_here = ancestor.last_token().is_some_and(|last| last.same(token_before));
                if !ends_here || root.parent(&ancestor).is_none() {
                    break;
                }
                after.push(ancestor);
            }
        }

        Some(InsertionContext { before, after })
    }
}

impl fmt::Debug for Caret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Position::Index(index) => write!(f, "Caret({})", index),
            Position::Node(node) => write!(f, "Caret({:?})", node),
        }
    }
}
