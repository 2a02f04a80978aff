//! Source: text, tree and whitespace kept in step
//!
//! A `Source` is a snapshot. Text edits reparse and hand back a new one;
//! structural edits keep the edited tree and re-render the text from it.
//! Either way `render(program, spaces) == code` holds for every snapshot.

use crate::code::Code;
use crate::errors::{EditError, EditResult};
use crate::spaces::Spaces;
use quill_inference::Context;
use quill_parser::{parse, Node, NodeId, Root, Serializer};
use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(0);

/// Grapheme offsets of a token: where its space starts, where its text
/// starts, and where its text ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    space: usize,
    text: usize,
    end: usize,
}

#[derive(Clone)]
pub struct Source {
    id: u64,
    name: Rc<str>,
    code: Rc<Code>,
    program: Node,
    spaces: Spaces,
    root: Rc<Root>,
    spans: Rc<HashMap<NodeId, Span>>,
    context: OnceCell<Rc<Context>>,
}

impl Source {
    /// Parse `code` into a new source
    pub fn new(name: &str, code: &str) -> Self {
        let program = parse(code);
        let spaces = Spaces::from_lexed(&program);
        Self::build(Rc::from(name), program, spaces)
    }

    fn build(name: Rc<str>, program: Node, spaces: Spaces) -> Self {
        let serializer = Serializer::new(&program, &spaces);
        let mut text = String::new();
        // Byte offsets first; a grapheme may straddle a space and the text after it
        let mut bytes = Vec::new();
        let mut rendered = HashMap::new();
        for spaced in serializer.tokens() {
            let space = text.len();
            text.push_str(&spaced.space);
            let start = text.len();
            text.push_str(spaced.token.text());
            bytes.push((spaced.token.id(), space, start, text.len()));
            rendered.insert(spaced.token.id(), spaced.space.clone());
        }

        let code = Code::new(text);
        let spans: HashMap<NodeId, Span> = bytes
            .into_iter()
            .map(|(id, space, start, end)| {
                let span = Span {
                    space: code.grapheme_index(space),
                    text: code.grapheme_index(start),
                    end: code.grapheme_index(end),
                };
                (id, span)
            })
            .collect();

        Self {
            id: NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed),
            name,
            code: Rc::new(code),
            root: Rc::new(Root::new(program.clone())),
            program,
            spaces: Spaces::rendered(rendered),
            spans: Rc::new(spans),
            context: OnceCell::new(),
        }
    }

    /// Identity of this snapshot
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Same snapshot, not merely the same text
    pub fn same(&self, other: &Source) -> bool {
        self.id == other.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn program(&self) -> &Node {
        &self.program
    }

    pub fn spaces(&self) -> &Spaces {
        &self.spaces
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    /// Type and scope information, computed on first use
    pub fn context(&self) -> Rc<Context> {
        self.context
            .get_or_init(|| Rc::new(Context::new(self.program.clone())))
            .clone()
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.root.contains(node)
    }

    /// True if the text parses back into this source's tree
    pub fn reads_back(&self) -> bool {
        parse(self.code.as_str()).equals(&self.program)
    }

    /// Every node of the program in pre-order
    pub fn nodes(&self) -> Vec<Node> {
        self.program.nodes()
    }

    /// Tokens in text order, ending with END
    pub fn tokens(&self) -> &[Node] {
        self.root.tokens()
    }

    fn span(&self, token: &Node) -> Option<Span> {
        self.spans.get(&token.id()).copied()
    }

    /// The token at `offset`. A token that starts exactly at `offset` wins;
    /// otherwise the token whose span contains it, counting the text end as
    /// inside. With `include_space`, a token starts where its space does.
    pub fn get_token_at(&self, offset: usize, include_space: bool) -> Option<&Node> {
        let start = |span: &Span| if include_space { span.space } else { span.text };
        let spans = self.tokens().iter().filter_map(|token| Some((token, self.span(token)?)));
        spans
            .clone()
            .find(|(_, span)| start(span) == offset)
            .or_else(|| spans.clone().find(|(_, span)| start(span) < offset && offset <= span.end))
            .map(|(token, _)| token)
    }

    /// The first token whose preceding space contains `offset`, ends
    /// included
    pub fn get_token_with_space_at(&self, offset: usize) -> Option<&Node> {
        self.tokens()
            .iter()
            .find(|token| self.token_space_contains(token, offset))
    }

    pub fn token_space_contains(&self, token: &Node, offset: usize) -> bool {
        self.span(token)
            .is_some_and(|span| span.space <= offset && offset <= span.text)
    }

    pub fn token_space_index(&self, token: &Node) -> Option<usize> {
        self.span(token).map(|span| span.space)
    }

    pub fn token_text_index(&self, token: &Node) -> Option<usize> {
        self.span(token).map(|span| span.text)
    }

    /// Offset just past a token's text
    pub fn token_last_index(&self, token: &Node) -> Option<usize> {
        self.span(token).map(|span| span.end)
    }

    /// Offsets from the start of a node's first token to the end of its
    /// last. Empty nodes get the empty range where they would start.
    pub fn node_range(&self, node: &Node) -> Option<(usize, usize)> {
        match (node.first_token(), node.last_token()) {
            (Some(first), Some(last)) => Some((self.token_text_index(&first)?, self.token_last_index(&last)?)),
            _ => {
                let at = self.token_text_index(self.root.leaf_after(node)?)?;
                Some((at, at))
            }
        }
    }

    /// First token of `node`, if the node is in this source
    pub fn first_token(&self, node: &Node) -> Option<Node> {
        node.first_token().filter(|token| self.contains(token))
    }

    pub fn last_token(&self, node: &Node) -> Option<Node> {
        node.last_token().filter(|token| self.contains(token))
    }

    pub fn next_token(&self, token: &Node) -> Option<&Node> {
        self.root.next_token(token)
    }

    pub fn previous_token(&self, token: &Node) -> Option<&Node> {
        self.root.previous_token(token)
    }

    fn out_of_bounds(&self, offset: usize) -> EditError {
        EditError::OutOfBounds {
            offset,
            length: self.code.len(),
        }
    }

    /// Insert text at a grapheme offset and reparse
    pub fn with_graphemes_at(&self, text: &str, offset: usize) -> EditResult<Source> {
        let code = self
            .code
            .with_graphemes_at(text, offset)
            .ok_or_else(|| self.out_of_bounds(offset))?;
        debug!(source = %self.name, offset, text, "inserted graphemes");
        Ok(self.with_code(code.as_str()))
    }

    /// Delete the graphemes in `start..end` and reparse
    pub fn without_graphemes_between(&self, start: usize, end: usize) -> EditResult<Source> {
        let code = self
            .code
            .without_graphemes_between(start, end)
            .ok_or_else(|| self.out_of_bounds(start.max(end)))?;
        debug!(source = %self.name, start, end, "removed graphemes");
        Ok(self.with_code(code.as_str()))
    }

    pub fn without_grapheme_at(&self, offset: usize) -> EditResult<Source> {
        self.without_graphemes_between(offset, offset + 1)
    }

    /// A fresh parse of new text under the same name
    pub fn with_code(&self, code: &str) -> Source {
        let program = parse(code);
        let spaces = Spaces::from_lexed(&program);
        Self::build(self.name.clone(), program, spaces)
    }

    /// Adopt an edited tree without reparsing; the text is rendered from it
    pub fn with_program(&self, program: Node, spaces: Spaces) -> Source {
        Self::build(self.name.clone(), program, spaces)
    }

    pub fn with_spaces(&self, spaces: Spaces) -> Source {
        Self::build(self.name.clone(), self.program.clone(), spaces)
    }

    /// Substitute a node of this source, keeping the space before it
    pub fn replace(&self, original: &Node, replacement: Option<Node>) -> EditResult<Source> {
        if !self.contains(original) {
            return Err(EditError::NotFound(original.id()));
        }
        let program = self
            .program
            .try_replace(original, replacement.clone())
            .ok_or_else(|| EditError::InvalidTarget {
                given: format!("{:?}", original.kind()),
            })?;
        let spaces = self.spaces.with_replacement(original, replacement.as_ref());
        Ok(self.with_program(program, spaces))
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("code", &self.code.as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_parser::{builders, TokenType};

    fn token_texts(source: &Source) -> Vec<&str> {
        source.tokens().iter().map(|t| t.text()).collect()
    }

    #[test]
    fn test_round_trip() {
        let source = Source::new("main", "a:  1\n\n ƒ f(x) x + a");
        assert_eq!(source.code().as_str(), "a:  1\n\n ƒ f(x) x + a");
        assert!(source.program().equals(&parse(source.code().as_str())));
    }

    #[test]
    fn test_token_lookup() {
        let source = Source::new("main", "a b");
        let b = &source.tokens()[1];
        assert!(source.get_token_at(1, true).unwrap().same(b));
        assert_eq!(source.get_token_at(1, false).unwrap().text(), "a");
        assert!(source.get_token_at(2, false).unwrap().same(b));
        assert!(source.get_token_at(3, false).unwrap().is(TokenType::End));
        assert!(source.get_token_with_space_at(1).unwrap().same(b));
        assert!(source.token_space_contains(b, 2));
        assert!(!source.token_space_contains(b, 0));
        assert_eq!(source.token_space_index(b), Some(1));
        assert_eq!(source.token_text_index(b), Some(2));
        assert_eq!(source.token_last_index(b), Some(3));
    }

    #[test]
    fn test_offsets_count_graphemes() {
        let source = Source::new("main", "\"e\u{301}\" b");
        let b = &source.tokens()[1];
        assert_eq!(b.text(), "b");
        assert_eq!(source.token_text_index(b), Some(4));
    }

    #[test]
    fn test_spans_follow_merged_graphemes() {
        for code in ["a \u{301}", "\"x\" \u{200d}b"] {
            let source = Source::new("main", code);
            let length = source.code().len();
            let end = source.tokens().last().unwrap();
            assert_eq!(source.token_text_index(end), Some(length));
            for token in source.tokens() {
                let space = source.token_space_index(token).unwrap();
                let text = source.token_text_index(token).unwrap();
                let last = source.token_last_index(token).unwrap();
                assert!(space <= text && text <= last && last <= length);
            }
            assert!(source.get_token_at(length, false).is_some());
        }
        assert_eq!(Source::new("main", "a \u{301}").code().len(), 2);
        assert_eq!(Source::new("main", "\"x\" \u{200d}b").code().len(), 5);
    }

    #[test]
    fn test_text_edits_reparse() {
        let source = Source::new("main", "a: 1");
        let edited = source.with_graphemes_at("2", 4).unwrap();
        assert_eq!(edited.code().as_str(), "a: 12");
        assert_eq!(token_texts(&edited), vec!["a", ":", "12", ""]);
        assert!(!edited.same(&source));

        let edited = source.without_graphemes_between(1, 3).unwrap();
        assert_eq!(edited.code().as_str(), "a1");
        assert_eq!(source.without_grapheme_at(0).unwrap().code().as_str(), ": 1");

        assert_eq!(
            source.with_graphemes_at("x", 5).unwrap_err(),
            EditError::OutOfBounds { offset: 5, length: 4 }
        );
        assert!(source.without_grapheme_at(4).is_err());
    }

    #[test]
    fn test_replace_keeps_tree_and_spacing() {
        let source = Source::new("main", "x:   1");
        let one = source.program().nodes().into_iter().find(|n| n.text() == "1").unwrap();
        let literal = source.root().parent(&one).unwrap().clone();
        let two = builders::number("2");
        let edited = source.replace(&literal, Some(two.clone())).unwrap();
        assert_eq!(edited.code().as_str(), "x:   2");
        assert!(edited.contains(&two));

        let stranger = builders::number("3");
        assert_eq!(source.replace(&stranger, None).unwrap_err(), EditError::NotFound(stranger.id()));
    }

    #[test]
    fn test_node_range() {
        let source = Source::new("main", "a: [1 2]");
        let list = source.nodes().into_iter().find(|n| n.kind() == quill_parser::NodeKind::ListLiteral).unwrap();
        assert_eq!(source.node_range(&list), Some((3, 8)));
    }
}
