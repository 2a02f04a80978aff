//! The whitespace map
//!
//! Spacing lives beside the tree rather than in it. Tokens are keyed by
//! identity, so moving a subtree or reflowing its spacing never requires a
//! reparse, and two equal tokens at different positions keep their own
//! spacing. A token with no entry renders with its preferred space.

use quill_parser::serializer::would_merge;
use quill_parser::{Node, NodeId, Serializer, SpaceSource};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct Spaces {
    spaces: Rc<HashMap<NodeId, String>>,
}

/// Space source that knows nothing, so every token gets its preferred space
struct Preferred;

impl SpaceSource for Preferred {
    fn space_of<'a>(&'a self, _token: &'a Node) -> Option<&'a str> {
        None
    }
}

impl Spaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exactly the spaces a render produced, one per token
    pub(crate) fn rendered(spaces: HashMap<NodeId, String>) -> Self {
        Self {
            spaces: Rc::new(spaces),
        }
    }

    /// The spaces the lexer recorded on a freshly parsed tree
    pub fn from_lexed(program: &Node) -> Self {
        let spaces = program
            .tokens()
            .into_iter()
            .filter_map(|token| {
                let space = token.as_token()?.space.clone()?;
                Some((token.id(), space))
            })
            .collect();
        Self {
            spaces: Rc::new(spaces),
        }
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    /// Space recorded before a node's first token, or "" if none is
    pub fn get_space(&self, node: &Node) -> &str {
        node.first_token()
            .and_then(|token| self.spaces.get(&token.id()))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn has_space(&self, node: &Node) -> bool {
        node.first_token().is_some_and(|token| self.spaces.contains_key(&token.id()))
    }

    fn edited(&self, edit: impl FnOnce(&mut HashMap<NodeId, String>)) -> Self {
        let mut spaces = (*self.spaces).clone();
        edit(&mut spaces);
        Self {
            spaces: Rc::new(spaces),
        }
    }

    /// Record the space before a node's first token. Empty nodes have nowhere
    /// to keep it.
    pub fn with_space(&self, node: &Node, space: impl Into<String>) -> Self {
        match node.first_token() {
            Some(token) => {
                let space = space.into();
                self.edited(|spaces| {
                    spaces.insert(token.id(), space);
                })
            }
            None => self.clone(),
        }
    }

    /// Forget the space before a node, so it renders with its preferred one
    pub fn without_space(&self, node: &Node) -> Self {
        match node.first_token() {
            Some(token) => self.edited(|spaces| {
                spaces.remove(&token.id());
            }),
            None => self.clone(),
        }
    }

    /// Carry the space before `original` over to the node replacing it
    pub fn with_replacement(&self, original: &Node, replacement: Option<&Node>) -> Self {
        let (Some(replacement), Some(from)) = (replacement, original.first_token()) else {
            return self.clone();
        };
        match self.spaces.get(&from.id()) {
            Some(space) => self.with_space(replacement, space.clone()),
            None => self.without_space(replacement),
        }
    }

    /// Give every token of `copy` the space its counterpart in `original`
    /// has in `from`
    pub fn with_copied(&self, from: &Spaces, original: &Node, copy: &Node) -> Self {
        self.edited(|spaces| {
            for (a, b) in original.tokens().iter().zip(copy.tokens()) {
                if let Some(space) = from.spaces.get(&a.id()) {
                    spaces.insert(b.id(), space.clone());
                }
            }
        })
    }

    /// Normalize against a program's preferred formatting: tokens without an
    /// entry get their preferred space, an empty space becomes the preferred
    /// one where that is not empty, and an empty space between two tokens
    /// that would lex together becomes a single space. Entries for tokens no
    /// longer in the program are dropped.
    pub fn with_preferred_space(&self, program: &Node) -> Self {
        let preferred = Serializer::new(program, &Preferred);
        let mut spaces = HashMap::new();
        let mut previous: Option<&Node> = None;

        for spaced in preferred.tokens() {
            let token = &spaced.token;
            let space = match self.spaces.get(&token.id()) {
                None => spaced.space.clone(),
                Some(space) if space.is_empty() && !spaced.space.is_empty() => spaced.space.clone(),
                Some(space) if space.is_empty() && previous.is_some_and(|p| would_merge(p.text(), token.text())) => {
                    " ".to_string()
                }
                Some(space) => space.clone(),
            };
            spaces.insert(token.id(), space);
            previous = Some(token);
        }

        Self {
            spaces: Rc::new(spaces),
        }
    }
}

impl SpaceSource for Spaces {
    fn space_of<'a>(&'a self, token: &'a Node) -> Option<&'a str> {
        self.spaces.get(&token.id()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_parser::{builders, parse, render};

    fn statements(program: &Node) -> Vec<Node> {
        program.get("block").unwrap().list("statements").unwrap().to_vec()
    }

    #[test]
    fn test_lexed_spaces_render_source() {
        let program = parse("a:  1\n\n b");
        let spaces = Spaces::from_lexed(&program);
        assert_eq!(render(&program, &spaces), "a:  1\n\n b");
        assert_eq!(spaces.get_space(&statements(&program)[1]), "\n\n ");
    }

    #[test]
    fn test_replacement_keeps_spacing() {
        let program = parse("1\n\n  2");
        let spaces = Spaces::from_lexed(&program);
        let two = statements(&program)[1].clone();
        let three = builders::number("3");

        let edited = program.replace(&two, Some(three.clone()));
        let spaces = spaces.with_replacement(&two, Some(&three));
        assert_eq!(render(&edited, &spaces), "1\n\n  3");
    }

    #[test]
    fn test_copied_spaces_follow_tokens() {
        let program = parse("[1   2]");
        let spaces = Spaces::from_lexed(&program);
        let list = statements(&program)[0].clone();
        let copy = list.duplicate();
        let copied = Spaces::new().with_copied(&spaces, &list, &copy);
        assert_eq!(copied.get_space(&copy.list("values").unwrap()[1]), "   ");
    }

    #[test]
    fn test_preferred_space_fills_gaps() {
        let program = builders::program(vec![builders::reference("a"), builders::reference("b")]);
        let spaces = Spaces::new()
            .with_space(&statements(&program)[1], "")
            .with_preferred_space(&program);
        assert_eq!(render(&program, &spaces), "a\nb");
    }

    #[test]
    fn test_preferred_space_keeps_recorded_spacing() {
        let program = parse("a:  1\n\n\nb");
        let spaces = Spaces::from_lexed(&program).with_preferred_space(&program);
        assert_eq!(render(&program, &spaces), "a:  1\n\n\nb");
    }

    #[test]
    fn test_empty_nodes_have_no_space() {
        let empty = builders::unparsable(vec![]);
        let spaces = Spaces::new().with_space(&empty, " ");
        assert!(spaces.is_empty());
        assert!(!spaces.has_space(&empty));
    }
}
