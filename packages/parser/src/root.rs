//! Parent index over an immutable tree
//!
//! Nodes do not point at their parents, since a subtree is shared by every
//! tree that contains it. A `Root` indexes one particular tree so that
//! upward queries (parent, ancestors, containing list) are constant time.

use crate::ast::{Node, NodeId};
use crate::grammar::FieldSpec;
use crate::tokenizer::TokenType;
use std::collections::HashMap;

pub struct Root {
    root: Node,
    parents: HashMap<NodeId, Node>,
    nodes: HashMap<NodeId, Node>,
    tokens: Vec<Node>,
    token_index: HashMap<NodeId, usize>,
}

impl Root {
    pub fn new(root: Node) -> Self {
        let mut parents = HashMap::new();
        let mut nodes = HashMap::new();
        for node in root.nodes() {
            for child in node.children() {
                parents.insert(child.id(), node.clone());
            }
            nodes.insert(node.id(), node);
        }
        let tokens = root.tokens();
        let token_index = tokens.iter().enumerate().map(|(i, t)| (t.id(), i)).collect();

        Self {
            root,
            parents,
            nodes,
            tokens,
            token_index,
        }
    }

    pub fn node(&self) -> &Node {
        &self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.nodes.contains_key(&node.id())
    }

    pub fn parent(&self, node: &Node) -> Option<&Node> {
        self.parents.get(&node.id())
    }

    /// Ancestors of a node, nearest first
    pub fn ancestors(&self, node: &Node) -> Vec<Node> {
        let mut ancestors = Vec::new();
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            ancestors.push(parent.clone());
            current = parent;
        }
        ancestors
    }

    /// True if `ancestor` is `node` or one of its ancestors
    pub fn has_ancestor(&self, node: &Node, ancestor: &Node) -> bool {
        node.same(ancestor) || self.ancestors(node).iter().any(|a| a.same(ancestor))
    }

    /// Field of its parent that holds `node`
    pub fn field_of(&self, node: &Node) -> Option<&'static FieldSpec> {
        self.parent(node)?.field_of_child(node)
    }

    /// All tokens in text order, ending with END for programs
    pub fn tokens(&self) -> &[Node] {
        &self.tokens
    }

    pub fn token_index(&self, token: &Node) -> Option<usize> {
        self.token_index.get(&token.id()).copied()
    }

    pub fn next_token(&self, token: &Node) -> Option<&Node> {
        self.tokens.get(self.token_index(token)? + 1)
    }

    pub fn previous_token(&self, token: &Node) -> Option<&Node> {
        let index = self.token_index(token)?;
        index.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    /// The first token after the last token of `node`
    pub fn leaf_after(&self, node: &Node) -> Option<&Node> {
        match node.last_token() {
            Some(last) => self.next_token(&last),
            // Empty nodes sit before the next token of whatever follows them
            None => {
                let parent = self.parent(node)?;
                let following = parent.children().iter().skip_while(|c| !c.same(node)).skip(1);
                for child in following {
                    if let Some(first) = child.first_token() {
                        return self.token_index(&first).and_then(|i| self.tokens.get(i));
                    }
                }
                self.leaf_after(parent)
            }
        }
    }

    /// The nearest list field holding `node` or one of its ancestors, as
    /// (parent, field, element of that list)
    pub fn containing_list(&self, node: &Node) -> Option<(Node, &'static FieldSpec, Node)> {
        let mut current = node.clone();
        loop {
            let parent = self.parent(&current)?.clone();
            if let Some(spec) = parent.field_of_child(&current) {
                if spec.is_list() {
                    return Some((parent, spec, current));
                }
            }
            current = parent;
        }
    }

    /// The list field directly after (`before == false`) or directly before
    /// (`before == true`) a delimiter token, e.g. the inputs after `(`
    pub fn list_beside(&self, token: &Node, before: bool) -> Option<(Node, &'static FieldSpec)> {
        let parent = self.parent(token)?;
        let grammar = parent.grammar();
        let index = grammar.iter().position(|spec| {
            parent
                .field(spec.name)
                .is_some_and(|field| field.nodes().iter().any(|n| n.same(token)))
        })?;
        let neighbor = if before {
            index.checked_sub(1).and_then(|i| grammar.get(i))
        } else {
            grammar.get(index + 1)
        };
        neighbor
            .filter(|spec| spec.is_list())
            .map(|spec| (parent.clone(), spec))
    }

    /// True if this tree is a program and `token` is its END token
    pub fn is_end(&self, token: &Node) -> bool {
        token.is(TokenType::End) && self.parent(token).is_some_and(|p| p.same(&self.root))
    }
}
