//! Immutable, grammar-typed syntax tree
//!
//! Every [`Node`] is a reference-counted handle to frozen data. Edits never
//! mutate: [`Node::replace`] rebuilds the spine from the edited position up to
//! the receiver and shares every untouched subtree with the old tree.
//!
//! Identity and equality are distinct. Each node gets a fresh [`NodeId`] when
//! it is constructed, so two structurally equal nodes at different positions
//! are still different nodes (the whitespace map relies on this).
//! [`Node::equals`] compares structure; [`Node::same`] compares identity.

use crate::grammar::{self, FieldSpec, Shape};
use crate::id_generator::next_node_id;
use crate::serializer::Serializer;
use crate::tokenizer::TokenType;
use serde::Serialize;
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

/// Creation-order identity of a node
pub type NodeId = u64;

/// The closed set of node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Token,
    Program,
    Block,
    Bind,
    Alias,
    Language,
    FunctionDefinition,
    Evaluate,
    BinaryOperation,
    UnaryOperation,
    Conditional,
    Reference,
    NumberLiteral,
    TextLiteral,
    BooleanLiteral,
    NoneLiteral,
    ListLiteral,
    ExpressionPlaceholder,
    UnparsableExpression,
    BooleanType,
    NumberType,
    TextType,
    NoneType,
    NameType,
    ListType,
    TypePlaceholder,
}

impl NodeKind {
    pub fn is_expression(self) -> bool {
        matches!(
            self,
            NodeKind::Block
                | NodeKind::Bind
                | NodeKind::FunctionDefinition
                | NodeKind::Evaluate
                | NodeKind::BinaryOperation
                | NodeKind::UnaryOperation
                | NodeKind::Conditional
                | NodeKind::Reference
                | NodeKind::NumberLiteral
                | NodeKind::TextLiteral
                | NodeKind::BooleanLiteral
                | NodeKind::NoneLiteral
                | NodeKind::ListLiteral
                | NodeKind::ExpressionPlaceholder
                | NodeKind::UnparsableExpression
        )
    }

    pub fn is_type(self) -> bool {
        matches!(
            self,
            NodeKind::BooleanType
                | NodeKind::NumberType
                | NodeKind::TextType
                | NodeKind::NoneType
                | NodeKind::NameType
                | NodeKind::ListType
                | NodeKind::TypePlaceholder
        )
    }

    pub fn is_placeholder(self) -> bool {
        matches!(self, NodeKind::ExpressionPlaceholder | NodeKind::TypePlaceholder)
    }

    /// Binds and named functions introduce names into scope
    pub fn is_definition(self) -> bool {
        matches!(self, NodeKind::Bind | NodeKind::FunctionDefinition)
    }
}

/// Leaf payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// The one or more types this token might represent
    pub types: Vec<TokenType>,
    pub text: String,
    /// Whitespace that preceded the token when it was lexed; `None` for
    /// tokens built in code
    pub space: Option<String>,
    /// Grapheme offset at which the token started when it was lexed
    pub index: usize,
}

impl Token {
    pub fn is(&self, token_type: TokenType) -> bool {
        self.types.contains(&token_type)
    }

    /// `Types(spaceLength,index): text` with newlines and tabs escaped
    pub fn describe(&self) -> String {
        let types: Vec<&str> = self.types.iter().map(|t| t.name()).collect();
        format!(
            "{}({},{}): {}",
            types.join("/"),
            self.space.as_deref().map_or(0, |space| space.chars().count()),
            self.index,
            self.text.replace('\n', "\\n").replace('\t', "\\t")
        )
    }
}

/// Value of one grammar field
#[derive(Clone)]
pub enum Field {
    One(Node),
    Maybe(Option<Node>),
    List(Vec<Node>),
}

impl Field {
    pub fn nodes(&self) -> &[Node] {
        match self {
            Field::One(node) => std::slice::from_ref(node),
            Field::Maybe(Some(node)) => std::slice::from_ref(node),
            Field::Maybe(None) => &[],
            Field::List(list) => list,
        }
    }

    fn shape(&self) -> Shape {
        match self {
            Field::One(_) => Shape::One,
            Field::Maybe(_) => Shape::Maybe,
            Field::List(_) => Shape::List,
        }
    }
}

struct NodeData {
    id: NodeId,
    kind: NodeKind,
    token: Option<Token>,
    fields: Vec<Field>,
    children: OnceCell<Vec<Node>>,
}

/// Handle to an immutable tree node
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

impl Node {
    /// Build an interior node. `fields` must line up with the kind's grammar.
    pub fn new(kind: NodeKind, fields: Vec<Field>) -> Node {
        let grammar = grammar::of(kind);
        assert!(kind != NodeKind::Token, "tokens are built with Node::token");
        assert_eq!(fields.len(), grammar.len(), "{:?} expects {} fields", kind, grammar.len());
        debug_assert!(
            grammar.iter().zip(&fields).all(|(spec, field)| spec.shape == field.shape()),
            "{:?} field shapes do not match its grammar",
            kind
        );

        Node(Rc::new(NodeData {
            id: next_node_id(),
            kind,
            token: None,
            fields,
            children: OnceCell::new(),
        }))
    }

    /// A token with no recorded space, as built by edits
    pub fn token(text: impl Into<String>, types: &[TokenType]) -> Node {
        Node::leaf(Token {
            types: types.to_vec(),
            text: text.into(),
            space: None,
            index: 0,
        })
    }

    /// A token as lexed from text
    pub fn token_at(text: impl Into<String>, types: &[TokenType], space: impl Into<String>, index: usize) -> Node {
        Node::leaf(Token {
            types: types.to_vec(),
            text: text.into(),
            space: Some(space.into()),
            index,
        })
    }

    fn leaf(token: Token) -> Node {
        Node(Rc::new(NodeData {
            id: next_node_id(),
            kind: NodeKind::Token,
            token: Some(token),
            fields: Vec::new(),
            children: OnceCell::new(),
        }))
    }

    pub fn id(&self) -> NodeId {
        self.0.id
    }

    pub fn kind(&self) -> NodeKind {
        self.0.kind
    }

    pub fn grammar(&self) -> &'static [FieldSpec] {
        grammar::of(self.0.kind)
    }

    pub fn fields(&self) -> &[Field] {
        &self.0.fields
    }

    pub fn as_token(&self) -> Option<&Token> {
        self.0.token.as_ref()
    }

    pub fn is_token(&self) -> bool {
        self.0.token.is_some()
    }

    /// True if this is a token carrying the given tag
    pub fn is(&self, token_type: TokenType) -> bool {
        self.0.token.as_ref().is_some_and(|t| t.is(token_type))
    }

    /// Token text, or the empty string for interior nodes
    pub fn text(&self) -> &str {
        self.0.token.as_ref().map(|t| t.text.as_str()).unwrap_or("")
    }

    /// Same node, not merely an equal one
    pub fn same(&self, other: &Node) -> bool {
        self.0.id == other.0.id
    }

    /// Direct children in grammar order, computed once per node
    pub fn children(&self) -> &[Node] {
        self.0.children.get_or_init(|| {
            self.0
                .fields
                .iter()
                .flat_map(|field| field.nodes().iter().cloned())
                .collect()
        })
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.grammar()
            .iter()
            .position(|spec| spec.name == name)
            .map(|index| &self.0.fields[index])
    }

    /// The node held by a required or optional field
    pub fn get(&self, name: &str) -> Option<&Node> {
        match self.field(name)? {
            Field::One(node) => Some(node),
            Field::Maybe(node) => node.as_ref(),
            Field::List(_) => None,
        }
    }

    /// The nodes held by a list field
    pub fn list(&self, name: &str) -> Option<&[Node]> {
        match self.field(name)? {
            Field::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn field_spec(&self, name: &str) -> Option<&'static FieldSpec> {
        self.grammar().iter().find(|spec| spec.name == name)
    }

    /// Grammar field holding the given direct child
    pub fn field_of_child(&self, child: &Node) -> Option<&'static FieldSpec> {
        self.grammar()
            .iter()
            .zip(&self.0.fields)
            .find(|(_, field)| field.nodes().iter().any(|n| n.same(child)))
            .map(|(spec, _)| spec)
    }

    /// The first node held by any field after `name`
    pub fn node_after_field(&self, name: &str) -> Option<Node> {
        let index = self.grammar().iter().position(|spec| spec.name == name)?;
        self.0.fields[index + 1..]
            .iter()
            .find_map(|field| field.nodes().first().cloned())
    }

    /// This node and all of its descendants, in pre-order
    pub fn nodes(&self) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(node) = stack.pop() {
            stack.extend(node.children().iter().rev().cloned());
            nodes.push(node);
        }
        nodes
    }

    /// Leaf tokens in text order
    pub fn tokens(&self) -> Vec<Node> {
        self.nodes().into_iter().filter(|n| n.is_token()).collect()
    }

    pub fn first_token(&self) -> Option<Node> {
        if self.is_token() {
            return Some(self.clone());
        }
        self.children().iter().find_map(|child| child.first_token())
    }

    pub fn last_token(&self) -> Option<Node> {
        if self.is_token() {
            return Some(self.clone());
        }
        self.children().iter().rev().find_map(|child| child.last_token())
    }

    /// True if `node` is this node or one of its descendants
    pub fn contains(&self, node: &Node) -> bool {
        self.same(node) || self.children().iter().any(|child| child.contains(node))
    }

    /// Structural equality, ignoring identity and whitespace
    pub fn equals(&self, other: &Node) -> bool {
        if self.kind() != other.kind() {
            return false;
        }
        if let (Some(a), Some(b)) = (self.as_token(), other.as_token()) {
            return a.types == b.types && a.text == b.text;
        }
        self.0.fields.iter().zip(&other.0.fields).all(|(a, b)| {
            let (a, b) = (a.nodes(), b.nodes());
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
        })
    }

    /// Structurally identical copy where every node, tokens included, is new
    pub fn duplicate(&self) -> Node {
        if let Some(token) = self.as_token() {
            return Node::leaf(token.clone());
        }
        let fields = self
            .0
            .fields
            .iter()
            .map(|field| match field {
                Field::One(node) => Field::One(node.duplicate()),
                Field::Maybe(node) => Field::Maybe(node.as_ref().map(Node::duplicate)),
                Field::List(list) => Field::List(list.iter().map(Node::duplicate).collect()),
            })
            .collect();
        Node::new(self.kind(), fields)
    }

    /// Substitute `original` (this node or any descendant) with `replacement`.
    ///
    /// `None` removes a list element or unsets an optional field. If
    /// `original` is not in this tree, or the substitution would put a node
    /// somewhere its field does not accept it, the tree is returned unchanged.
    pub fn replace(&self, original: &Node, replacement: Option<Node>) -> Node {
        if self.same(original) {
            return replacement.unwrap_or_else(|| self.clone());
        }
        self.try_replace(original, replacement).unwrap_or_else(|| self.clone())
    }

    /// Like [`Node::replace`], but reports failure as `None`
    pub fn try_replace(&self, original: &Node, replacement: Option<Node>) -> Option<Node> {
        if let Some(node) = self.replace_child(original, replacement.clone()) {
            return Some(node);
        }
        for child in self.children() {
            if child.is_token() {
                continue;
            }
            if let Some(new_child) = child.try_replace(original, replacement.clone()) {
                return self.replace_child(child, Some(new_child));
            }
        }
        None
    }

    /// Rewrite exactly one direct child position. `None` if `original` is
    /// not a direct child or the field cannot take the replacement.
    pub fn replace_child(&self, original: &Node, replacement: Option<Node>) -> Option<Node> {
        let grammar = self.grammar();
        let index = self
            .0
            .fields
            .iter()
            .position(|field| field.nodes().iter().any(|n| n.same(original)))?;
        let spec = &grammar[index];
        if let Some(node) = &replacement {
            if !spec.accepts(node) {
                return None;
            }
        }

        let field = match (&self.0.fields[index], replacement) {
            (Field::One(_), Some(node)) => Field::One(node),
            (Field::One(_), None) => return None,
            (Field::Maybe(_), node) => Field::Maybe(node),
            (Field::List(list), node) => Field::List(
                list.iter()
                    .filter_map(|n| if n.same(original) { node.clone() } else { Some(n.clone()) })
                    .collect(),
            ),
        };

        let mut fields = self.0.fields.clone();
        fields[index] = field;
        Some(Node::new(self.kind(), fields))
    }

    /// Copy of this node with one field set. `None` if the field does not
    /// exist, has a different shape, or holds nodes it does not accept.
    pub fn with_field(&self, name: &str, value: Field) -> Option<Node> {
        let index = self.grammar().iter().position(|spec| spec.name == name)?;
        let spec = &self.grammar()[index];
        if spec.shape != value.shape() || !value.nodes().iter().all(|n| spec.accepts(n)) {
            return None;
        }
        let mut fields = self.0.fields.clone();
        fields[index] = value;
        Some(Node::new(self.kind(), fields))
    }

    pub fn with_list(&self, name: &str, list: Vec<Node>) -> Option<Node> {
        self.with_field(name, Field::List(list))
    }

    /// Text of this subtree using lexed spacing where present and preferred
    /// spacing elsewhere; the first token never gets leading space.
    pub fn to_text(&self) -> String {
        Serializer::lexed(self).render()
    }

    /// Indented outline of the subtree, one node per line
    pub fn describe(&self, depth: usize) -> String {
        let indent = "\t".repeat(depth);
        match self.as_token() {
            Some(token) => format!("{}{}", indent, token.describe()),
            None => {
                let mut lines = vec![format!("{}{:?}", indent, self.kind())];
                lines.extend(self.children().iter().map(|child| child.describe(depth + 1)));
                lines.join("\n")
            }
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_token() {
            Some(token) => write!(f, "Token#{}({:?})", self.0.id, token.text),
            None => write!(f, "{:?}#{}({:?})", self.0.kind, self.0.id, self.to_text()),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders;
    use crate::parse;

    #[test]
    fn test_children_follow_grammar_order() {
        let program = parse("a: 1");
        let bind = &program.get("block").unwrap().list("statements").unwrap()[0];
        let kinds: Vec<NodeKind> = bind.children().iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, vec![NodeKind::Alias, NodeKind::Token, NodeKind::NumberLiteral]);
    }

    #[test]
    fn test_replace_shares_untouched_subtrees() {
        let program = parse("1 + 2");
        let block = program.get("block").unwrap();
        let operation = &block.list("statements").unwrap()[0];
        let left = operation.get("left").unwrap().clone();
        let right = operation.get("right").unwrap().clone();

        let revised = program.replace(&right, Some(builders::number("3")));
        let new_operation = &revised.get("block").unwrap().list("statements").unwrap()[0];

        assert!(new_operation.get("left").unwrap().same(&left));
        assert!(!new_operation.same(operation));
        assert_eq!(revised.to_text(), "1 + 3");
        // The old tree is untouched
        assert_eq!(program.to_text(), "1 + 2");
    }

    #[test]
    fn test_replace_missing_node_is_unchanged() {
        let program = parse("1 + 2");
        let stranger = builders::number("9");
        let revised = program.replace(&stranger, Some(builders::number("3")));
        assert!(revised.same(&program));
    }

    #[test]
    fn test_replace_rejects_unaccepted_node() {
        let program = parse("1 + 2");
        let right = program.tokens()[2].clone();
        let operation = &program.get("block").unwrap().list("statements").unwrap()[0];
        let number = operation.get("right").unwrap().clone();
        assert!(number.get("number").unwrap().same(&right));

        // A type cannot stand where an expression is expected
        assert!(operation.replace_child(&number, Some(builders::number_type())).is_none());
        // A required field cannot be emptied
        assert!(operation.replace_child(&number, None).is_none());
    }

    #[test]
    fn test_replace_with_none_removes_list_element() {
        let program = parse("1\n2\n3");
        let block = program.get("block").unwrap();
        let second = block.list("statements").unwrap()[1].clone();
        let revised = program.replace(&second, None);
        assert_eq!(revised.get("block").unwrap().list("statements").unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_is_equal_but_distinct() {
        let program = parse("ƒ sum(a•? b•?) a & b");
        let copy = program.duplicate();
        assert!(copy.equals(&program));
        assert!(!copy.same(&program));
        let ids: Vec<NodeId> = program.nodes().iter().map(Node::id).collect();
        assert!(copy.nodes().iter().all(|n| !ids.contains(&n.id())));
    }

    #[test]
    fn test_node_after_field() {
        let program = parse("sum(1 2)");
        let evaluate = &program.get("block").unwrap().list("statements").unwrap()[0];
        let after = evaluate.node_after_field("inputs").unwrap();
        assert!(after.is(TokenType::EvalClose));
    }

    #[test]
    fn test_token_describe() {
        let tokens = parse("a:\n\t1").tokens();
        assert_eq!(tokens[2].as_token().unwrap().describe(), "NUMBER(2,4): 1");
    }
}
