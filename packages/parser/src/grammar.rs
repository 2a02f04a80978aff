//! Declarative field grammar for every node kind
//!
//! A node's fields, in order, are exactly its render order. What a field may
//! hold, and whether it may hold nothing or many, is read from here by
//! `replace`, by the drag/drop removal policy and by autocomplete.

use crate::ast::{Node, NodeKind};
use crate::tokenizer::TokenType;

/// How many nodes a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Exactly one
    One,
    /// Zero or one
    Maybe,
    /// Zero or more
    List,
}

/// One alternative a field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepts {
    Expression,
    Type,
    Node(NodeKind),
    Token(TokenType),
    AnyToken,
}

impl Accepts {
    fn matches(self, node: &Node) -> bool {
        match self {
            Accepts::Expression => node.kind().is_expression(),
            Accepts::Type => node.kind().is_type(),
            Accepts::Node(kind) => node.kind() == kind,
            Accepts::Token(token_type) => node.is(token_type),
            Accepts::AnyToken => node.is_token(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub shape: Shape,
    pub types: &'static [Accepts],
}

impl FieldSpec {
    pub fn accepts(&self, node: &Node) -> bool {
        self.types.iter().any(|accepts| accepts.matches(node))
    }

    pub fn is_list(&self) -> bool {
        self.shape == Shape::List
    }

    /// True if the field may be left empty
    pub fn accepts_nothing(&self) -> bool {
        self.shape != Shape::One
    }

    pub fn accepts_expressions(&self) -> bool {
        self.types.contains(&Accepts::Expression)
    }

    pub fn accepts_types(&self) -> bool {
        self.types.contains(&Accepts::Type)
    }

    /// The token tag of a single-token field, if that is all it accepts
    pub fn token_type(&self) -> Option<TokenType> {
        match self.types {
            [Accepts::Token(token_type)] => Some(*token_type),
            _ => None,
        }
    }
}

const fn one(name: &'static str, types: &'static [Accepts]) -> FieldSpec {
    FieldSpec { name, shape: Shape::One, types }
}

const fn maybe(name: &'static str, types: &'static [Accepts]) -> FieldSpec {
    FieldSpec { name, shape: Shape::Maybe, types }
}

const fn list(name: &'static str, types: &'static [Accepts]) -> FieldSpec {
    FieldSpec { name, shape: Shape::List, types }
}

const EXPRESSION: &[Accepts] = &[Accepts::Expression];
const TYPE: &[Accepts] = &[Accepts::Type];

static PROGRAM: [FieldSpec; 2] = [
    one("block", &[Accepts::Node(NodeKind::Block)]),
    one("end", &[Accepts::Token(TokenType::End)]),
];

static BLOCK: [FieldSpec; 3] = [
    maybe("open", &[Accepts::Token(TokenType::EvalOpen)]),
    list("statements", EXPRESSION),
    maybe("close", &[Accepts::Token(TokenType::EvalClose)]),
];

static BIND: [FieldSpec; 5] = [
    list("names", &[Accepts::Node(NodeKind::Alias)]),
    maybe("dot", &[Accepts::Token(TokenType::Type)]),
    maybe("type", TYPE),
    maybe("colon", &[Accepts::Token(TokenType::Bind)]),
    maybe("value", EXPRESSION),
];

static ALIAS: [FieldSpec; 3] = [
    maybe("separator", &[Accepts::Token(TokenType::Alias)]),
    one("name", &[Accepts::Token(TokenType::Name)]),
    maybe("language", &[Accepts::Node(NodeKind::Language)]),
];

static LANGUAGE: [FieldSpec; 2] = [
    one("slash", &[Accepts::Token(TokenType::Language)]),
    maybe("code", &[Accepts::Token(TokenType::Name)]),
];

static FUNCTION_DEFINITION: [FieldSpec; 8] = [
    one("fun", &[Accepts::Token(TokenType::Function)]),
    list("names", &[Accepts::Node(NodeKind::Alias)]),
    one("open", &[Accepts::Token(TokenType::EvalOpen)]),
    list("inputs", &[Accepts::Node(NodeKind::Bind)]),
    maybe("close", &[Accepts::Token(TokenType::EvalClose)]),
    maybe("dot", &[Accepts::Token(TokenType::Type)]),
    maybe("output", TYPE),
    maybe("expression", EXPRESSION),
];

static EVALUATE: [FieldSpec; 4] = [
    one("func", EXPRESSION),
    one("open", &[Accepts::Token(TokenType::EvalOpen)]),
    list("inputs", EXPRESSION),
    maybe("close", &[Accepts::Token(TokenType::EvalClose)]),
];

static BINARY_OPERATION: [FieldSpec; 3] = [
    one("left", EXPRESSION),
    one("operator", &[Accepts::Token(TokenType::BinaryOp)]),
    one("right", EXPRESSION),
];

static UNARY_OPERATION: [FieldSpec; 2] = [
    one("operator", &[Accepts::Token(TokenType::UnaryOp)]),
    one("operand", EXPRESSION),
];

static CONDITIONAL: [FieldSpec; 4] = [
    one("condition", EXPRESSION),
    one("question", &[Accepts::Token(TokenType::Conditional)]),
    one("yes", EXPRESSION),
    one("no", EXPRESSION),
];

static REFERENCE: [FieldSpec; 1] = [one("name", &[Accepts::Token(TokenType::Name)])];
static NUMBER_LITERAL: [FieldSpec; 1] = [one("number", &[Accepts::Token(TokenType::Number)])];
static TEXT_LITERAL: [FieldSpec; 1] = [one("text", &[Accepts::Token(TokenType::Text)])];
static BOOLEAN_LITERAL: [FieldSpec; 1] = [one("value", &[Accepts::Token(TokenType::Boolean)])];
static NONE_LITERAL: [FieldSpec; 1] = [one("none", &[Accepts::Token(TokenType::None)])];

static LIST_LITERAL: [FieldSpec; 3] = [
    one("open", &[Accepts::Token(TokenType::ListOpen)]),
    list("values", EXPRESSION),
    maybe("close", &[Accepts::Token(TokenType::ListClose)]),
];

static EXPRESSION_PLACEHOLDER: [FieldSpec; 3] = [
    one("placeholder", &[Accepts::Token(TokenType::Placeholder)]),
    maybe("dot", &[Accepts::Token(TokenType::Type)]),
    maybe("type", TYPE),
];

static UNPARSABLE_EXPRESSION: [FieldSpec; 1] = [list("unparsables", &[Accepts::AnyToken])];

static BOOLEAN_TYPE: [FieldSpec; 1] = [one("type", &[Accepts::Token(TokenType::BooleanType)])];
static NUMBER_TYPE: [FieldSpec; 1] = [one("type", &[Accepts::Token(TokenType::NumberType)])];
static TEXT_TYPE: [FieldSpec; 1] = [one("type", &[Accepts::Token(TokenType::TextType)])];
static NONE_TYPE: [FieldSpec; 1] = [one("none", &[Accepts::Token(TokenType::NoneType)])];
static NAME_TYPE: [FieldSpec; 1] = [one("name", &[Accepts::Token(TokenType::Name)])];

static LIST_TYPE: [FieldSpec; 3] = [
    one("open", &[Accepts::Token(TokenType::ListOpen)]),
    maybe("type", TYPE),
    maybe("close", &[Accepts::Token(TokenType::ListClose)]),
];

static TYPE_PLACEHOLDER: [FieldSpec; 1] = [one("placeholder", &[Accepts::Token(TokenType::Placeholder)])];

/// Field grammar of a node kind; tokens have none
pub fn of(kind: NodeKind) -> &'static [FieldSpec] {
    match kind {
        NodeKind::Token => &[],
        NodeKind::Program => &PROGRAM,
        NodeKind::Block => &BLOCK,
        NodeKind::Bind => &BIND,
        NodeKind::Alias => &ALIAS,
        NodeKind::Language => &LANGUAGE,
        NodeKind::FunctionDefinition => &FUNCTION_DEFINITION,
        NodeKind::Evaluate => &EVALUATE,
        NodeKind::BinaryOperation => &BINARY_OPERATION,
        NodeKind::UnaryOperation => &UNARY_OPERATION,
        NodeKind::Conditional => &CONDITIONAL,
        NodeKind::Reference => &REFERENCE,
        NodeKind::NumberLiteral => &NUMBER_LITERAL,
        NodeKind::TextLiteral => &TEXT_LITERAL,
        NodeKind::BooleanLiteral => &BOOLEAN_LITERAL,
        NodeKind::NoneLiteral => &NONE_LITERAL,
        NodeKind::ListLiteral => &LIST_LITERAL,
        NodeKind::ExpressionPlaceholder => &EXPRESSION_PLACEHOLDER,
        NodeKind::UnparsableExpression => &UNPARSABLE_EXPRESSION,
        NodeKind::BooleanType => &BOOLEAN_TYPE,
        NodeKind::NumberType => &NUMBER_TYPE,
        NodeKind::TextType => &TEXT_TYPE,
        NodeKind::NoneType => &NONE_TYPE,
        NodeKind::NameType => &NAME_TYPE,
        NodeKind::ListType => &LIST_TYPE,
        NodeKind::TypePlaceholder => &TYPE_PLACEHOLDER,
    }
}

/// Space preferred before the node at `index` of field `spec` in `parent`
pub fn preferred_space(parent: &Node, spec: &FieldSpec, index: usize) -> &'static str {
    match (parent.kind(), spec.name) {
        (NodeKind::Block, "statements") if index > 0 => {
            if parent.get("open").is_none() {
                "\n"
            } else {
                " "
            }
        }
        (NodeKind::Evaluate | NodeKind::FunctionDefinition, "inputs") if index > 0 => " ",
        (NodeKind::ListLiteral, "values") if index > 0 => " ",
        (NodeKind::UnparsableExpression, "unparsables") if index > 0 => " ",
        (NodeKind::FunctionDefinition, "names") if index == 0 => " ",
        (NodeKind::Bind, "value") => " ",
        (NodeKind::FunctionDefinition, "expression") => " ",
        (NodeKind::BinaryOperation, "operator" | "right") => " ",
        (NodeKind::Conditional, "question" | "yes" | "no") => " ",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders;

    #[test]
    fn test_every_kind_has_unique_field_names() {
        for kind in [
            NodeKind::Program,
            NodeKind::Bind,
            NodeKind::FunctionDefinition,
            NodeKind::Evaluate,
            NodeKind::ListLiteral,
            NodeKind::ExpressionPlaceholder,
        ] {
            let names: Vec<&str> = of(kind).iter().map(|spec| spec.name).collect();
            let mut unique = names.clone();
            unique.dedup();
            assert_eq!(names, unique, "{:?}", kind);
        }
    }

    #[test]
    fn test_accepts() {
        let value = &of(NodeKind::Bind)[4];
        assert_eq!(value.name, "value");
        assert!(value.accepts(&builders::number("1")));
        assert!(!value.accepts(&builders::number_type()));
        assert!(value.accepts_nothing());
        assert!(!value.is_list());

        let statements = &of(NodeKind::Block)[1];
        assert!(statements.is_list() && statements.accepts_expressions());

        let output = &of(NodeKind::FunctionDefinition)[6];
        assert!(output.accepts_types() && !output.accepts_expressions());
    }

    #[test]
    fn test_token_type_of_single_token_field() {
        assert_eq!(of(NodeKind::Bind)[3].token_type(), Some(TokenType::Bind));
        assert_eq!(of(NodeKind::Bind)[4].token_type(), None);
    }
}
