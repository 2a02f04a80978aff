//! Constructors for freshly built nodes
//!
//! Built tokens carry no recorded space, so they render with the space their
//! grammar position prefers.

use crate::ast::{Field, Node, NodeKind};
use crate::tokenizer::*;

fn one(kind: NodeKind, token: Node) -> Node {
    Node::new(kind, vec![Field::One(token)])
}

pub fn program(statements: Vec<Node>) -> Node {
    let block = Node::new(
        NodeKind::Block,
        vec![Field::Maybe(None), Field::List(statements), Field::Maybe(None)],
    );
    Node::new(
        NodeKind::Program,
        vec![Field::One(block), Field::One(Node::token("", &[TokenType::End]))],
    )
}

/// A parenthesized block
pub fn block(statements: Vec<Node>) -> Node {
    Node::new(
        NodeKind::Block,
        vec![
            Field::Maybe(Some(Node::token(EVAL_OPEN_SYMBOL, &[TokenType::EvalOpen]))),
            Field::List(statements),
            Field::Maybe(Some(Node::token(EVAL_CLOSE_SYMBOL, &[TokenType::EvalClose]))),
        ],
    )
}

pub fn name_token(name: &str) -> Node {
    Node::token(name, &[TokenType::Name])
}

pub fn reference(name: &str) -> Node {
    one(NodeKind::Reference, name_token(name))
}

pub fn number(text: &str) -> Node {
    one(NodeKind::NumberLiteral, Node::token(text, &[TokenType::Number]))
}

/// A text literal; `text` is the unquoted content
pub fn text(text: &str) -> Node {
    let quoted = format!("\"{}\"", text);
    let types: &[TokenType] = if text.is_empty() {
        &[TokenType::Text, TokenType::TextType]
    } else {
        &[TokenType::Text]
    };
    one(NodeKind::TextLiteral, Node::token(quoted, types))
}

pub fn boolean(value: bool) -> Node {
    let symbol = if value { TRUE_SYMBOL } else { FALSE_SYMBOL };
    one(NodeKind::BooleanLiteral, Node::token(symbol, &[TokenType::Boolean]))
}

pub fn none() -> Node {
    one(
        NodeKind::NoneLiteral,
        Node::token(NONE_SYMBOL, &[TokenType::None, TokenType::NoneType]),
    )
}

pub fn list(values: Vec<Node>) -> Node {
    Node::new(
        NodeKind::ListLiteral,
        vec![
            Field::One(Node::token(LIST_OPEN_SYMBOL, &[TokenType::ListOpen])),
            Field::List(values),
            Field::Maybe(Some(Node::token(LIST_CLOSE_SYMBOL, &[TokenType::ListClose]))),
        ],
    )
}

pub fn type_dot() -> Node {
    Node::token(TYPE_SYMBOL, &[TokenType::Type])
}

pub fn bind_colon() -> Node {
    Node::token(BIND_SYMBOL, &[TokenType::Bind])
}

/// `_`, or `_•T` when a type is given
pub fn placeholder_expression(type_node: Option<Node>) -> Node {
    let dot = type_node.as_ref().map(|_| type_dot());
    Node::new(
        NodeKind::ExpressionPlaceholder,
        vec![
            Field::One(Node::token(PLACEHOLDER_SYMBOL, &[TokenType::Placeholder])),
            Field::Maybe(dot),
            Field::Maybe(type_node),
        ],
    )
}

pub fn placeholder_type() -> Node {
    one(
        NodeKind::TypePlaceholder,
        Node::token(PLACEHOLDER_SYMBOL, &[TokenType::Placeholder]),
    )
}

pub fn evaluate(func: Node, inputs: Vec<Node>) -> Node {
    Node::new(
        NodeKind::Evaluate,
        vec![
            Field::One(func),
            Field::One(Node::token(EVAL_OPEN_SYMBOL, &[TokenType::EvalOpen])),
            Field::List(inputs),
            Field::Maybe(Some(Node::token(EVAL_CLOSE_SYMBOL, &[TokenType::EvalClose]))),
        ],
    )
}

pub fn binary(left: Node, operator: &str, right: Node) -> Node {
    Node::new(
        NodeKind::BinaryOperation,
        vec![
            Field::One(left),
            Field::One(Node::token(operator, &[TokenType::BinaryOp])),
            Field::One(right),
        ],
    )
}

pub fn unary(operator: &str, operand: Node) -> Node {
    Node::new(
        NodeKind::UnaryOperation,
        vec![
            Field::One(Node::token(operator, &[TokenType::UnaryOp])),
            Field::One(operand),
        ],
    )
}

pub fn conditional(condition: Node, yes: Node, no: Node) -> Node {
    Node::new(
        NodeKind::Conditional,
        vec![
            Field::One(condition),
            Field::One(Node::token(
                BOOLEAN_TYPE_SYMBOL,
                &[TokenType::Conditional, TokenType::BooleanType],
            )),
            Field::One(yes),
            Field::One(no),
        ],
    )
}

pub fn language(code: &str) -> Node {
    Node::new(
        NodeKind::Language,
        vec![
            Field::One(Node::token(LANGUAGE_SYMBOL, &[TokenType::Language])),
            Field::Maybe(Some(name_token(code))),
        ],
    )
}

/// An alias; `separated` prefixes it with `,` for use after another alias
pub fn alias(name: &str, language_code: Option<&str>, separated: bool) -> Node {
    let separator = separated.then(|| Node::token(ALIAS_SYMBOL, &[TokenType::Alias]));
    Node::new(
        NodeKind::Alias,
        vec![
            Field::Maybe(separator),
            Field::One(name_token(name)),
            Field::Maybe(language_code.map(language)),
        ],
    )
}

/// `name•type: value`, with the type and value parts only when given
pub fn bind(name: &str, type_node: Option<Node>, value: Option<Node>) -> Node {
    let dot = type_node.as_ref().map(|_| type_dot());
    let colon = value.as_ref().map(|_| bind_colon());
    Node::new(
        NodeKind::Bind,
        vec![
            Field::List(vec![alias(name, None, false)]),
            Field::Maybe(dot),
            Field::Maybe(type_node),
            Field::Maybe(colon),
            Field::Maybe(value),
        ],
    )
}

pub fn function(name: &str, inputs: Vec<Node>, output: Option<Node>, expression: Option<Node>) -> Node {
    let dot = output.as_ref().map(|_| type_dot());
    Node::new(
        NodeKind::FunctionDefinition,
        vec![
            Field::One(Node::token(FUNCTION_SYMBOL, &[TokenType::Function])),
            Field::List(vec![alias(name, None, false)]),
            Field::One(Node::token(EVAL_OPEN_SYMBOL, &[TokenType::EvalOpen])),
            Field::List(inputs),
            Field::Maybe(Some(Node::token(EVAL_CLOSE_SYMBOL, &[TokenType::EvalClose]))),
            Field::Maybe(dot),
            Field::Maybe(output),
            Field::Maybe(expression),
        ],
    )
}

pub fn unparsable(tokens: Vec<Node>) -> Node {
    Node::new(NodeKind::UnparsableExpression, vec![Field::List(tokens)])
}

pub fn boolean_type() -> Node {
    one(
        NodeKind::BooleanType,
        Node::token(BOOLEAN_TYPE_SYMBOL, &[TokenType::Conditional, TokenType::BooleanType]),
    )
}

pub fn number_type() -> Node {
    one(NodeKind::NumberType, Node::token(NUMBER_TYPE_SYMBOL, &[TokenType::NumberType]))
}

pub fn text_type() -> Node {
    one(
        NodeKind::TextType,
        Node::token(TEXT_TYPE_SYMBOL, &[TokenType::Text, TokenType::TextType]),
    )
}

pub fn none_type() -> Node {
    one(
        NodeKind::NoneType,
        Node::token(NONE_SYMBOL, &[TokenType::None, TokenType::NoneType]),
    )
}

pub fn name_type(name: &str) -> Node {
    one(NodeKind::NameType, name_token(name))
}

pub fn list_type(item: Option<Node>) -> Node {
    Node::new(
        NodeKind::ListType,
        vec![
            Field::One(Node::token(LIST_OPEN_SYMBOL, &[TokenType::ListOpen])),
            Field::Maybe(item),
            Field::Maybe(Some(Node::token(LIST_CLOSE_SYMBOL, &[TokenType::ListClose]))),
        ],
    )
}
