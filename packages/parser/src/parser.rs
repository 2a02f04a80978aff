//! Total recursive-descent parser
//!
//! Every token sequence parses. Tokens that cannot begin an expression become
//! single-token `UnparsableExpression`s, and operands that are missing become
//! empty ones, so the resulting tree always renders back to the exact text it
//! was parsed from.

use crate::ast::{Field, Node, NodeKind};
use crate::tokenizer::{tokenize, TokenType};

/// Parser for Quill source
pub struct Parser {
    tokens: Vec<Node>,
    pos: usize,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self::from_tokens(tokenize(source))
    }

    /// Parse already lexed tokens. An END token is appended if missing.
    pub fn from_tokens(mut tokens: Vec<Node>) -> Self {
        if !tokens.last().is_some_and(|t| t.is(TokenType::End)) {
            tokens.push(Node::token("", &[TokenType::End]));
        }
        Self { tokens, pos: 0 }
    }

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Node {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            statements.push(self.parse_expression());
        }
        let block = Node::new(
            NodeKind::Block,
            vec![Field::Maybe(None), Field::List(statements), Field::Maybe(None)],
        );
        let end = self.advance();
        Node::new(NodeKind::Program, vec![Field::One(block), Field::One(end)])
    }

    /// Parse one expression, including any trailing binary operations and
    /// conditional
    pub fn parse_expression(&mut self) -> Node {
        let mut left = self.parse_operand();
        loop {
            if self.check(TokenType::BinaryOp) {
                let operator = self.advance();
                let right = self.parse_operand_or_missing();
                left = Node::new(
                    NodeKind::BinaryOperation,
                    vec![Field::One(left), Field::One(operator), Field::One(right)],
                );
            } else if self.check(TokenType::Conditional) {
                let question = self.advance();
                let yes = self.parse_expression_or_missing();
                let no = self.parse_expression_or_missing();
                return Node::new(
                    NodeKind::Conditional,
                    vec![Field::One(left), Field::One(question), Field::One(yes), Field::One(no)],
                );
            } else {
                return left;
            }
        }
    }

    /// Parse a type
    pub fn parse_type(&mut self) -> Node {
        let token = self.peek().clone();
        if token.is(TokenType::BooleanType) {
            self.leaf(NodeKind::BooleanType)
        } else if token.is(TokenType::NumberType) {
            self.leaf(NodeKind::NumberType)
        } else if token.is(TokenType::TextType) {
            self.leaf(NodeKind::TextType)
        } else if token.is(TokenType::NoneType) {
            self.leaf(NodeKind::NoneType)
        } else if token.is(TokenType::Placeholder) {
            self.leaf(NodeKind::TypePlaceholder)
        } else if token.is(TokenType::ListOpen) {
            let open = self.advance();
            let item = if self.can_start_type() { Some(self.parse_type()) } else { None };
            let close = self.match_token(TokenType::ListClose);
            Node::new(
                NodeKind::ListType,
                vec![Field::One(open), Field::Maybe(item), Field::Maybe(close)],
            )
        } else {
            // Callers only ask for a type where one can start
            debug_assert!(token.is(TokenType::Name));
            self.leaf(NodeKind::NameType)
        }
    }

    fn parse_expression_or_missing(&mut self) -> Node {
        if self.can_start_expression() {
            self.parse_expression()
        } else {
            missing()
        }
    }

    fn parse_operand_or_missing(&mut self) -> Node {
        if self.can_start_expression() {
            self.parse_operand()
        } else {
            missing()
        }
    }

    /// An atom followed by any number of evaluations
    fn parse_operand(&mut self) -> Node {
        let mut expression = self.parse_atom();
        while self.check(TokenType::EvalOpen) && self.peek_space().is_empty() {
            let open = self.advance();
            let inputs = self.parse_until(TokenType::EvalClose);
            let close = self.match_token(TokenType::EvalClose);
            expression = Node::new(
                NodeKind::Evaluate,
                vec![
                    Field::One(expression),
                    Field::One(open),
                    Field::List(inputs),
                    Field::Maybe(close),
                ],
            );
        }
        expression
    }

    fn parse_atom(&mut self) -> Node {
        let token = self.peek().clone();

        if token.is(TokenType::Name) {
            return if self.starts_bind() {
                self.parse_bind()
            } else {
                self.leaf(NodeKind::Reference)
            };
        }
        if token.is(TokenType::Number) {
            return self.leaf(NodeKind::NumberLiteral);
        }
        if token.is(TokenType::Text) {
            return self.leaf(NodeKind::TextLiteral);
        }
        if token.is(TokenType::Boolean) {
            return self.leaf(NodeKind::BooleanLiteral);
        }
        if token.is(TokenType::None) {
            return self.leaf(NodeKind::NoneLiteral);
        }
        if token.is(TokenType::Placeholder) {
            let placeholder = self.advance();
            let (dot, type_node) = self.parse_type_annotation();
            return Node::new(
                NodeKind::ExpressionPlaceholder,
                vec![Field::One(placeholder), Field::Maybe(dot), Field::Maybe(type_node)],
            );
        }
        if token.is(TokenType::EvalOpen) {
            let open = self.advance();
            let statements = self.parse_until(TokenType::EvalClose);
            let close = self.match_token(TokenType::EvalClose);
            return Node::new(
                NodeKind::Block,
                vec![Field::Maybe(Some(open)), Field::List(statements), Field::Maybe(close)],
            );
        }
        if token.is(TokenType::ListOpen) {
            let open = self.advance();
            let values = self.parse_until(TokenType::ListClose);
            let close = self.match_token(TokenType::ListClose);
            return Node::new(
                NodeKind::ListLiteral,
                vec![Field::One(open), Field::List(values), Field::Maybe(close)],
            );
        }
        if token.is(TokenType::Function) {
            return self.parse_function();
        }
        if token.is(TokenType::UnaryOp) {
            let operator = self.advance();
            let operand = self.parse_operand_or_missing();
            return Node::new(
                NodeKind::UnaryOperation,
                vec![Field::One(operator), Field::One(operand)],
            );
        }

        let token = self.advance();
        Node::new(NodeKind::UnparsableExpression, vec![Field::List(vec![token])])
    }

    /// Expressions up to, but not including, `close` or the end
    fn parse_until(&mut self, close: TokenType) -> Vec<Node> {
        let mut nodes = Vec::new();
        while !self.is_at_end() && !self.check(close) {
            nodes.push(self.parse_expression());
        }
        nodes
    }

    /// A name followed by an alias, language, type or bind symbol
    fn starts_bind(&self) -> bool {
        self.peek_at(1).is_some_and(|next| {
            next.is(TokenType::Bind)
                || next.is(TokenType::Type)
                || next.is(TokenType::Alias)
                || next.is(TokenType::Language)
        })
    }

    fn parse_bind(&mut self) -> Node {
        let names = self.parse_aliases();
        let (dot, type_node) = self.parse_type_annotation();
        let colon = self.match_token(TokenType::Bind);
        let value = if colon.is_some() && self.can_start_expression() {
            Some(self.parse_expression())
        } else {
            None
        };
        Node::new(
            NodeKind::Bind,
            vec![
                Field::List(names),
                Field::Maybe(dot),
                Field::Maybe(type_node),
                Field::Maybe(colon),
                Field::Maybe(value),
            ],
        )
    }

    /// `•` and the type after it, if present
    fn parse_type_annotation(&mut self) -> (Option<Node>, Option<Node>) {
        let dot = self.match_token(TokenType::Type);
        let type_node = if dot.is_some() && self.can_start_type() {
            Some(self.parse_type())
        } else {
            None
        };
        (dot, type_node)
    }

    fn parse_aliases(&mut self) -> Vec<Node> {
        let mut aliases = Vec::new();
        if self.check(TokenType::Name) {
            aliases.push(self.parse_alias(None));
        }
        while !aliases.is_empty()
            && self.check(TokenType::Alias)
            && self.peek_at(1).is_some_and(|next| next.is(TokenType::Name))
        {
            let separator = self.advance();
            aliases.push(self.parse_alias(Some(separator)));
        }
        aliases
    }

    fn parse_alias(&mut self, separator: Option<Node>) -> Node {
        let name = self.advance();
        let language = self.match_token(TokenType::Language).map(|slash| {
            let code = self.match_token(TokenType::Name);
            Node::new(NodeKind::Language, vec![Field::One(slash), Field::Maybe(code)])
        });
        Node::new(
            NodeKind::Alias,
            vec![Field::Maybe(separator), Field::One(name), Field::Maybe(language)],
        )
    }

    fn parse_function(&mut self) -> Node {
        let fun = self.advance();
        let names = self.parse_aliases();

        let Some(open) = self.match_token(TokenType::EvalOpen) else {
            // Without an input list there is no function to build
            let mut tokens = vec![fun];
            tokens.extend(names.iter().flat_map(Node::tokens));
            return Node::new(NodeKind::UnparsableExpression, vec![Field::List(tokens)]);
        };

        let mut inputs = Vec::new();
        while self.check(TokenType::Name) {
            inputs.push(self.parse_bind());
        }
        let close = self.match_token(TokenType::EvalClose);
        let (dot, output) = self.parse_type_annotation();
        let expression = if self.can_start_expression() {
            Some(self.parse_expression())
        } else {
            None
        };

        Node::new(
            NodeKind::FunctionDefinition,
            vec![
                Field::One(fun),
                Field::List(names),
                Field::One(open),
                Field::List(inputs),
                Field::Maybe(close),
                Field::Maybe(dot),
                Field::Maybe(output),
                Field::Maybe(expression),
            ],
        )
    }

    /// Wrap the next token in a single-field node
    fn leaf(&mut self, kind: NodeKind) -> Node {
        let token = self.advance();
        Node::new(kind, vec![Field::One(token)])
    }

    fn can_start_expression(&self) -> bool {
        let token = self.peek();
        [
            TokenType::Name,
            TokenType::Number,
            TokenType::Text,
            TokenType::Boolean,
            TokenType::None,
            TokenType::Placeholder,
            TokenType::EvalOpen,
            TokenType::ListOpen,
            TokenType::Function,
            TokenType::UnaryOp,
        ]
        .into_iter()
        .any(|t| token.is(t))
    }

    fn can_start_type(&self) -> bool {
        let token = self.peek();
        [
            TokenType::BooleanType,
            TokenType::NumberType,
            TokenType::TextType,
            TokenType::NoneType,
            TokenType::Placeholder,
            TokenType::ListOpen,
            TokenType::Name,
        ]
        .into_iter()
        .any(|t| token.is(t))
    }

    // Helper methods

    fn peek(&self) -> &Node {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, offset: usize) -> Option<&Node> {
        self.tokens.get(self.pos + offset)
    }

    fn peek_space(&self) -> &str {
        self.peek().as_token().and_then(|t| t.space.as_deref()).unwrap_or("")
    }

    fn check(&self, token_type: TokenType) -> bool {
        self.peek().is(token_type)
    }

    fn is_at_end(&self) -> bool {
        self.check(TokenType::End)
    }

    /// Consume the next token. The END token is never consumed past.
    fn advance(&mut self) -> Node {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn match_token(&mut self, token_type: TokenType) -> Option<Node> {
        if self.check(token_type) {
            Some(self.advance())
        } else {
            None
        }
    }
}

fn missing() -> Node {
    Node::new(NodeKind::UnparsableExpression, vec![Field::List(Vec::new())])
}

/// Parse source text into a Program node
pub fn parse(source: &str) -> Node {
    Parser::new(source).parse_program()
}

/// Parse text holding a single expression. Anything after the first
/// expression is ignored.
pub fn parse_expression(source: &str) -> Node {
    Parser::new(source).parse_expression_or_missing()
}

/// Parse text holding a single type, or `None` if it does not start one
pub fn parse_type(source: &str) -> Option<Node> {
    let mut parser = Parser::new(source);
    parser.can_start_type().then(|| parser.parse_type())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statements(source: &str) -> Vec<Node> {
        parse(source).get("block").unwrap().list("statements").unwrap().to_vec()
    }

    fn kinds(source: &str) -> Vec<NodeKind> {
        statements(source).iter().map(Node::kind).collect()
    }

    #[test]
    fn test_parse_bind() {
        let bind = &statements("a•#: 1")[0];
        assert_eq!(bind.kind(), NodeKind::Bind);
        assert_eq!(bind.list("names").unwrap()[0].get("name").unwrap().text(), "a");
        assert_eq!(bind.get("type").unwrap().kind(), NodeKind::NumberType);
        assert_eq!(bind.get("value").unwrap().kind(), NodeKind::NumberLiteral);
    }

    #[test]
    fn test_parse_bind_without_value() {
        let bind = &statements("a:")[0];
        assert_eq!(bind.kind(), NodeKind::Bind);
        assert!(bind.get("colon").is_some());
        assert!(bind.get("value").is_none());
    }

    #[test]
    fn test_parse_aliases_with_languages() {
        let bind = &statements("hi/en,hola/es: 1")[0];
        let names = bind.list("names").unwrap();
        assert_eq!(names.len(), 2);
        assert!(names[1].get("separator").is_some());
        let language = names[1].get("language").unwrap();
        assert_eq!(language.get("code").unwrap().text(), "es");
    }

    #[test]
    fn test_parse_function() {
        let function = &statements("ƒ sum(a•? b•?) a & b")[0];
        assert_eq!(function.kind(), NodeKind::FunctionDefinition);
        assert_eq!(function.list("inputs").unwrap().len(), 2);
        assert!(function.get("close").is_some());
        assert_eq!(function.get("expression").unwrap().kind(), NodeKind::BinaryOperation);
    }

    #[test]
    fn test_function_without_inputs_is_unparsable() {
        let node = &statements("ƒ sum")[0];
        assert_eq!(node.kind(), NodeKind::UnparsableExpression);
        assert_eq!(node.list("unparsables").unwrap().len(), 2);
    }

    #[test]
    fn test_evaluate_requires_adjacent_paren() {
        assert_eq!(kinds("sum(1 2)"), vec![NodeKind::Evaluate]);
        assert_eq!(kinds("sum (1 2)"), vec![NodeKind::Reference, NodeKind::Block]);
    }

    #[test]
    fn test_binary_operations_are_left_associative() {
        let operation = &statements("1 + 2 · 3")[0];
        assert_eq!(operation.kind(), NodeKind::BinaryOperation);
        assert_eq!(operation.get("left").unwrap().kind(), NodeKind::BinaryOperation);
        assert_eq!(operation.get("right").unwrap().text(), "");
        assert_eq!(operation.get("right").unwrap().to_text(), "3");
    }

    #[test]
    fn test_conditional() {
        let conditional = &statements("⊤ ? 1 2")[0];
        assert_eq!(conditional.kind(), NodeKind::Conditional);
        assert_eq!(conditional.get("no").unwrap().to_text(), "2");
    }

    #[test]
    fn test_missing_operand_is_empty_unparsable() {
        let operation = &statements("1 +")[0];
        let right = operation.get("right").unwrap();
        assert_eq!(right.kind(), NodeKind::UnparsableExpression);
        assert!(right.list("unparsables").unwrap().is_empty());
    }

    #[test]
    fn test_stray_tokens_are_unparsable() {
        assert_eq!(
            kinds("1 ) {"),
            vec![
                NodeKind::NumberLiteral,
                NodeKind::UnparsableExpression,
                NodeKind::UnparsableExpression
            ]
        );
    }

    #[test]
    fn test_unterminated_delimiters() {
        let list = &statements("[1 2")[0];
        assert_eq!(list.kind(), NodeKind::ListLiteral);
        assert_eq!(list.list("values").unwrap().len(), 2);
        assert!(list.get("close").is_none());
    }

    #[test]
    fn test_placeholders() {
        let placeholder = &statements("_•[#]")[0];
        assert_eq!(placeholder.kind(), NodeKind::ExpressionPlaceholder);
        assert_eq!(placeholder.get("type").unwrap().kind(), NodeKind::ListType);
    }

    #[test]
    fn test_parse_type() {
        assert_eq!(parse_type("''").unwrap().kind(), NodeKind::TextType);
        assert!(parse_type("1").is_none());
    }

    #[test]
    fn test_round_trip_preserves_text() {
        for source in [
            "",
            "  \n",
            "a: 1\nb: a + 2\n",
            "ƒ sum(a•? b•?) a & b\ns",
            "x•[#]: [1 2 3]",
            "(1 + ) ? ¬⊤ ø",
            "ƒ f(a•#:1) a·2",
            "a {}. b ]] )",
        ] {
            assert_eq!(parse(source).to_text(), source);
        }
    }
}
