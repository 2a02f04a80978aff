//! Lexer for Quill source text using logos
//!
//! Whitespace is not dropped: each run of it becomes the preceding space of
//! the next token, and a zero-length END token carries whatever trails the
//! last real token. Concatenating `space + text` for every token therefore
//! reproduces the input exactly.

use crate::ast::Node;
use logos::Logos;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

pub const PLACEHOLDER_SYMBOL: &str = "_";
pub const TYPE_SYMBOL: &str = "•";
pub const BIND_SYMBOL: &str = ":";
pub const FUNCTION_SYMBOL: &str = "ƒ";
pub const ALIAS_SYMBOL: &str = ",";
pub const LANGUAGE_SYMBOL: &str = "/";
pub const EVAL_OPEN_SYMBOL: &str = "(";
pub const EVAL_CLOSE_SYMBOL: &str = ")";
pub const LIST_OPEN_SYMBOL: &str = "[";
pub const LIST_CLOSE_SYMBOL: &str = "]";
pub const NONE_SYMBOL: &str = "ø";
pub const TRUE_SYMBOL: &str = "⊤";
pub const FALSE_SYMBOL: &str = "⊥";
pub const BOOLEAN_TYPE_SYMBOL: &str = "?";
pub const NUMBER_TYPE_SYMBOL: &str = "#";
pub const TEXT_TYPE_SYMBOL: &str = "''";

/// Token type tags. A token may carry more than one (`?` is both a
/// conditional and the boolean type, `-` is both unary and binary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenType {
    EvalOpen,
    EvalClose,
    ListOpen,
    ListClose,
    Bind,
    Type,
    Alias,
    Language,
    Function,
    Placeholder,
    Conditional,
    BooleanType,
    NumberType,
    TextType,
    NoneType,
    None,
    Boolean,
    Text,
    Number,
    UnaryOp,
    BinaryOp,
    Name,
    Unknown,
    End,
}

impl TokenType {
    pub fn name(self) -> &'static str {
        match self {
            TokenType::EvalOpen => "EVAL_OPEN",
            TokenType::EvalClose => "EVAL_CLOSE",
            TokenType::ListOpen => "LIST_OPEN",
            TokenType::ListClose => "LIST_CLOSE",
            TokenType::Bind => "BIND",
            TokenType::Type => "TYPE",
            TokenType::Alias => "ALIAS",
            TokenType::Language => "LANGUAGE",
            TokenType::Function => "FUNCTION",
            TokenType::Placeholder => "PLACEHOLDER",
            TokenType::Conditional => "CONDITIONAL",
            TokenType::BooleanType => "BOOLEAN_TYPE",
            TokenType::NumberType => "NUMBER_TYPE",
            TokenType::TextType => "TEXT_TYPE",
            TokenType::NoneType => "NONE_TYPE",
            TokenType::None => "NONE",
            TokenType::Boolean => "BOOLEAN",
            TokenType::Text => "TEXT",
            TokenType::Number => "NUMBER",
            TokenType::UnaryOp => "UNARY_OP",
            TokenType::BinaryOp => "BINARY_OP",
            TokenType::Name => "NAME",
            TokenType::Unknown => "UNKNOWN",
            TokenType::End => "END",
        }
    }
}

/// Raw lexemes produced by logos, before they are mapped to token tags
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    #[regex(r"[ \t\n\r]+")]
    Space,

    #[token("(")]
    EvalOpen,

    #[token(")")]
    EvalClose,

    #[token("[")]
    ListOpen,

    #[token("]")]
    ListClose,

    #[token(":")]
    Bind,

    #[token("•")]
    Type,

    #[token(",")]
    Alias,

    #[token("/")]
    Language,

    #[token("ƒ")]
    Function,

    #[token("_")]
    Placeholder,

    #[token("?")]
    Question,

    #[token("#")]
    Hash,

    #[token("ø")]
    None,

    #[token("⊤")]
    #[token("⊥")]
    Boolean,

    #[token("¬")]
    Not,

    #[token("-")]
    Minus,

    #[regex(r"[+×·÷%^<>≤≥=≠&|]")]
    Operator,

    #[regex(r#""[^"]*""#)]
    #[regex(r"'[^']*'")]
    Text,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r#"[^ \t\n\r()\[\]{}:•,/ƒ_?#ø⊤⊥¬+×·÷%^<>≤≥=≠&|"'0-9.\-][^ \t\n\r()\[\]{}:•,/ƒ?#ø⊤⊥¬+×·÷%^<>≤≥=≠&|"'.\-]*"#)]
    Name,
}

impl Lexeme {
    fn types(self, text: &str) -> Vec<TokenType> {
        match self {
            Lexeme::Space => Vec::new(),
            Lexeme::EvalOpen => vec![TokenType::EvalOpen],
            Lexeme::EvalClose => vec![TokenType::EvalClose],
            Lexeme::ListOpen => vec![TokenType::ListOpen],
            Lexeme::ListClose => vec![TokenType::ListClose],
            Lexeme::Bind => vec![TokenType::Bind],
            Lexeme::Type => vec![TokenType::Type],
            Lexeme::Alias => vec![TokenType::Alias],
            Lexeme::Language => vec![TokenType::Language],
            Lexeme::Function => vec![TokenType::Function],
            Lexeme::Placeholder => vec![TokenType::Placeholder],
            Lexeme::Question => vec![TokenType::Conditional, TokenType::BooleanType],
            Lexeme::Hash => vec![TokenType::NumberType],
            Lexeme::None => vec![TokenType::None, TokenType::NoneType],
            Lexeme::Boolean => vec![TokenType::Boolean],
            Lexeme::Not => vec![TokenType::UnaryOp],
            Lexeme::Minus => vec![TokenType::BinaryOp, TokenType::UnaryOp],
            Lexeme::Operator => vec![TokenType::BinaryOp],
            // Empty text doubles as the text type
            Lexeme::Text if text.chars().count() == 2 => vec![TokenType::Text, TokenType::TextType],
            Lexeme::Text => vec![TokenType::Text],
            Lexeme::Number => vec![TokenType::Number],
            Lexeme::Name => vec![TokenType::Name],
        }
    }
}

/// Number of grapheme clusters in a string
pub fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Tokenize source text into token nodes, ending with an END token
pub fn tokenize(source: &str) -> Vec<Node> {
    // (types, text, space) before allocating nodes, so that runs of
    // unrecognized characters can be merged into one UNKNOWN token.
    let mut pending: Vec<(Vec<TokenType>, String, String)> = Vec::new();
    let mut space = String::new();
    let mut lexer = Lexeme::lexer(source);

    while let Some(result) = lexer.next() {
        let slice = lexer.slice();
        match result {
            Ok(Lexeme::Space) => space.push_str(slice),
            Ok(lexeme) => {
                pending.push((lexeme.types(slice), slice.to_string(), std::mem::take(&mut space)));
            }
            Err(()) => match pending.last_mut() {
                Some((types, text, _)) if space.is_empty() && types.as_slice() == [TokenType::Unknown] => {
                    text.push_str(slice);
                }
                _ => pending.push((vec![TokenType::Unknown], slice.to_string(), std::mem::take(&mut space))),
            },
        }
    }

    let mut index = 0;
    let mut tokens = Vec::with_capacity(pending.len() + 1);
    for (types, text, space) in pending {
        index += grapheme_len(&space);
        let length = grapheme_len(&text);
        tokens.push(Node::token_at(text, &types, space, index));
        index += length;
    }
    index += grapheme_len(&space);
    tokens.push(Node::token_at("", &[TokenType::End], space, index));

    tokens
}
