pub mod ast;
pub mod builders;
pub mod grammar;
pub mod id_generator;
pub mod parser;
pub mod root;
pub mod serializer;
pub mod tokenizer;

pub use ast::{Field, Node, NodeId, NodeKind, Token};
pub use grammar::{Accepts, FieldSpec, Shape};
pub use parser::{parse, parse_expression, parse_type, Parser};
pub use root::Root;
pub use serializer::{render, LexedSpaces, Serializer, SpaceSource, SpacedToken};
pub use tokenizer::{grapheme_len, tokenize, TokenType};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizer_basic() {
        let tokens = tokenize("a: 1");
        assert_eq!(tokens.len(), 4);
    }
}
