use crate::ast::{Node, NodeKind};
use crate::grammar;
use crate::tokenizer::tokenize;

/// Where a serializer looks up the space recorded before a token
pub trait SpaceSource {
    /// The recorded space, or `None` if the token has never had one
    fn space_of<'a>(&'a self, token: &'a Node) -> Option<&'a str>;
}

/// Spaces recorded on tokens by the lexer
pub struct LexedSpaces;

impl SpaceSource for LexedSpaces {
    fn space_of<'a>(&'a self, token: &'a Node) -> Option<&'a str> {
        token.as_token()?.space.as_deref()
    }
}

/// A token and the space that will be rendered before it
#[derive(Debug, Clone)]
pub struct SpacedToken {
    pub token: Node,
    pub space: String,
    /// True if `space` was computed rather than recorded
    pub preferred: bool,
}

/// Serializer converts a tree back to source text
///
/// Recorded spaces are emitted verbatim, which makes `parse` then render
/// lossless. Tokens with no recorded space get the space their grammar
/// position prefers, widened to a single space if the token would otherwise
/// lex together with the one before it.
pub struct Serializer {
    tokens: Vec<SpacedToken>,
}

impl Serializer {
    pub fn new(root: &Node, spaces: &dyn SpaceSource) -> Self {
        let mut positioned = Vec::new();
        collect(root, "", &mut positioned);

        let mut tokens: Vec<SpacedToken> = Vec::with_capacity(positioned.len());
        for (index, (token, preferred)) in positioned.into_iter().enumerate() {
            // Only a whole program owns the space before its first token
            let (space, computed) = if index == 0 && root.kind() != NodeKind::Program {
                (String::new(), false)
            } else {
                match spaces.space_of(&token) {
                    Some(space) => (space.to_string(), false),
                    None => {
                        let previous = tokens.last().map(|t| t.token.text()).unwrap_or("");
                        let space = if preferred.is_empty() && would_merge(previous, token.text()) {
                            " "
                        } else {
                            preferred
                        };
                        (space.to_string(), true)
                    }
                }
            };
            tokens.push(SpacedToken {
                token,
                space,
                preferred: computed,
            });
        }

        Self { tokens }
    }

    /// Serializer using the spaces the lexer recorded on each token
    pub fn lexed(root: &Node) -> Self {
        Self::new(root, &LexedSpaces)
    }

    pub fn tokens(&self) -> &[SpacedToken] {
        &self.tokens
    }

    pub fn render(&self) -> String {
        let mut output = String::new();
        for spaced in &self.tokens {
            output.push_str(&spaced.space);
            output.push_str(spaced.token.text());
        }
        output
    }
}

/// Render a tree using the given spaces
pub fn render(root: &Node, spaces: &dyn SpaceSource) -> String {
    Serializer::new(root, spaces).render()
}

/// Tokens in order, each with the space its position prefers. A node's
/// preferred space goes to its first token unless that token's own position
/// prefers something.
fn collect(node: &Node, preferred: &'static str, out: &mut Vec<(Node, &'static str)>) {
    if node.is_token() {
        out.push((node.clone(), preferred));
        return;
    }

    let mut inherited = Some(preferred);
    for (spec, field) in node.grammar().iter().zip(node.fields()) {
        for (index, child) in field.nodes().iter().enumerate() {
            let own = grammar::preferred_space(node, spec, index);
            let space = match inherited {
                Some(outer) if own.is_empty() => outer,
                _ => own,
            };
            let before = out.len();
            collect(child, space, out);
            if out.len() > before {
                inherited = None;
            }
        }
    }
}

/// True if two token texts written with nothing between them would lex as
/// something other than the same two tokens
pub fn would_merge(left: &str, right: &str) -> bool {
    if left.is_empty() || right.is_empty() {
        return false;
    }
    let tokens = tokenize(&format!("{}{}", left, right));
    !(tokens.len() == 3 && tokens[0].text() == left && tokens[1].text() == right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders;
    use crate::parse;
    use std::collections::HashMap;

    struct Fixed(HashMap<u64, String>);

    impl SpaceSource for Fixed {
        fn space_of<'a>(&'a self, token: &'a Node) -> Option<&'a str> {
            self.0.get(&token.id()).map(String::as_str)
        }
    }

    #[test]
    fn test_lexed_render_is_lossless() {
        let source = "  a:1\n\n\tb•#: a ÷ 2  ";
        assert_eq!(Serializer::lexed(&parse(source)).render(), source);
    }

    #[test]
    fn test_lexed_spaces_only_for_lexed_tokens() {
        let program = parse(" a");
        let name = program.tokens()[0].clone();
        assert_eq!(LexedSpaces.space_of(&name), Some(" "));

        let built = builders::number("1");
        let token = built.tokens()[0].clone();
        assert_eq!(LexedSpaces.space_of(&token), None);
        assert_eq!(LexedSpaces.space_of(&built), None);
    }

    #[test]
    fn test_built_nodes_use_preferred_space() {
        let evaluate = builders::evaluate(
            builders::reference("sum"),
            vec![
                builders::placeholder_expression(Some(builders::boolean_type())),
                builders::placeholder_expression(Some(builders::boolean_type())),
            ],
        );
        assert_eq!(evaluate.to_text(), "sum(_•? _•?)");

        let bind = builders::bind("a", None, Some(builders::number("0")));
        assert_eq!(bind.to_text(), "a: 0");
    }

    #[test]
    fn test_program_statements_are_separated_by_newlines() {
        let program = builders::program(vec![builders::number("1"), builders::number("2")]);
        assert_eq!(program.to_text(), "1\n2");
    }

    #[test]
    fn test_recorded_space_wins_over_preferred() {
        let program = builders::program(vec![builders::number("1"), builders::number("2")]);
        let second = program.tokens()[1].clone();
        let spaces = Fixed(HashMap::from([(second.id(), "   ".to_string())]));
        assert_eq!(render(&program, &spaces), "1   2");
    }

    #[test]
    fn test_word_tokens_never_touch() {
        let operation = builders::unary("-", builders::reference("x"));
        assert_eq!(operation.to_text(), "-x");

        let list = builders::list(vec![builders::reference("a"), builders::reference("b")]);
        assert_eq!(list.to_text(), "[a b]");
        assert!(would_merge("a", "b"));
        assert!(would_merge("1", "2"));
        assert!(!would_merge("1", "a"));
        assert!(!would_merge("(", "a"));
    }
}
