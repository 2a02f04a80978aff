use crate::conflicts::Conflict;
use quill_parser::{Node, NodeId, Root};
use std::collections::HashMap;
use std::ops::Range;

/// Character ranges of every token of a freshly parsed program, computed
/// from the spaces the lexer recorded
fn token_ranges(program: &Node) -> HashMap<NodeId, Range<usize>> {
    let mut ranges = HashMap::new();
    let mut offset = 0;
    for token in program.tokens() {
        if let Some(payload) = token.as_token() {
            offset += payload.space.as_deref().map_or(0, |s| s.chars().count());
            let length = payload.text.chars().count();
            ranges.insert(token.id(), offset..offset + length);
            offset += length;
        }
    }
    ranges
}

/// Character range a node covers; empty nodes get the empty range where
/// they would start
fn node_range(root: &Root, ranges: &HashMap<NodeId, Range<usize>>, node: &Node) -> Range<usize> {
    let start = node.first_token().and_then(|t| ranges.get(&t.id())).map(|r| r.start);
    let end = node.last_token().and_then(|t| ranges.get(&t.id())).map(|r| r.end);
    match (start, end) {
        (Some(start), Some(end)) => start..end,
        _ => {
            let at = root
                .leaf_after(node)
                .and_then(|t| ranges.get(&t.id()))
                .map(|r| r.start)
                .unwrap_or(0);
            at..at
        }
    }
}

/// Pretty-print conflicts with source context using ariadne
pub fn format_conflicts(source: &str, filename: &str, program: &Node, conflicts: &[Conflict]) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let root = Root::new(program.clone());
    let ranges = token_ranges(program);
    let mut output = Vec::new();

    for conflict in conflicts {
        let span = node_range(&root, &ranges, &conflict.node);
        let report = Report::build(ReportKind::Warning, filename, span.start)
            .with_message(&conflict.message)
            .with_label(
                Label::new((filename, span))
                    .with_color(Color::Yellow)
                    .with_message(conflict.kind.to_string()),
            )
            .finish();

        if report.write((filename, Source::from(source)), &mut output).is_err() {
            break;
        }
    }

    String::from_utf8(output).unwrap_or_else(|_| "Conflict formatting failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Context;
    use quill_parser::parse;

    #[test]
    fn test_ranges_are_in_characters() {
        let program = parse("ƒ f() é");
        let ranges = token_ranges(&program);
        let tokens = program.tokens();
        assert_eq!(ranges[&tokens[4].id()], 6..7);
    }

    #[test]
    fn test_format_mentions_message() {
        let source = "a: b";
        let program = parse(source);
        let conflicts = Context::new(program.clone()).conflicts();
        let formatted = format_conflicts(source, "test.quill", &program, &conflicts);
        assert!(formatted.contains("Unknown name 'b'"));
    }
}
