//! What each position in a tree can take
//!
//! Given a parent and one of its children, these answer which transforms
//! are legal: what the child could be replaced with, what could go right
//! before or after it, and how it could be removed. Legality comes from the
//! parent's grammar; candidates are narrowed by the type the position
//! expects and the definitions in scope there.

use crate::source::Source;
use crate::transform::{Action, Candidate, Transform};
use quill_inference::{preferred_name, Context, Scope, Type};
use quill_parser::{builders, FieldSpec, Node, NodeKind, Shape};
use std::rc::Rc;

/// What becomes of the place a node leaves
#[derive(Debug, Clone)]
pub enum Removal {
    /// Remove the list element or unset the optional field
    Vacate,
    /// Leave a placeholder behind
    Replace(Node),
    /// Nothing can stand in for it
    Keep,
}

/// List or optional fields are vacated; required expression fields get an
/// expression placeholder of the removed node's type; required type fields
/// get a type placeholder.
pub fn removal_policy(context: &Context, parent: &Node, child: &Node) -> Removal {
    let Some(spec) = parent.field_of_child(child) else {
        return Removal::Keep;
    };
    if spec.accepts_nothing() {
        Removal::Vacate
    } else {
        stand_in(context, spec, child).map_or(Removal::Keep, Removal::Replace)
    }
}

/// A placeholder that can hold `child`'s place in a field like `spec`
pub fn stand_in(context: &Context, spec: &FieldSpec, child: &Node) -> Option<Node> {
    if child.kind().is_expression() && spec.accepts_expressions() {
        let typed = context.type_of(child).to_node();
        Some(builders::placeholder_expression(typed))
    } else if spec.accepts_types() {
        Some(builders::placeholder_type())
    } else {
        None
    }
}

/// How backspace removes a selected child. Delimiters and markers are not
/// removed structurally, nor is the last name of a definition.
pub fn child_removal(source: &Source, parent: &Node, child: &Node) -> Option<Transform> {
    if child.is_token() || is_last_name(parent, child) {
        return None;
    }
    match removal_policy(&source.context(), parent, child) {
        Removal::Vacate => Some(Transform::remove(source, parent, child)),
        // A placeholder replaced by a placeholder is no edit
        Removal::Replace(_) if child.kind().is_placeholder() => None,
        Removal::Replace(placeholder) => Some(Transform::replace(source, child, Candidate::Node(placeholder))),
        Removal::Keep => None,
    }
}

fn is_last_name(parent: &Node, child: &Node) -> bool {
    matches!(parent.kind(), NodeKind::Bind | NodeKind::FunctionDefinition)
        && parent
            .list("names")
            .is_some_and(|names| names.len() == 1 && names[0].same(child))
}

/// Everything `child` could be replaced with. With a `prefix`, definitions
/// are only offered if their name starts with it.
pub fn child_replacement(
    source: &Source,
    parent: &Node,
    child: &Node,
    prefix: Option<&str>,
    locales: &[String],
) -> Vec<Transform> {
    let Some(spec) = parent.field_of_child(child) else {
        return Vec::new();
    };
    let context = source.context();
    let candidates = if spec.accepts_expressions() {
        let expected = context.expected_type(child).unwrap_or(Type::Unknown);
        expression_candidates(&context, &context.scope_of(child), &expected, prefix, locales)
    } else if spec.accepts_types() {
        type_candidates()
    } else {
        Vec::new()
    };

    candidates
        .into_iter()
        .filter(|candidate| {
            candidate
                .materialize(locales)
                .is_some_and(|node| spec.accepts(&node) && !node.equals(child))
        })
        .map(|candidate| Transform::replace(source, child, candidate))
        .collect()
}

/// `(child)`, for expressions that are not already placeholders
pub fn wrap(source: &Source, parent: &Node, child: &Node) -> Option<Transform> {
    let kind = child.kind();
    let spec = parent.field_of_child(child)?;
    let wrappable = kind.is_expression() && !kind.is_definition() && !kind.is_placeholder();
    (wrappable && spec.accepts_expressions())
        .then(|| Transform::replace(source, child, Candidate::Wrap(child.clone())))
}

/// Transforms that put something immediately before `child`
pub fn insertion_before(source: &Source, parent: &Node, child: &Node, locales: &[String]) -> Vec<Transform> {
    let root = source.root();

    // The end of a program is the end of its statements
    if root.is_end(child) {
        let Some(block) = parent.get("block") else {
            return Vec::new();
        };
        let length = block.list("statements").map_or(0, <[Node]>::len);
        return list_transforms(source, block, "statements", length, false, locales);
    }

    let Some(spec) = parent.field_of_child(child) else {
        return Vec::new();
    };
    if spec.is_list() {
        let index = parent
            .list(spec.name)
            .and_then(|list| list.iter().position(|n| n.same(child)))
            .unwrap_or(0);
        return list_transforms(source, parent, spec.name, index, true, locales);
    }
    // Right before a closing delimiter is the end of the list it closes
    if child.is_token() {
        if let Some((owner, list)) = root.list_beside(child, true) {
            let length = owner.list(list.name).map_or(0, <[Node]>::len);
            return list_transforms(source, &owner, list.name, length, false, locales);
        }
    }
    Vec::new()
}

/// Transforms that put something immediately after `child`: the next list
/// slot if it is in a list, then the optional fields that follow it up to
/// the next one with content
pub fn insertion_after(source: &Source, parent: &Node, child: &Node, locales: &[String]) -> Vec<Transform> {
    let grammar = parent.grammar();
    let Some(position) = grammar.iter().position(|spec| {
        parent
            .field(spec.name)
            .is_some_and(|field| field.nodes().iter().any(|n| n.same(child)))
    }) else {
        return Vec::new();
    };

    let mut transforms = Vec::new();
    let spec = &grammar[position];
    if spec.is_list() {
        let index = parent
            .list(spec.name)
            .and_then(|list| list.iter().position(|n| n.same(child)))
            .map_or(0, |i| i + 1);
        transforms.extend(list_transforms(source, parent, spec.name, index, false, locales));
    }

    for next in &grammar[position + 1..] {
        let filled = parent.field(next.name).is_some_and(|field| !field.nodes().is_empty());
        match next.shape {
            Shape::Maybe if !filled => {
                transforms.extend(assignments(source, parent, next, locales));
            }
            Shape::List => {
                transforms.extend(list_transforms(source, parent, next.name, 0, false, locales));
                break;
            }
            _ => break,
        }
    }
    transforms
}

fn assignments(source: &Source, parent: &Node, spec: &'static FieldSpec, locales: &[String]) -> Vec<Transform> {
    let candidates: Vec<Candidate> = if parent.kind() == NodeKind::Alias && spec.name == "language" {
        locales
            .iter()
            .map(|locale| Candidate::Node(builders::language(locale)))
            .collect()
    } else if spec.accepts_expressions() {
        let context = source.context();
        let expected = context.expected_field_type(parent, spec.name, 0);
        let scope = scope_at(&context, parent, spec.name, 0);
        expression_candidates(&context, &scope, &expected, None, locales)
    } else if spec.accepts_types() {
        type_candidates()
    } else {
        Vec::new()
    };

    candidates
        .into_iter()
        .map(|candidate| {
            Transform::new(
                source.clone(),
                Action::Assign {
                    parent: parent.clone(),
                    field: spec.name,
                    candidate,
                },
            )
        })
        .collect()
}

/// Candidates for slot `index` of a list field, as inserts before an
/// existing element or appends
fn list_transforms(
    source: &Source,
    parent: &Node,
    field: &'static str,
    index: usize,
    before_element: bool,
    locales: &[String],
) -> Vec<Transform> {
    let Some(spec) = parent.field_spec(field) else {
        return Vec::new();
    };
    let context = source.context();
    let candidates = if spec.accepts_expressions() {
        let expected = context.expected_field_type(parent, field, index);
        let scope = scope_at(&context, parent, field, index);
        expression_candidates(&context, &scope, &expected, None, locales)
    } else if spec.accepts_types() {
        type_candidates()
    } else {
        Vec::new()
    };

    candidates
        .into_iter()
        .map(|candidate| {
            let parent = parent.clone();
            let action = if before_element {
                Action::Insert {
                    parent,
                    field,
                    index,
                    candidate,
                }
            } else {
                Action::Append {
                    parent,
                    field,
                    index,
                    candidate,
                }
            };
            Transform::new(source.clone(), action)
        })
        .collect()
}

/// Definitions visible to a node placed at `index` of `field`
fn scope_at(context: &Context, parent: &Node, field: &str, index: usize) -> Rc<Scope> {
    let mut scope = Scope::with_parent(context.scope_of(parent));
    match (parent.kind(), field) {
        (NodeKind::Block, "statements") => {
            for (position, statement) in parent.list("statements").unwrap_or(&[]).iter().enumerate() {
                let hoisted = statement.kind() == NodeKind::FunctionDefinition;
                if hoisted || (position < index && statement.kind() == NodeKind::Bind) {
                    scope.define(statement);
                }
            }
        }
        (NodeKind::FunctionDefinition, _) => {
            for (position, input) in parent.list("inputs").unwrap_or(&[]).iter().enumerate() {
                if field != "inputs" || position < index {
                    scope.define(input);
                }
            }
        }
        _ => {}
    }
    Rc::new(scope)
}

/// Expressions that fit where `expected` is expected
fn expression_candidates(
    context: &Context,
    scope: &Scope,
    expected: &Type,
    prefix: Option<&str>,
    locales: &[String],
) -> Vec<Candidate> {
    let mut candidates = vec![Candidate::Node(builders::placeholder_expression(expected.to_node()))];

    let literals = [
        (Type::Number, builders::number("0")),
        (Type::Text, builders::text("")),
        (Type::Boolean, builders::boolean(true)),
        (Type::Boolean, builders::boolean(false)),
        (Type::None, builders::none()),
        (Type::List(Box::new(Type::Unknown)), builders::list(Vec::new())),
    ];
    candidates.extend(
        literals
            .into_iter()
            .filter(|(literal, _)| expected.accepts(literal))
            .map(|(_, node)| Candidate::Node(node)),
    );

    for definition in scope.collect_all() {
        let named = preferred_name(&definition, locales)
            .is_some_and(|name| prefix.map_or(true, |prefix| name.starts_with(prefix)));
        if !named {
            continue;
        }
        match definition.kind() {
            NodeKind::Bind => {
                if expected.accepts(&context.type_of(&definition)) {
                    candidates.push(Candidate::Reference { definition });
                }
            }
            NodeKind::FunctionDefinition => {
                let function = context.function_type(&definition);
                if expected.accepts(&function.output) {
                    candidates.push(Candidate::Evaluate {
                        definition,
                        inputs: function.inputs,
                    });
                }
            }
            _ => {}
        }
    }
    candidates
}

fn type_candidates() -> Vec<Candidate> {
    vec![
        Candidate::Node(builders::placeholder_type()),
        Candidate::Node(builders::number_type()),
        Candidate::Node(builders::text_type()),
        Candidate::Node(builders::boolean_type()),
        Candidate::Node(builders::none_type()),
        Candidate::Node(builders::list_type(None)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TransformKind;
    use quill_parser::TokenType;

    fn en() -> Vec<String> {
        vec!["en".to_string()]
    }

    fn find(source: &Source, text: &str, kind: NodeKind) -> Node {
        source
            .nodes()
            .into_iter()
            .find(|n| n.kind() == kind && n.to_text() == text)
            .unwrap()
    }

    fn texts(transforms: &[Transform]) -> Vec<String> {
        transforms.iter().map(|t| t.text(&en())).collect()
    }

    #[test]
    fn test_removal_policy() {
        let source = Source::new("main", "a•#: 1 + 2\n[3]");
        let context = source.context();

        let three = find(&source, "3", NodeKind::NumberLiteral);
        let list = source.root().parent(&three).unwrap();
        assert!(matches!(removal_policy(&context, list, &three), Removal::Vacate));

        let two = find(&source, "2", NodeKind::NumberLiteral);
        let operation = source.root().parent(&two).unwrap();
        match removal_policy(&context, operation, &two) {
            Removal::Replace(placeholder) => assert_eq!(placeholder.to_text(), "_•#"),
            other => panic!("expected a placeholder, got {:?}", other),
        }

        let program = source.program();
        let end = program.get("end").unwrap();
        assert!(matches!(removal_policy(&context, program, end), Removal::Keep));
    }

    #[test]
    fn test_typed_replacements() {
        let source = Source::new("main", "b: ⊤\nc: 1\n1 + 2");
        let two = find(&source, "2", NodeKind::NumberLiteral);
        let parent = source.root().parent(&two).unwrap();
        let offered = texts(&child_replacement(&source, parent, &two, None, &en()));
        assert!(offered.contains(&"c".to_string()));
        assert!(offered.contains(&"0".to_string()));
        assert!(offered.contains(&"_•#".to_string()));
        assert!(!offered.contains(&"b".to_string()));
        assert!(!offered.contains(&"⊤".to_string()));
    }

    #[test]
    fn test_prefix_filters_definitions() {
        let source = Source::new("main", "sum: 1\nsize: 2\nother: 3\ns");
        let s = find(&source, "s", NodeKind::Reference);
        let block = source.root().parent(&s).unwrap();
        let offered = texts(&child_replacement(&source, block, &s, Some("s"), &en()));
        assert!(offered.contains(&"sum".to_string()));
        assert!(offered.contains(&"size".to_string()));
        assert!(!offered.contains(&"other".to_string()));
    }

    #[test]
    fn test_insertions_into_lists() {
        let source = Source::new("main", "[1 2]");
        let two = find(&source, "2", NodeKind::NumberLiteral);
        let list = source.root().parent(&two).unwrap().clone();

        let before = insertion_before(&source, &list, &two, &en());
        assert!(before.iter().all(|t| t.kind() == TransformKind::Insert));

        let after = insertion_after(&source, &list, &two, &en());
        assert!(after.iter().all(|t| t.kind() == TransformKind::Append));
        let edit = after.iter().find(|t| t.text(&en()) == "0").unwrap().edit(&en()).unwrap();
        assert_eq!(edit.source.code().as_str(), "[1 2 0]");

        let close = list.get("close").unwrap();
        let appended = insertion_before(&source, &list, close, &en());
        assert_eq!(appended[0].kind(), TransformKind::Append);
    }

    #[test]
    fn test_assignments_after_placeholder() {
        let source = Source::new("main", "_");
        let placeholder = find(&source, "_", NodeKind::ExpressionPlaceholder);
        let token = placeholder.get("placeholder").unwrap();
        assert!(token.is(TokenType::Placeholder));

        let offered = insertion_after(&source, &placeholder, token, &en());
        assert!(offered.iter().all(|t| t.kind() == TransformKind::Assign));
        let number = offered.iter().find(|t| t.text(&en()) == "#").unwrap();
        assert_eq!(number.edit(&en()).unwrap().source.code().as_str(), "_•#");
    }

    #[test]
    fn test_language_tags_after_alias() {
        let source = Source::new("main", "hi: 1");
        let alias = source.nodes().into_iter().find(|n| n.kind() == NodeKind::Alias).unwrap();
        let name = alias.get("name").unwrap();
        let locales = vec!["en".to_string(), "es".to_string()];
        let offered: Vec<String> = insertion_after(&source, &alias, name, &locales)
            .iter()
            .map(|t| t.text(&locales))
            .collect();
        assert_eq!(offered, vec!["/en", "/es"]);
    }

    #[test]
    fn test_child_removal_skips_placeholders() {
        let source = Source::new("main", "1 + _");
        let placeholder = find(&source, "_", NodeKind::ExpressionPlaceholder);
        let parent = source.root().parent(&placeholder).unwrap();
        assert!(child_removal(&source, parent, &placeholder).is_none());
    }

    #[test]
    fn test_child_removal_keeps_markers_and_last_name() {
        let source = Source::new("main", "a: 1\n(1 2)\n_•#");
        let bind = find(&source, "a: 1", NodeKind::Bind);
        assert!(child_removal(&source, &bind, bind.get("colon").unwrap()).is_none());
        let alias = bind.list("names").unwrap()[0].clone();
        assert!(child_removal(&source, &bind, &alias).is_none());

        let block = find(&source, "(1 2)", NodeKind::Block);
        assert!(child_removal(&source, &block, block.get("open").unwrap()).is_none());

        let placeholder = find(&source, "_•#", NodeKind::ExpressionPlaceholder);
        assert!(child_removal(&source, &placeholder, placeholder.get("dot").unwrap()).is_none());

        // A second name can go
        let source = Source::new("main", "a,b: 1");
        let bind = find(&source, "a,b: 1", NodeKind::Bind);
        let second = bind.list("names").unwrap()[1].clone();
        let edit = child_removal(&source, &bind, &second).unwrap().edit(&en()).unwrap();
        assert_eq!(edit.source.code().as_str(), "a: 1");
    }

    #[test]
    fn test_wrap() {
        let source = Source::new("main", "f()");
        let call = find(&source, "f()", NodeKind::Evaluate);
        let block = source.root().parent(&call).unwrap();
        assert_eq!(wrap(&source, block, &call).unwrap().text(&en()), "(f())");
    }
}
