//! End-to-end editing: autocomplete, typing and drag/drop through the public API

use proptest::prelude::*;
use quill_editor::{
    drop_node_on_source, get_edits_at, get_insertion_point, Caret, DropTarget, EditError, InsertionPoint, Position,
    Project, Source, TransformKind,
};
use quill_parser::{builders, parse, Node, TokenType};

fn statements(source: &Source) -> Vec<Node> {
    source
        .program()
        .get("block")
        .and_then(|block| block.list("statements"))
        .map(|list| list.to_vec())
        .unwrap_or_default()
}

fn reads_back(source: &Source) -> bool {
    parse(source.code().as_str()).equals(source.program())
}

fn offered(project: &Project, caret: &Caret) -> Vec<(TransformKind, String)> {
    get_edits_at(project, caret)
        .iter()
        .map(|transform| (transform.kind(), transform.text(project.locales())))
        .collect()
}

#[test]
fn test_empty_bind_offers_zero() {
    let source = Source::new("main", "a:");
    let project = Project::new("test", vec![source.clone()]);
    let caret = Caret::at(source, 2);

    let edits = get_edits_at(&project, &caret);
    let zero = edits
        .iter()
        .find(|t| t.kind() == TransformKind::Assign && t.text(project.locales()) == "0")
        .expect("assign 0 offered");
    let edit = zero.edit(project.locales()).unwrap();
    assert_eq!(edit.source.code().as_str(), "a: 0");
}

#[test]
fn test_typed_name_offers_call() {
    let code = "ƒ sum(a•? b•?) a & b\ns";
    let source = Source::new("main", code);
    let project = Project::new("test", vec![source.clone()]);
    let caret = Caret::at(source, code.chars().count());

    let edits = get_edits_at(&project, &caret);
    let call = edits
        .iter()
        .find(|t| t.kind() == TransformKind::Replace && t.text(project.locales()) == "sum(_•? _•?)")
        .expect("call offered");
    assert_eq!(call.target().to_text(), "s");

    let edit = call.edit(project.locales()).unwrap();
    assert_eq!(edit.source.code().as_str(), "ƒ sum(a•? b•?) a & b\nsum(_•? _•?)");
    assert!(edit.caret.node().unwrap().is(TokenType::Placeholder));
}

#[test]
fn test_selected_literal_offers_reference() {
    let source = Source::new("main", "c: 1\n1 + 2");
    let project = Project::new("test", vec![source.clone()]);
    let two = statements(&source)[1].get("right").unwrap().clone();
    let caret = Caret::selecting(source, two.clone());

    let edits = get_edits_at(&project, &caret);
    let reference = edits
        .iter()
        .find(|t| t.kind() == TransformKind::Replace && t.text(project.locales()) == "c")
        .expect("reference offered");
    assert!(reference.target().same(&two));
    assert_eq!(
        reference.edit(project.locales()).unwrap().source.code().as_str(),
        "c: 1\n1 + c"
    );
}

#[test]
fn test_drop_into_empty_program() {
    let source = Source::new("main", "");
    let project = Project::new("test", vec![source.clone()]);
    let end = source.tokens().last().unwrap().clone();
    let point = get_insertion_point(&source, &end, true, &end, 0).unwrap();
    assert_eq!(point.index, 0);

    let dragged = builders::binary(builders::number("1"), "+", builders::number("2"));
    let (project, edited, clone) =
        drop_node_on_source(&project, &source, &dragged, &DropTarget::Insertion(point)).unwrap();

    let list = statements(&edited);
    assert_eq!(list.len(), 1);
    assert!(list[0].same(&clone));
    assert!(!clone.same(&dragged));
    assert_eq!(edited.code().as_str(), "1 + 2");
    assert!(project.main().unwrap().same(&edited));
}

#[test]
fn test_drop_adds_exactly_one_element() {
    let source = Source::new("main", "[1 2 3]");
    let project = Project::new("test", vec![source.clone()]);
    let list = statements(&source)[0].clone();
    let dragged = builders::text("hi");

    for index in 0..=3 {
        let tokens = source.tokens();
        let token = if index == 3 { tokens[4].clone() } else { tokens[index + 1].clone() };
        let point = InsertionPoint::new(
            list.clone(),
            "values",
            list.list("values").unwrap().to_vec(),
            token,
            0,
            index,
        );
        let (_, edited, clone) =
            drop_node_on_source(&project, &source, &dragged, &DropTarget::Insertion(point)).unwrap();
        let values = statements(&edited)[0].list("values").unwrap().to_vec();
        assert_eq!(values.len(), 4);
        assert!(values[index].same(&clone));
        assert_eq!(clone.to_text(), dragged.to_text());
    }
}

#[test]
fn test_drop_onto_own_position() {
    let source = Source::new("main", "a: 1\nb");
    let project = Project::new("test", vec![source.clone()]);
    let a = statements(&source)[0].clone();
    let first = a.first_token().unwrap();
    let point = get_insertion_point(&source, &a, true, &first, 0).unwrap();

    let (_, edited, clone) = drop_node_on_source(&project, &source, &a, &DropTarget::Insertion(point)).unwrap();
    assert_eq!(edited.code().as_str(), "a: 1\nb");
    assert!(statements(&edited)[0].same(&clone));

    let two = Source::new("main", "1 + 2");
    let project = Project::new("test", vec![two.clone()]);
    let right = statements(&two)[0].get("right").unwrap().clone();
    let (_, edited, _) = drop_node_on_source(&project, &two, &right, &DropTarget::Node(right.clone())).unwrap();
    assert_eq!(edited.code().as_str(), "1 + 2");
}

#[test]
fn test_wrap_call_in_parentheses() {
    let source = Source::new("main", "sum()");
    let project = Project::new("test", vec![source.clone()]);
    let caret = Caret::at(source, 5);

    let edits = get_edits_at(&project, &caret);
    let wrap = edits
        .iter()
        .find(|t| t.text(project.locales()) == "(sum())")
        .expect("wrap offered");
    assert_eq!(wrap.kind(), TransformKind::Replace);
    assert_eq!(wrap.edit(project.locales()).unwrap().source.code().as_str(), "(sum())");
}

#[test]
fn test_cross_source_drop_is_atomic() {
    let from = Source::new("from", "x: 1\ny: 2");
    let to = Source::new("to", "[]");
    let project = Project::new("test", vec![from.clone(), to.clone()]);
    let one = statements(&from)[0].get("value").unwrap().clone();
    let open = to.tokens()[0].clone();
    let point = get_insertion_point(&to, &open, false, &open, 0).unwrap();

    let (moved, edited, _) = drop_node_on_source(&project, &to, &one, &DropTarget::Insertion(point.clone())).unwrap();
    assert_eq!(edited.code().as_str(), "[1]");
    // Vacated, `x:` would take the next line as its value
    assert_eq!(moved.source_named("from").unwrap().code().as_str(), "x: _•#\ny: 2");

    // The old project is untouched and can no longer accept the same drop twice
    assert!(project.source_named("to").unwrap().same(&to));
    let again = drop_node_on_source(&moved, &to, &one, &DropTarget::Insertion(point));
    assert_eq!(again.unwrap_err(), EditError::UnknownSource("to".to_string()));
    assert_eq!(moved.source_named("from").unwrap().code().as_str(), "x: _•#\ny: 2");
}

#[test]
fn test_typing_then_completing() {
    let source = Source::new("main", "total: 1\n");
    let typed = Caret::at(source, 9).insert("t").unwrap();
    assert_eq!(typed.source.code().as_str(), "total: 1\nt");
    assert_eq!(typed.caret.index(), Some(10));

    let project = Project::new("test", vec![typed.source.clone()]);
    assert!(offered(&project, &typed.caret).contains(&(TransformKind::Replace, "total".to_string())));
}

fn fragments() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec!["a", "1", " ", "\n", "_", "+", "(", ")", ":", "\"x\"", "ƒ"]),
        0..12,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn test_round_trip_holds(code in fragments()) {
        let source = Source::new("main", &code);
        prop_assert_eq!(source.code().as_str(), code.as_str());
    }

    #[test]
    fn test_horizontal_moves_stay_in_bounds(code in fragments(), index in 0usize..20, forward in any::<bool>()) {
        let source = Source::new("main", &code);
        let length = source.code().len();
        let caret = Caret::at(source, index);
        let moved = if forward { caret.right() } else { caret.left() };
        match moved.position() {
            Position::Index(i) => prop_assert!(*i <= length),
            Position::Node(node) => prop_assert!(node.is(TokenType::Placeholder)),
        }
    }

    #[test]
    fn test_placeholders_are_never_split(code in fragments(), index in 0usize..20) {
        let source = Source::new("main", &code);
        let mut caret = Caret::at(source.clone(), index);
        for _ in 0..4 {
            caret = caret.right();
            if let Position::Node(token) = caret.position() {
                let start = source.token_text_index(token).unwrap();
                prop_assert_eq!(caret.right().index(), Some(start + 1));
                prop_assert_eq!(caret.left().index(), Some(start));
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_offered_edits_read_back(code in fragments()) {
        let source = Source::new("main", &code);
        let project = Project::new("test", vec![source.clone()]);
        let carets = (0..=source.code().len())
            .map(|index| Caret::at(source.clone(), index))
            .chain(source.nodes().into_iter().map(|node| Caret::selecting(source.clone(), node)));
        for caret in carets {
            for transform in get_edits_at(&project, &caret) {
                let edit = transform.edit(project.locales()).unwrap();
                prop_assert!(reads_back(&edit.source), "{:?} from {:?}", edit.source.code().as_str(), code);
            }
        }
    }

    #[test]
    fn test_selection_backspace_reads_back(code in fragments()) {
        let source = Source::new("main", &code);
        for node in source.nodes() {
            if let Ok(edit) = Caret::selecting(source.clone(), node).backspace() {
                prop_assert!(reads_back(&edit.source), "{:?} from {:?}", edit.source.code().as_str(), code);
            }
        }
    }

    #[test]
    fn test_drops_read_back(code in fragments()) {
        let source = Source::new("main", &code);
        let project = Project::new("test", vec![source.clone()]);
        let end = source.tokens().last().unwrap().clone();
        for statement in statements(&source) {
            let Ok(point) = get_insertion_point(&source, &end, true, &end, 0) else {
                continue;
            };
            let target = DropTarget::Insertion(point);
            if let Ok((project, edited, _)) = drop_node_on_source(&project, &source, &statement, &target) {
                prop_assert!(reads_back(&edited), "{:?} from {:?}", edited.code().as_str(), code);
                prop_assert!(project.sources().iter().all(reads_back));
            }
        }
    }
}
