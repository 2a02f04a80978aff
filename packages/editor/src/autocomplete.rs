//! Autocomplete: the transforms offered at a caret
//!
//! Only transforms whose edit succeeds are offered.

use crate::affordances::{child_replacement, insertion_after, insertion_before, wrap};
use crate::caret::{Caret, Position};
use crate::project::Project;
use crate::transform::{Transform, TransformKind};
use quill_parser::{NodeId, NodeKind, TokenType};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Every transform that applies at the caret, in discovery order, without
/// duplicates
///
/// A selection offers replacements for the selected node. An offset offers
/// insertions for every node it sits before or after, plus replacements for
/// a reference that was just typed.
#[instrument(skip_all, fields(source = %caret.source().name()))]
pub fn get_edits_at(project: &Project, caret: &Caret) -> Vec<Transform> {
    let source = caret.source();
    let root = source.root();
    let locales = project.locales();
    let mut transforms = Vec::new();

    match caret.position() {
        Position::Node(node) => {
            // A selected placeholder token stands for its placeholder node
            let subject = match root.parent(node) {
                Some(parent) if node.is(TokenType::Placeholder) => parent.clone(),
                _ => node.clone(),
            };
            if let Some(parent) = root.parent(&subject) {
                transforms.extend(child_replacement(source, parent, &subject, None, locales));
                transforms.extend(wrap(source, parent, &subject));
            }
        }
        Position::Index(index) => {
            if let Some(prior) = caret.token_prior() {
                let typed = prior.is(TokenType::Name) && source.token_last_index(prior) == Some(*index);
                let reference = root.parent(prior).filter(|p| p.kind() == NodeKind::Reference);
                if let (true, Some(reference)) = (typed, reference) {
                    if let Some(parent) = root.parent(reference) {
                        transforms.extend(child_replacement(source, parent, reference, Some(prior.text()), locales));
                    }
                }
            }

            if let Some(between) = caret.nodes_between() {
                for node in &between.before {
                    if let Some(parent) = root.parent(node) {
                        transforms.extend(insertion_before(source, parent, node, locales));
                    }
                }
                for node in &between.after {
                    if let Some(parent) = root.parent(node) {
                        transforms.extend(insertion_after(source, parent, node, locales));
                        transforms.extend(wrap(source, parent, node));
                    }
                }
            }
        }
    }

    let mut seen: HashSet<(TransformKind, NodeId, String)> = HashSet::new();
    transforms.retain(|transform| seen.insert((transform.kind(), transform.target().id(), transform.text(locales))));
    transforms.retain(|transform| transform.edit(locales).is_ok());
    debug!(count = transforms.len(), "computed edits");
    transforms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;

    fn edits(code: &str, index: usize) -> Vec<(TransformKind, String)> {
        let source = Source::new("main", code);
        let project = Project::new("test", vec![source.clone()]);
        get_edits_at(&project, &Caret::at(source, index))
            .iter()
            .map(|t| (t.kind(), t.text(project.locales())))
            .collect()
    }

    #[test]
    fn test_empty_program_offers_statements() {
        let offered = edits("", 0);
        assert!(offered.contains(&(TransformKind::Append, "0".to_string())));
        assert!(offered.contains(&(TransformKind::Append, "_".to_string())));
    }

    #[test]
    fn test_no_duplicates() {
        let offered = edits("a: 1\n", 5);
        let unique: HashSet<_> = offered.iter().collect();
        assert_eq!(unique.len(), offered.len());
    }

    #[test]
    fn test_valueless_bind_offers_only_edits_that_read_back() {
        let source = Source::new("main", "a:");
        let project = Project::new("test", vec![source.clone()]);
        let offered = get_edits_at(&project, &Caret::at(source, 2));
        assert!(offered
            .iter()
            .any(|t| t.kind() == TransformKind::Assign && t.text(project.locales()) == "0"));
        for transform in &offered {
            let edit = transform.edit(project.locales()).unwrap();
            assert!(quill_parser::parse(edit.source.code().as_str()).equals(edit.source.program()));
            assert_ne!(edit.source.code().as_str(), "a:\n0");
        }
    }

    #[test]
    fn test_inside_a_token_offers_nothing_structural() {
        assert!(edits("1234", 2).is_empty());
    }
}
