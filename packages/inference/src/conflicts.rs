//! Problems in a program, reported as values
//!
//! A program with conflicts is still a valid tree. Conflicts describe what an
//! editor would underline, not reasons to refuse an edit.

use crate::context::Context;
use crate::scope::names_of;
use crate::types::Type;
use quill_parser::{Node, NodeKind};
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConflictKind {
    #[error("Unknown name '{name}'")]
    UnknownName { name: String },

    #[error("Placeholder needs to be filled in")]
    Placeholder,

    #[error("Could not make sense of this")]
    Unparsable,

    #[error("'{name}' is missing a value after ':'")]
    MissingValue { name: String },

    #[error("The name '{name}' is already used here")]
    DuplicateName { name: String },

    #[error("Required input '{name}' comes after an optional one")]
    RequiredAfterOptional { name: String },

    #[error("Function has no expression")]
    NoExpression,

    #[error("Expected input of type {expected}, given {given}")]
    IncompatibleInput { expected: String, given: String },

    #[error("Expected type {expected}, given {given}")]
    IncompatibleType { expected: String, given: String },

    #[error("Missing closing '{delimiter}'")]
    MissingClose { delimiter: String },
}

/// A conflict and the node it is about
#[derive(Debug, Clone, Serialize)]
pub struct Conflict {
    #[serde(flatten)]
    pub kind: ConflictKind,
    pub message: String,
    /// Text of the node, for display
    pub text: String,
    #[serde(skip)]
    pub node: Node,
}

impl Conflict {
    fn new(kind: ConflictKind, node: &Node) -> Self {
        Self {
            message: kind.to_string(),
            kind,
            text: node.to_text(),
            node: node.clone(),
        }
    }
}

impl Context {
    /// Conflicts of every node in the program, in tree order
    pub fn conflicts(&self) -> Vec<Conflict> {
        self.program()
            .nodes()
            .iter()
            .flat_map(|node| self.conflicts_of(node))
            .collect()
    }

    /// Conflicts a single node is responsible for
    pub fn conflicts_of(&self, node: &Node) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        let mut push = |kind: ConflictKind, on: &Node| conflicts.push(Conflict::new(kind, on));

        match node.kind() {
            NodeKind::Reference => {
                if self.resolve(node).is_none() {
                    let name = node.get("name").map(|n| n.text()).unwrap_or("").to_string();
                    push(ConflictKind::UnknownName { name }, node);
                }
            }
            NodeKind::ExpressionPlaceholder | NodeKind::TypePlaceholder => {
                push(ConflictKind::Placeholder, node);
            }
            NodeKind::UnparsableExpression => push(ConflictKind::Unparsable, node),
            NodeKind::Bind => {
                if node.get("colon").is_some() && node.get("value").is_none() {
                    push(ConflictKind::MissingValue { name: first_name(node) }, node);
                }
                if let (Some(declared), Some(value)) = (node.get("type"), node.get("value")) {
                    let expected = Type::from_node(declared);
                    let given = self.type_of(value);
                    if !expected.accepts(&given) {
                        push(incompatible_type(&expected, &given), value);
                    }
                }
                duplicate_aliases(node, &mut push);
            }
            NodeKind::FunctionDefinition => {
                let inputs = node.list("inputs").unwrap_or(&[]);

                let mut seen = HashSet::new();
                for input in inputs {
                    for name in names_of(input) {
                        if !seen.insert(name.text.clone()) {
                            push(ConflictKind::DuplicateName { name: name.text }, input);
                        }
                    }
                }

                let mut optional = false;
                for input in inputs {
                    let has_default = input.get("value").is_some();
                    if optional && !has_default {
                        push(ConflictKind::RequiredAfterOptional { name: first_name(input) }, input);
                    }
                    optional |= has_default;
                }

                match node.get("expression") {
                    None => push(ConflictKind::NoExpression, node),
                    Some(expression) => {
                        if let Some(declared) = node.get("output") {
                            let expected = Type::from_node(declared);
                            let given = self.type_of(expression);
                            if !expected.accepts(&given) {
                                push(incompatible_type(&expected, &given), expression);
                            }
                        }
                    }
                }

                duplicate_aliases(node, &mut push);
                if node.get("close").is_none() {
                    push(missing_close(")"), node);
                }
            }
            NodeKind::Evaluate => {
                if let Some(Type::Function(function)) = node.get("func").map(|f| self.type_of(f)) {
                    for (input, expected) in node.list("inputs").unwrap_or(&[]).iter().zip(&function.inputs) {
                        let given = self.type_of(input);
                        if !expected.accepts(&given) {
                            push(
                                ConflictKind::IncompatibleInput {
                                    expected: expected.to_string(),
                                    given: given.to_string(),
                                },
                                input,
                            );
                        }
                    }
                }
                if node.get("close").is_none() {
                    push(missing_close(")"), node);
                }
            }
            NodeKind::Block => {
                if node.get("open").is_some() && node.get("close").is_none() {
                    push(missing_close(")"), node);
                }
            }
            NodeKind::ListLiteral | NodeKind::ListType => {
                if node.get("close").is_none() {
                    push(missing_close("]"), node);
                }
            }
            _ => {}
        }

        conflicts
    }
}

fn first_name(definition: &Node) -> String {
    names_of(definition)
        .into_iter()
        .next()
        .map(|name| name.text)
        .unwrap_or_default()
}

fn duplicate_aliases(definition: &Node, push: &mut impl FnMut(ConflictKind, &Node)) {
    let mut seen = HashSet::new();
    for name in names_of(definition) {
        if !seen.insert(name.text.clone()) {
            push(ConflictKind::DuplicateName { name: name.text }, definition);
        }
    }
}

fn incompatible_type(expected: &Type, given: &Type) -> ConflictKind {
    ConflictKind::IncompatibleType {
        expected: expected.to_string(),
        given: given.to_string(),
    }
}

fn missing_close(delimiter: &str) -> ConflictKind {
    ConflictKind::MissingClose {
        delimiter: delimiter.to_string(),
    }
}
