use crate::error::{InferenceError, InferenceResult};
use crate::scope::{is_hoisted, Scope};
use crate::types::{FunctionType, Type};
use quill_parser::{Node, NodeId, NodeKind, Root};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::trace;

/// Everything inference knows about one program
///
/// Types are inferred lazily and cached per node identity. A node whose type
/// depends on itself (`a: a`) infers `Unknown` rather than recursing.
pub struct Context {
    root: Root,
    types: RefCell<HashMap<NodeId, Type>>,
    visiting: RefCell<HashSet<NodeId>>,
}

impl Context {
    pub fn new(program: Node) -> Self {
        Self {
            root: Root::new(program),
            types: RefCell::new(HashMap::new()),
            visiting: RefCell::new(HashSet::new()),
        }
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn program(&self) -> &Node {
        self.root.node()
    }

    /// Definitions visible at `node`
    pub fn scope_of(&self, node: &Node) -> Rc<Scope> {
        let mut path = self.root.ancestors(node);
        path.reverse();
        path.push(node.clone());

        let mut scope = Rc::new(Scope::new());
        for pair in path.windows(2) {
            let (ancestor, child) = (&pair[0], &pair[1]);
            match ancestor.kind() {
                NodeKind::Block => {
                    let mut inner = Scope::with_parent(scope.clone());
                    let statements = ancestor.list("statements").unwrap_or(&[]);
                    let position = statements.iter().position(|s| s.same(child));
                    for (index, statement) in statements.iter().enumerate() {
                        let precedes = position.is_some_and(|p| index < p);
                        if is_hoisted(statement) || (precedes && statement.kind() == NodeKind::Bind) {
                            inner.define(statement);
                        }
                    }
                    scope = Rc::new(inner);
                }
                NodeKind::FunctionDefinition => {
                    let mut inner = Scope::with_parent(scope.clone());
                    for input in ancestor.list("inputs").unwrap_or(&[]) {
                        if !input.same(child) {
                            inner.define(input);
                        }
                    }
                    scope = Rc::new(inner);
                }
                _ => {}
            }
        }
        scope
    }

    /// Definitions visible at `node`, outermost first
    pub fn definitions_in_scope(&self, node: &Node) -> Vec<Node> {
        self.scope_of(node).collect_all()
    }

    /// The definition a reference names
    pub fn definition_of(&self, reference: &Node) -> InferenceResult<Node> {
        if reference.kind() != NodeKind::Reference {
            return Err(InferenceError::NotAReference(reference.kind()));
        }
        let name = reference.get("name").map(|n| n.text()).unwrap_or("");
        self.scope_of(reference)
            .lookup(name)
            .ok_or_else(|| InferenceError::UnknownName(name.to_string()))
    }

    pub fn resolve(&self, reference: &Node) -> Option<Node> {
        self.definition_of(reference).ok()
    }

    /// Inferred type of an expression, or the denoted type of a type node
    pub fn type_of(&self, node: &Node) -> Type {
        if let Some(cached) = self.types.borrow().get(&node.id()) {
            return cached.clone();
        }
        if !self.visiting.borrow_mut().insert(node.id()) {
            trace!(node = node.id(), "cyclic type, inferring unknown");
            return Type::Unknown;
        }

        let inferred = self.infer(node);

        self.visiting.borrow_mut().remove(&node.id());
        self.types.borrow_mut().insert(node.id(), inferred.clone());
        inferred
    }

    fn infer(&self, node: &Node) -> Type {
        if node.kind().is_type() {
            return Type::from_node(node);
        }
        match node.kind() {
            NodeKind::NumberLiteral => Type::Number,
            NodeKind::TextLiteral => Type::Text,
            NodeKind::BooleanLiteral => Type::Boolean,
            NodeKind::NoneLiteral => Type::None,
            NodeKind::ListLiteral => {
                let item = node
                    .list("values")
                    .unwrap_or(&[])
                    .iter()
                    .map(|value| self.type_of(value))
                    .reduce(|a, b| Type::unify(&a, &b))
                    .unwrap_or(Type::Unknown);
                Type::List(Box::new(item))
            }
            NodeKind::Reference => self
                .resolve(node)
                .map(|definition| self.type_of(&definition))
                .unwrap_or(Type::Unknown),
            NodeKind::Bind => self.bind_type(node),
            NodeKind::FunctionDefinition => Type::Function(self.function_type(node)),
            NodeKind::Evaluate => match node.get("func").map(|func| self.type_of(func)) {
                Some(Type::Function(function)) => *function.output,
                _ => Type::Unknown,
            },
            NodeKind::BinaryOperation => {
                let operator = node.get("operator").map(|o| o.text()).unwrap_or("");
                let left = node.get("left").map(|l| self.type_of(l)).unwrap_or(Type::Unknown);
                if operator == "+" && left == Type::Text {
                    Type::Text
                } else {
                    operator_types(operator).1
                }
            }
            NodeKind::UnaryOperation => match node.get("operator").map(|o| o.text()) {
                Some("¬") => Type::Boolean,
                Some("-") => Type::Number,
                _ => Type::Unknown,
            },
            NodeKind::Conditional => {
                let yes = node.get("yes").map(|n| self.type_of(n)).unwrap_or(Type::Unknown);
                let no = node.get("no").map(|n| self.type_of(n)).unwrap_or(Type::Unknown);
                Type::unify(&yes, &no)
            }
            NodeKind::Block => node
                .list("statements")
                .and_then(|statements| statements.last())
                .map(|last| self.type_of(last))
                .unwrap_or(Type::Unknown),
            NodeKind::ExpressionPlaceholder => node
                .get("type")
                .map(Type::from_node)
                .unwrap_or(Type::Unknown),
            _ => Type::Unknown,
        }
    }

    /// Declared type if there is one, else the type of the value
    fn bind_type(&self, bind: &Node) -> Type {
        if let Some(declared) = bind.get("type") {
            return Type::from_node(declared);
        }
        bind.get("value")
            .map(|value| self.type_of(value))
            .unwrap_or(Type::Unknown)
    }

    pub fn function_type(&self, function: &Node) -> FunctionType {
        let inputs = function
            .list("inputs")
            .unwrap_or(&[])
            .iter()
            .map(|input| self.type_of(input))
            .collect();
        let output = match function.get("output") {
            Some(declared) => Type::from_node(declared),
            None => function
                .get("expression")
                .map(|expression| self.type_of(expression))
                .unwrap_or(Type::Unknown),
        };
        FunctionType {
            inputs,
            output: Box::new(output),
        }
    }

    /// Type the position of `node` in its parent expects
    pub fn expected_type(&self, node: &Node) -> InferenceResult<Type> {
        if !self.root.contains(node) {
            return Err(InferenceError::NotInTree(node.id()));
        }
        let Some(parent) = self.root.parent(node) else {
            return Ok(Type::Unknown);
        };
        let Some(spec) = parent.field_of_child(node) else {
            return Ok(Type::Unknown);
        };
        let index = parent
            .list(spec.name)
            .and_then(|list| list.iter().position(|n| n.same(node)))
            .unwrap_or(0);
        Ok(self.expected_field_type(parent, spec.name, index))
    }

    /// Type a field of `parent` expects at `index`, whether or not anything
    /// is there yet
    pub fn expected_field_type(&self, parent: &Node, field: &str, index: usize) -> Type {
        match (parent.kind(), field) {
            (NodeKind::Bind, "value") => parent.get("type").map(Type::from_node).unwrap_or(Type::Unknown),
            (NodeKind::FunctionDefinition, "expression") => {
                parent.get("output").map(Type::from_node).unwrap_or(Type::Unknown)
            }
            (NodeKind::Evaluate, "inputs") => match parent.get("func").map(|f| self.type_of(f)) {
                Some(Type::Function(function)) => function.inputs.get(index).cloned().unwrap_or(Type::Unknown),
                _ => Type::Unknown,
            },
            (NodeKind::BinaryOperation, "left" | "right") => {
                let operator = parent.get("operator").map(|o| o.text()).unwrap_or("");
                if operator == "+" {
                    // Either numbers or text, decided by the left operand
                    match parent.get("left").map(|l| self.type_of(l)) {
                        Some(Type::Text) => Type::Text,
                        _ if field == "left" => Type::Unknown,
                        _ => Type::Number,
                    }
                } else {
                    operator_types(operator).0
                }
            }
            (NodeKind::UnaryOperation, "operand") => match parent.get("operator").map(|o| o.text()) {
                Some("¬") => Type::Boolean,
                Some("-") => Type::Number,
                _ => Type::Unknown,
            },
            (NodeKind::Conditional, "condition") => Type::Boolean,
            (NodeKind::Conditional, "yes" | "no") => self.expected_type(parent).unwrap_or(Type::Unknown),
            (NodeKind::ListLiteral, "values") => match self.expected_type(parent) {
                Ok(Type::List(item)) => *item,
                _ => Type::Unknown,
            },
            (NodeKind::Block, "statements") => {
                let is_last = parent
                    .list("statements")
                    .is_some_and(|statements| index + 1 >= statements.len());
                if is_last && parent.get("open").is_some() {
                    self.expected_type(parent).unwrap_or(Type::Unknown)
                } else {
                    Type::Unknown
                }
            }
            _ => Type::Unknown,
        }
    }
}

/// (operand type, result type) of a binary operator
fn operator_types(operator: &str) -> (Type, Type) {
    match operator {
        "+" | "-" | "×" | "·" | "÷" | "%" | "^" => (Type::Number, Type::Number),
        "<" | ">" | "≤" | "≥" => (Type::Number, Type::Boolean),
        "&" | "|" => (Type::Boolean, Type::Boolean),
        "=" | "≠" => (Type::Unknown, Type::Boolean),
        _ => (Type::Unknown, Type::Unknown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_parser::parse;

    fn context(source: &str) -> (Context, Vec<Node>) {
        let program = parse(source);
        let statements = program.get("block").unwrap().list("statements").unwrap().to_vec();
        (Context::new(program), statements)
    }

    #[test]
    fn test_literal_and_operation_types() {
        let (context, statements) = context("1 + 2\n\"a\" + \"b\"\n1 < 2\n[1 2]\n⊤ ? 1 2");
        assert_eq!(context.type_of(&statements[0]), Type::Number);
        assert_eq!(context.type_of(&statements[1]), Type::Text);
        assert_eq!(context.type_of(&statements[2]), Type::Boolean);
        assert_eq!(context.type_of(&statements[3]), Type::List(Box::new(Type::Number)));
        assert_eq!(context.type_of(&statements[4]), Type::Number);
    }

    #[test]
    fn test_references_resolve_to_preceding_binds() {
        let (context, statements) = context("x: b\nc: 1\nc");
        let reference = &statements[2];
        assert!(context.resolve(reference).unwrap().same(&statements[1]));
        assert_eq!(context.type_of(reference), Type::Number);

        let early = statements[0].get("value").unwrap();
        assert_eq!(
            context.definition_of(early),
            Err(InferenceError::UnknownName("b".to_string()))
        );
    }

    #[test]
    fn test_functions_are_visible_everywhere_in_their_block() {
        let (context, statements) = context("sum(1 2)\nƒ sum(a•# b•#) a + b");
        let func = statements[0].get("func").unwrap();
        assert!(context.resolve(func).unwrap().same(&statements[1]));
        assert_eq!(context.type_of(&statements[0]), Type::Number);
    }

    #[test]
    fn test_function_inputs_are_in_scope_of_body() {
        let (context, statements) = context("ƒ sum(a•? b•?) a & b");
        let body = statements[0].get("expression").unwrap();
        let left = body.get("left").unwrap();
        assert_eq!(context.type_of(left), Type::Boolean);
        assert_eq!(
            context.type_of(&statements[0]),
            Type::Function(FunctionType {
                inputs: vec![Type::Boolean, Type::Boolean],
                output: Box::new(Type::Boolean),
            })
        );
    }

    #[test]
    fn test_cycles_infer_unknown() {
        let (context, statements) = context("ƒ f() f()");
        assert_eq!(context.type_of(&statements[0].get("expression").unwrap().clone()), Type::Unknown);
    }

    #[test]
    fn test_expected_types() {
        let (context, statements) = context("a•#: ⊤\nƒ f(x•'') x\nf(1)\n1 + 2");
        let value = statements[0].get("value").unwrap();
        assert_eq!(context.expected_type(value), Ok(Type::Number));

        let input = &statements[2].list("inputs").unwrap()[0];
        assert_eq!(context.expected_type(input), Ok(Type::Text));

        let right = statements[3].get("right").unwrap();
        assert_eq!(context.expected_type(right), Ok(Type::Number));

        let stranger = quill_parser::builders::number("1");
        assert_eq!(context.expected_type(&stranger), Err(InferenceError::NotInTree(stranger.id())));
    }
}
