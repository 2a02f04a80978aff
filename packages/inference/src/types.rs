use quill_parser::{builders, Node, NodeKind};
use serde::Serialize;
use std::fmt;

/// An inferred or declared type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    /// Nothing is known; accepts and is accepted by every type
    Unknown,
    Number,
    Text,
    Boolean,
    None,
    List(Box<Type>),
    Function(FunctionType),
    /// A type referred to by name that this core does not interpret
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionType {
    pub inputs: Vec<Type>,
    pub output: Box<Type>,
}

impl Type {
    /// Type denoted by a type node
    pub fn from_node(node: &Node) -> Type {
        match node.kind() {
            NodeKind::BooleanType => Type::Boolean,
            NodeKind::NumberType => Type::Number,
            NodeKind::TextType => Type::Text,
            NodeKind::NoneType => Type::None,
            NodeKind::NameType => node
                .get("name")
                .map(|name| Type::Named(name.text().to_string()))
                .unwrap_or(Type::Unknown),
            NodeKind::ListType => Type::List(Box::new(
                node.get("type").map(Type::from_node).unwrap_or(Type::Unknown),
            )),
            _ => Type::Unknown,
        }
    }

    /// A type node that denotes this type, if one can be written
    pub fn to_node(&self) -> Option<Node> {
        match self {
            Type::Number => Some(builders::number_type()),
            Type::Text => Some(builders::text_type()),
            Type::Boolean => Some(builders::boolean_type()),
            Type::None => Some(builders::none_type()),
            Type::Named(name) => Some(builders::name_type(name)),
            Type::List(item) => Some(builders::list_type(item.to_node())),
            Type::Function(_) | Type::Unknown => None,
        }
    }

    /// True if a value of type `other` may stand where this type is expected
    pub fn accepts(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Unknown, _) | (_, Type::Unknown) => true,
            (Type::List(a), Type::List(b)) => a.accepts(b),
            (Type::Function(a), Type::Function(b)) => {
                a.inputs.len() == b.inputs.len()
                    && a.inputs.iter().zip(&b.inputs).all(|(x, y)| y.accepts(x))
                    && a.output.accepts(&b.output)
            }
            (a, b) => a == b,
        }
    }

    /// The most specific type that covers both, or Unknown if they disagree
    pub fn unify(t1: &Type, t2: &Type) -> Type {
        match (t1, t2) {
            (Type::Unknown, other) | (other, Type::Unknown) => other.clone(),
            (Type::List(a), Type::List(b)) => Type::List(Box::new(Type::unify(a, b))),
            (a, b) if a == b => a.clone(),
            _ => Type::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Type::Unknown)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unknown => write!(f, "_"),
            Type::Number => write!(f, "#"),
            Type::Text => write!(f, "''"),
            Type::Boolean => write!(f, "?"),
            Type::None => write!(f, "ø"),
            Type::List(item) if !item.is_known() => write!(f, "[]"),
            Type::List(item) => write!(f, "[{}]", item),
            Type::Function(function) => {
                let inputs: Vec<String> = function.inputs.iter().map(Type::to_string).collect();
                write!(f, "ƒ({}) {}", inputs.join(" "), function.output)
            }
            Type::Named(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_parser::parse_type;

    #[test]
    fn test_unknown_accepts_everything() {
        assert!(Type::Unknown.accepts(&Type::Number));
        assert!(Type::Number.accepts(&Type::Unknown));
        assert!(!Type::Number.accepts(&Type::Text));
        assert!(Type::List(Box::new(Type::Number)).accepts(&Type::List(Box::new(Type::Unknown))));
    }

    #[test]
    fn test_unify() {
        assert_eq!(Type::unify(&Type::Unknown, &Type::Text), Type::Text);
        assert_eq!(Type::unify(&Type::Number, &Type::Text), Type::Unknown);
    }

    #[test]
    fn test_node_conversion() {
        let list = Type::from_node(&parse_type("[#]").unwrap());
        assert_eq!(list, Type::List(Box::new(Type::Number)));
        assert_eq!(list.to_node().unwrap().to_text(), "[#]");
        assert_eq!(list.to_string(), "[#]");
        assert!(Type::Unknown.to_node().is_none());
    }
}
