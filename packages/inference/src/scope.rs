use quill_parser::{Node, NodeKind};
use std::rc::Rc;

/// One alias of a definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub text: String,
    pub language: Option<String>,
}

/// Aliases of a Bind or FunctionDefinition, in order
pub fn names_of(definition: &Node) -> Vec<Name> {
    definition
        .list("names")
        .unwrap_or(&[])
        .iter()
        .filter_map(|alias| {
            let text = alias.get("name")?.text().to_string();
            let language = alias
                .get("language")
                .and_then(|language| language.get("code"))
                .map(|code| code.text().to_string());
            Some(Name { text, language })
        })
        .collect()
}

/// The alias to show for a definition: the first whose language matches the
/// earliest listed locale, else the first alias
pub fn preferred_name(definition: &Node, locales: &[String]) -> Option<String> {
    let names = names_of(definition);
    locales
        .iter()
        .find_map(|locale| {
            names
                .iter()
                .find(|name| name.language.as_deref() == Some(locale.as_str()))
        })
        .or_else(|| names.first())
        .map(|name| name.text.clone())
}

/// Lexical scope of definitions visible at a node
/// Uses Rc for cheap sharing of enclosing scopes
#[derive(Debug, Clone, Default)]
pub struct Scope {
    parent: Option<Rc<Scope>>,
    bindings: Vec<(String, Node)>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a child scope whose lookups fall back to `parent`
    pub fn with_parent(parent: Rc<Scope>) -> Self {
        Self {
            parent: Some(parent),
            bindings: Vec::new(),
        }
    }

    /// Bind every alias of a definition
    pub fn define(&mut self, definition: &Node) {
        debug_assert!(definition.kind().is_definition());
        for name in names_of(definition) {
            self.bindings.push((name.text, definition.clone()));
        }
    }

    /// Look up a name in this scope or enclosing scopes. Later and inner
    /// definitions shadow earlier and outer ones.
    pub fn lookup(&self, name: &str) -> Option<Node> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, definition)| definition.clone())
            .or_else(|| self.parent.as_ref().and_then(|p| p.lookup(name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Visible definitions, outermost first and in source order within a
    /// scope, leaving out those every alias of which is shadowed
    pub fn collect_all(&self) -> Vec<Node> {
        let mut bindings = Vec::new();
        self.collect_bindings(&mut bindings);

        let mut visible: Vec<Node> = Vec::new();
        for (index, (name, definition)) in bindings.iter().enumerate() {
            let shadowed = bindings[index + 1..].iter().any(|(later, _)| later == name);
            if !shadowed && !visible.iter().any(|d| d.same(definition)) {
                visible.push(definition.clone());
            }
        }
        visible.sort_by_key(|definition| {
            bindings
                .iter()
                .position(|(_, d)| d.same(definition))
                .unwrap_or(usize::MAX)
        });
        visible
    }

    fn collect_bindings(&self, out: &mut Vec<(String, Node)>) {
        if let Some(parent) = &self.parent {
            parent.collect_bindings(out);
        }
        out.extend(self.bindings.iter().cloned());
    }
}

/// True for definitions that are visible before their own statement
pub(crate) fn is_hoisted(definition: &Node) -> bool {
    definition.kind() == NodeKind::FunctionDefinition
}
