use crate::errors::{EditError, EditResult};
use crate::source::Source;
use quill_inference::Context;
use quill_parser::Node;
use std::rc::Rc;
use tracing::debug;

/// An immutable collection of sources and the locales names are shown in
#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    sources: Vec<Source>,
    locales: Vec<String>,
}

impl Project {
    pub fn new(name: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            name: name.into(),
            sources,
            locales: vec!["en".to_string()],
        }
    }

    pub fn with_locales(mut self, locales: Vec<String>) -> Self {
        self.locales = locales;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// The first source
    pub fn main(&self) -> Option<&Source> {
        self.sources.first()
    }

    pub fn source_named(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|source| source.name() == name)
    }

    /// The source whose tree holds `node`
    pub fn get_root(&self, node: &Node) -> Option<&Source> {
        self.sources.iter().find(|source| source.contains(node))
    }

    pub fn context(&self, source: &Source) -> Rc<Context> {
        source.context()
    }

    pub fn with_source(&self, original: &Source, replacement: Source) -> EditResult<Project> {
        self.with_sources(vec![(original.clone(), replacement)])
    }

    /// Swap several sources at once. Every original must be a current
    /// snapshot of this project, or nothing is swapped.
    pub fn with_sources(&self, replacements: Vec<(Source, Source)>) -> EditResult<Project> {
        for (original, _) in &replacements {
            if !self.sources.iter().any(|source| source.same(original)) {
                return Err(EditError::UnknownSource(original.name().to_string()));
            }
        }

        let sources = self
            .sources
            .iter()
            .map(|source| {
                replacements
                    .iter()
                    .find(|(original, _)| original.same(source))
                    .map(|(_, replacement)| replacement.clone())
                    .unwrap_or_else(|| source.clone())
            })
            .collect();
        debug!(project = %self.name, replaced = replacements.len(), "replaced sources");

        Ok(Self {
            name: self.name.clone(),
            sources,
            locales: self.locales.clone(),
        })
    }
}
