pub mod check;
pub mod complete;
pub mod move_node;
pub mod render;
pub mod tokens;

pub use check::{check, CheckArgs};
pub use complete::{complete, CompleteArgs};
pub use move_node::{move_node, MoveArgs};
pub use render::{render, RenderArgs};
pub use tokens::{tokens, TokensArgs};

use crate::config::Config;
use anyhow::{Context as _, Result};
use quill_editor::Source;
use quill_parser::Node;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read a file into a source named after the file
pub(crate) fn read_source(path: &Path) -> Result<Source> {
    let code = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "main".to_string());
    Ok(Source::new(&name, &code))
}

pub(crate) fn find_source_files(dir: &Path, config: &Config) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| path.is_file() && config.is_source_file(path))
        .collect();
    files.sort();
    files
}

/// First node whose text is exactly `text`, preferring the outermost
pub(crate) fn find_node(source: &Source, text: &str) -> Result<Node> {
    source
        .nodes()
        .into_iter()
        .find(|node| !node.same(source.program()) && node.to_text().trim() == text)
        .ok_or_else(|| anyhow::anyhow!("No node with text '{}' in {}", text, source.name()))
}

pub(crate) fn is_json(format: &str) -> Result<bool> {
    match format {
        "text" => Ok(false),
        "json" => Ok(true),
        other => Err(anyhow::anyhow!("Invalid format: {}. Use: text or json", other)),
    }
}
