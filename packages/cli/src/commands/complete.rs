use super::{find_node, is_json, read_source};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quill_editor::{get_edits_at, Caret, Project};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// Quill file to complete in
    pub input: PathBuf,

    /// Caret offset, in graphemes
    #[arg(long, conflicts_with = "select", required_unless_present = "select")]
    pub offset: Option<usize>,

    /// Select the first node with exactly this text
    #[arg(long)]
    pub select: Option<String>,

    /// Apply the suggestion with this number and print the result
    #[arg(long)]
    pub apply: Option<usize>,

    /// Overwrite the file with the applied suggestion
    #[arg(short, long, requires = "apply")]
    pub write: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn complete(args: CompleteArgs, config: &Config) -> Result<()> {
    let json = is_json(&args.format)?;
    let source = read_source(&args.input)?;
    let project = Project::new(source.name(), vec![source.clone()]).with_locales(config.locales.clone());

    let caret = match (&args.select, args.offset) {
        (Some(text), _) => Caret::selecting(source.clone(), find_node(&source, text)?),
        (None, Some(offset)) => Caret::at(source.clone(), offset),
        (None, None) => return Err(anyhow::anyhow!("Give --offset or --select")),
    };

    let mut transforms = get_edits_at(&project, &caret);
    transforms.truncate(config.max_suggestions);

    if let Some(number) = args.apply {
        let transform = transforms
            .get(number)
            .ok_or_else(|| anyhow::anyhow!("No suggestion {} ({} offered)", number, transforms.len()))?;
        let edit = transform.edit(project.locales())?;
        if args.write {
            fs::write(&args.input, edit.source.code().as_str())?;
            println!("{} {}", "✓".green(), args.input.display());
        } else {
            println!("{}", edit.source.code());
        }
        return Ok(());
    }

    if json {
        let summaries: Vec<_> = transforms.iter().map(|t| t.summary(project.locales())).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if transforms.is_empty() {
        println!("{}", "No suggestions".dimmed());
        return Ok(());
    }
    for (number, transform) in transforms.iter().enumerate() {
        let summary = transform.summary(project.locales());
        println!(
            "{:>3}  {:<7} {}  {}",
            number,
            format!("{:?}", summary.kind).cyan(),
            summary.text.bold(),
            format!("({})", summary.target).dimmed()
        );
    }
    Ok(())
}
