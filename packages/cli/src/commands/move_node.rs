use super::{find_node, read_source};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quill_editor::{drop_node_at_offset, Project};
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Quill file to edit
    pub input: PathBuf,

    /// Text of the node to move
    #[arg(long)]
    pub node: String,

    /// Offset, in graphemes, to drop the node nearest to
    #[arg(long)]
    pub to_offset: usize,

    /// Overwrite the file instead of printing
    #[arg(short, long)]
    pub write: bool,
}

pub fn move_node(args: MoveArgs) -> Result<()> {
    let source = read_source(&args.input)?;
    let project = Project::new(source.name(), vec![source.clone()]);
    let dragged = find_node(&source, &args.node)?;

    let (_, edited, _) = drop_node_at_offset(&project, &source, &dragged, args.to_offset)?;

    if args.write {
        fs::write(&args.input, edited.code().as_str())?;
        println!("{} {}", "✓".green(), args.input.display());
    } else {
        println!("{}", edited.code());
    }
    Ok(())
}
