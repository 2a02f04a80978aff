use super::read_source;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quill_editor::Spaces;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Quill file to render
    pub input: PathBuf,

    /// Overwrite the file instead of printing
    #[arg(short, long)]
    pub write: bool,
}

/// Render a file with every token at its preferred spacing
pub fn render(args: RenderArgs) -> Result<()> {
    let source = read_source(&args.input)?;
    let normalized = source.with_spaces(Spaces::new().with_preferred_space(source.program()));
    let code = normalized.code().as_str();

    if args.write {
        if code != source.code().as_str() {
            fs::write(&args.input, code)?;
            println!("{} {}", "✓".green(), args.input.display());
        } else {
            println!("{} {} (unchanged)", "✓".green(), args.input.display());
        }
    } else {
        println!("{}", code);
    }
    Ok(())
}
