use super::{is_json, read_source};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct TokensArgs {
    /// Quill file to tokenize
    pub input: PathBuf,

    /// Print the node outline instead of the token list
    #[arg(long)]
    pub tree: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn tokens(args: TokensArgs) -> Result<()> {
    let json = is_json(&args.format)?;
    let source = read_source(&args.input)?;

    if json {
        let tokens: Vec<_> = source.tokens().iter().filter_map(|t| t.as_token()).collect();
        println!("{}", serde_json::to_string_pretty(&tokens)?);
        return Ok(());
    }

    if args.tree {
        println!("{}", source.program().describe(0));
        return Ok(());
    }

    println!("{} {}", "Tokens of".bold(), args.input.display());
    for token in source.tokens().iter().filter_map(|t| t.as_token()) {
        println!("  {}", token.describe());
    }
    Ok(())
}
