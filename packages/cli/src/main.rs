mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    check, complete, move_node, render, tokens, CheckArgs, CompleteArgs, MoveArgs, RenderArgs, TokensArgs,
};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Quill CLI - structured editing from the command line
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of ./quill.config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the tokens of a file
    Tokens(TokensArgs),

    /// Report conflicts in a file or directory
    Check(CheckArgs),

    /// Suggest edits at an offset or for a selected node
    Complete(CompleteArgs),

    /// Rewrite a file with preferred spacing
    Render(RenderArgs),

    /// Drag a node to the insertion point nearest an offset
    Move(MoveArgs),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();
    let config = Config::load(&cwd, cli.config.as_deref())?;

    match cli.command {
        Command::Tokens(args) => tokens(args),
        Command::Check(args) => check(args, &config, &cwd),
        Command::Complete(args) => complete(args, &config),
        Command::Render(args) => render(args),
        Command::Move(args) => move_node(args),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
