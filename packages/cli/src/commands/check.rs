use super::{find_source_files, is_json, read_source};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quill_inference::format_conflicts;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Quill file or directory to check (defaults to the configured srcDir)
    pub input: Option<PathBuf>,

    /// Print files without conflicts too
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn check(args: CheckArgs, config: &Config, cwd: &str) -> Result<()> {
    let json = is_json(&args.format)?;
    let input = args.input.clone().unwrap_or_else(|| config.get_src_dir(cwd));

    let files = if input.is_file() {
        vec![input.clone()]
    } else if input.is_dir() {
        find_source_files(&input, config)
    } else {
        return Err(anyhow::anyhow!("Input path does not exist: {}", input.display()));
    };

    if !json {
        println!("🔍 {} Quill check", "Starting".green().bold());
        println!("   Input: {}", input.display());
        println!("   Found {} source files", files.len());
        println!();
    }

    let mut total_conflicts = 0;
    let mut reports = Vec::new();
    for file in &files {
        let conflicts = check_file(file, args.verbose, json, &mut reports)?;
        total_conflicts += conflicts;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!(
            "✨ {} Check complete!",
            if total_conflicts > 0 {
                "Done".red().bold()
            } else {
                "Done".green().bold()
            }
        );
        println!("   Files checked: {}", files.len());
        if total_conflicts > 0 {
            println!("   {} {}", "Conflicts:".yellow(), total_conflicts);
        } else {
            println!("   {} No conflicts found!", "✓".green());
        }
    }

    if total_conflicts > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn check_file(file: &Path, verbose: bool, json: bool, reports: &mut Vec<serde_json::Value>) -> Result<usize> {
    let source = read_source(file)?;
    let conflicts = source.context().conflicts();
    debug!(file = %file.display(), conflicts = conflicts.len(), "checked");

    if json {
        reports.push(serde_json::json!({
            "file": file.display().to_string(),
            "conflicts": conflicts,
        }));
    } else if conflicts.is_empty() {
        if verbose {
            println!("{} {}", "✓".green(), file.display());
        }
    } else {
        let filename = file.display().to_string();
        print!(
            "{}",
            format_conflicts(source.code().as_str(), &filename, source.program(), &conflicts)
        );
        println!();
    }
    Ok(conflicts.len())
}
