use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "jass")]
#[command(about = "JASS parser, type checker and leak finder")]
pub struct Cli {
    /// Project configuration with [limits] and [destructors] tables
    #[arg(long, global = true, default_value = "jass.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse JASS files and print them back
    Parse(FilesArgs),
    /// Parse and type check JASS files, printing every report
    Check(FilesArgs),
    /// List handle variables that are never destroyed
    Leaks(FilesArgs),
}

#[derive(clap::Args)]
pub struct FilesArgs {
    /// Input files, parsed in order into one session
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}
