//! Command line interface definitions.

use std::path::PathBuf;

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};

/// Top-level CLI entry point.
#[derive(Debug, Parser)]
#[command(
    name = "blobproc",
    version,
    about = "Post-processing pipeline for spooled PDF documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// Increase logging verbosity (-v, -vv).
    #[arg(global = true, short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn print_help() {
        let mut cmd = Cli::command();
        let _ = cmd.print_help();
        println!();
    }
}

/// Supported subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the ingress HTTP service that accepts PDF uploads.
    Serve(ServeArgs),
    /// Walk the spool once and derive artifacts for every file.
    Run(RunArgs),
    /// Derive artifacts for a single file with local tools only and
    /// print the result as JSON.
    Extract(ExtractArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Override the configured listen address, e.g. 0.0.0.0:8000.
    #[arg(long)]
    pub listen: Option<String>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Override the configured worker count.
    #[arg(long)]
    pub workers: Option<usize>,
    /// Keep files in the spool after processing, for debugging.
    #[arg(short = 'k', long = "keep")]
    pub keep: bool,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// PDF file to process.
    pub input: PathBuf,
}
