mod config;
mod logger;
mod sidecar;

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::sidecar::Sidecar;

#[derive(Parser)]
#[command(author, version, name = env!("CARGO_BIN_NAME"), about = "Find sidecar files next to raw files and move them to a separate directory")]
struct Args {
    /// Optional search directory, defaults to the current directory
    #[arg(value_hint = clap::ValueHint::DirPath)]
    path: Option<PathBuf>,

    /// Raw file suffix or extension (default: CR2)
    #[arg(short, long, name = "RAW")]
    raw: Option<String>,

    /// Sidecar file suffix or extension (default: xmp)
    #[arg(short, long, name = "SIDECAR")]
    sidecar: Option<String>,

    /// Require sidecar and raw file modification times to be equal
    #[arg(short, long)]
    time: bool,

    /// Destination directory to dump the sidecar files into
    #[arg(short, long, name = "DEST", value_hint = clap::ValueHint::DirPath)]
    dest: Option<PathBuf>,

    /// Dump folder name created under the destination, derived from the search path by default
    #[arg(short, long, name = "NAME")]
    name: Option<String>,

    /// Auto-confirm the move without asking
    #[arg(short, long)]
    auto: bool,

    /// Only print planned moves without moving files
    #[arg(short, long)]
    print: bool,

    /// Include hidden files and directories
    #[arg(short = 'H', long)]
    hidden: bool,

    /// Write a log file of moved files
    #[arg(short = 'L', long)]
    log: bool,

    /// Print debug information
    #[arg(short = 'D', long)]
    debug: bool,

    /// Generate shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(ref shell) = args.completion {
        sidecar_dump::generate_shell_completion(*shell, Args::command(), true, env!("CARGO_BIN_NAME"))
    } else {
        Sidecar::new(args)?.run()
    }
}
