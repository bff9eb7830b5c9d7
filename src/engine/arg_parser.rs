use clap::Parser;
use std::path::PathBuf;

use crate::types::LinkType;

fn parse_link_type(s: &str) -> Result<LinkType, String> {
    s.parse()
}

/// Duplicate file finder and linker.
#[derive(Clone, Parser)]
#[command(name = "dupelink")]
#[command(about = "Scan directories for duplicate files; use --link to replace them with links.")]
pub struct Cli {
    /// Directories to scan. At least one.
    #[arg(value_name = "ROOT", required = true, num_args = 1..)]
    pub roots: Vec<PathBuf>,

    /// Report duplicates without touching the filesystem. Implied when
    /// --link is not given.
    #[arg(long)]
    pub dry_run: bool,

    /// Replace duplicates with links of this type ('hard' or 'soft').
    #[arg(long, short = 'l', value_parser = parse_link_type)]
    pub link: Option<LinkType>,

    /// Minimum file size in bytes to consider. Default: 1.
    #[arg(long, short = 'm')]
    pub min_size: Option<u64>,

    /// Directory basenames to skip entirely. Can specify multiple: -d a b c
    #[arg(long = "ignore-dir", short = 'd', num_args = 1..)]
    pub ignore_dirs: Vec<String>,

    /// File extensions to skip, with or without a leading dot, any case.
    #[arg(long = "ignore-ext", short = 'e', num_args = 1..)]
    pub ignore_exts: Vec<String>,

    /// Write scan_results_<id>.json to the first root on completion.
    #[arg(long, short = 's')]
    pub save: bool,

    /// Verbose output with a progress bar. Default: false.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
