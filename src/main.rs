//! Dupelink CLI: find duplicate files and replace them with links.

use anyhow::Result;
use clap::Parser;
use dupelink::engine::arg_parser::Cli;
use dupelink::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    let code = handle_run(&cli)?;

    log::debug!("Total time: {:?}", start_time.elapsed());
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
