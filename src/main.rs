//! # groot CLI
//!
//! This is the binary entry point for the `groot` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Handling top-level application errors and translating them into user-friendly
//!   output.
//!
//! The orchestration logic lives in the `groot` library crate; the binary is a
//! thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let argv = cli::rewrite_in_option(std::env::args().collect());
    let cli = cli::Cli::parse_from(argv);
    cli.execute()
}
