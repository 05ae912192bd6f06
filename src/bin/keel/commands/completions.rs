//! `keel completions` command
//!
//! Prints the completion script for `keel` and all of its subcommands, or
//! writes it into a completions directory with `--dir`.

use std::io;

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::{generate, generate_to};

use super::shell;
use crate::cli::{Cli, CompletionsArgs, GlobalOpts};
use keel::util::shell::Status;

const BIN_NAME: &str = "keel";

pub fn execute(args: CompletionsArgs, global: &GlobalOpts) -> Result<()> {
    let mut cmd = Cli::command();

    let Some(dir) = args.dir else {
        generate(args.shell, &mut cmd, BIN_NAME, &mut io::stdout());
        return Ok(());
    };

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let path = generate_to(args.shell, &mut cmd, BIN_NAME, &dir)
        .with_context(|| format!("failed to write {} completions", args.shell))?;
    shell(global).status(Status::Finished, format!("wrote {}", path.display()));

    Ok(())
}
