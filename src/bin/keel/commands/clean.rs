//! `keel clean` command

use anyhow::{Context, Result};

use super::{load_workspace, shell};
use crate::cli::GlobalOpts;
use keel::util::fs::{ensure_not_ancestor, remove_dir_all_if_exists};
use keel::util::shell::Status;

pub fn execute(global: &GlobalOpts) -> Result<()> {
    let ws = load_workspace(global)?;
    let shell = shell(global);

    let working_folder = ws
        .configuration()
        .working_folder
        .clone()
        .context("the workspace has no working folder")?;

    ensure_not_ancestor(&working_folder, ws.root())?;

    if remove_dir_all_if_exists(&working_folder)? {
        shell.status(Status::Removed, working_folder.display());
    } else {
        shell.verbose(
            Status::Skipped,
            format!("{} does not exist", working_folder.display()),
        );
    }

    Ok(())
}
