//! `keel configure` command

use std::time::Instant;

use anyhow::Result;

use super::{load_workspace, qualified_name, select_targets, shell};
use crate::cli::{ConfigureArgs, GlobalOpts};
use keel::builder::CMakeTask;
use keel::util::shell::Status;
use keel::util::ExecOptions;

pub fn execute(args: ConfigureArgs, global: &GlobalOpts) -> Result<()> {
    let ws = load_workspace(global)?;
    let shell = shell(global);
    let selected = select_targets(&ws, &args.targets)?;

    if selected.is_empty() {
        shell.warn("no targets declared in the manifest");
        return Ok(());
    }

    let options = ExecOptions::default();
    let start = Instant::now();

    for (project, target) in &selected {
        let task = CMakeTask::configure(&ws, project, target);
        shell.status(
            Status::Configuring,
            format!("{} ({})", qualified_name(project, target), target.preset()),
        );
        shell.verbose(Status::Running, task.to_process()?.display_command());
        task.run(&options)?;
    }

    shell.finished(
        format!("configure of {} target(s)", selected.len()),
        start.elapsed(),
    );
    Ok(())
}
