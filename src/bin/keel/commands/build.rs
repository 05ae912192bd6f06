//! `keel build` command

use std::time::Instant;

use anyhow::Result;

use super::{load_workspace, qualified_name, select_targets, shell};
use crate::cli::{BuildArgs, GlobalOpts};
use keel::builder::CMakeTask;
use keel::util::shell::Status;
use keel::util::ExecOptions;

pub fn execute(args: BuildArgs, global: &GlobalOpts) -> Result<()> {
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
        let name = qualified_name(project, target);

        // A build directory only exists once configure has run.
        let configure = CMakeTask::configure(&ws, project, target);
        shell.status(
            Status::Configuring,
            format!("{} ({})", name, target.preset()),
        );
        shell.verbose(Status::Running, configure.to_process()?.display_command());
        configure.run(&options)?;

        let build = CMakeTask::build(&ws, project, target);
        shell.status(Status::Building, &name);
        shell.verbose(Status::Running, build.to_process()?.display_command());
        build.run(&options)?;
    }

    shell.finished(
        format!("build of {} target(s)", selected.len()),
        start.elapsed(),
    );
    Ok(())
}
