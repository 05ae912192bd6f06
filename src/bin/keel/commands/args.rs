//! `keel args` command
//!
//! Prints the final CMake invocation of a target without running it.

use anyhow::Result;
use serde_json::json;

use super::load_workspace;
use crate::cli::{ArgsArgs, GlobalOpts};
use keel::builder::CMakeTask;
use keel::util::args::display_command;

pub fn execute(args: ArgsArgs, global: &GlobalOpts) -> Result<()> {
    let ws = load_workspace(global)?;
    let (project, target) = ws.resolve_target(&args.target)?;

    let task = if args.build {
        CMakeTask::build(&ws, project, target)
    } else {
        CMakeTask::configure(&ws, project, target)
    };
    let execution = task.execution();

    if args.json {
        let value = json!({
            "task": task.name(),
            "project": project.name(),
            "target": target.name(),
            "preset": target.preset(),
            "program": execution.program(),
            "args": execution.args(),
            "working_folder": execution.working_folder,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", display_command(&task.command_line()));
    }

    Ok(())
}
