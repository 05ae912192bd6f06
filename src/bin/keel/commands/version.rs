//! `keel version`, `keel help-cmake` and `keel generators` commands
//!
//! These run CMake itself with the workspace's executable and print what it
//! says.

use std::sync::Arc;

use anyhow::{bail, Result};

use super::load_workspace;
use crate::cli::GlobalOpts;
use keel::builder::CMakeTask;
use keel::util::sink::{SectionSink, StdoutSink};
use keel::util::ExecOptions;

/// Heading that starts the generator list in `cmake --help`.
const GENERATORS_HEADING: &str = "Generators";

pub fn execute(global: &GlobalOpts) -> Result<()> {
    let ws = load_workspace(global)?;
    let task = CMakeTask::version(ws.configuration());
    task.run(&ExecOptions::new(Arc::new(StdoutSink)))?;
    Ok(())
}

pub fn help(global: &GlobalOpts) -> Result<()> {
    let ws = load_workspace(global)?;
    let task = CMakeTask::help(ws.configuration());
    task.run(&ExecOptions::new(Arc::new(StdoutSink)))?;
    Ok(())
}

pub fn generators(global: &GlobalOpts) -> Result<()> {
    let ws = load_workspace(global)?;
    let task = CMakeTask::generators(ws.configuration());

    let sink = Arc::new(SectionSink::new(GENERATORS_HEADING, Arc::new(StdoutSink)));
    task.run(&ExecOptions::new(sink.clone()))?;

    if !sink.started() {
        bail!(
            "`{}` printed no `{}` section",
            task.execution().program(),
            GENERATORS_HEADING
        );
    }
    Ok(())
}
