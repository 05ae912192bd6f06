//! CMake tasks.
//!
//! Every target has a configure task and a build task. A task is derived
//! from the target's final configuration when it is created, so callers
//! create tasks right before running them.

use thiserror::Error;

use crate::core::configuration::{Configuration, ExecutionConfiguration};
use crate::core::params::Params;
use crate::core::project::Project;
use crate::core::target::Target;
use crate::core::workspace::Workspace;
use crate::util::diagnostic::{hints, Diagnostic};
use crate::util::process::{find_executable, ExecOptions, ProcessBuilder, ProcessError};

/// What a task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Configure,
    Build,
    Version,
    Help,
    Generators,
}

impl TaskKind {
    fn prefix(self) -> &'static str {
        match self {
            TaskKind::Configure => "cmakeConfigure",
            TaskKind::Build => "cmakeBuild",
            TaskKind::Version => "cmakeVersion",
            TaskKind::Help => "cmakeHelp",
            TaskKind::Generators => "cmakeGenerators",
        }
    }
}

/// Failure of a CMake task.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Raised before anything is spawned.
    #[error("{task}: no {what} directory is configured")]
    MissingDirectory { task: String, what: &'static str },

    #[error("{task} failed")]
    Process {
        task: String,
        #[source]
        source: ProcessError,
    },
}

impl ActionError {
    pub fn task(&self) -> &str {
        match self {
            ActionError::MissingDirectory { task, .. } | ActionError::Process { task, .. } => task,
        }
    }

    /// Exit code of a CMake run that failed.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ActionError::Process { source, .. } => source.exit_code(),
            ActionError::MissingDirectory { .. } => None,
        }
    }

    /// Whether CMake ran and rejected its input.
    pub fn is_tool_failure(&self) -> bool {
        matches!(self, ActionError::Process { source, .. } if source.is_non_zero_exit())
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());

        match self {
            ActionError::MissingDirectory { what, .. } => diag.with_suggestion(format!(
                "Set `{}-dir` under `config-params`, or stop removing it",
                what
            )),
            ActionError::Process { source, .. } => {
                let diag = diag.with_context(source.to_string());
                match source {
                    ProcessError::Spawn { program, .. } if source.is_not_found() => {
                        let diag = diag.with_context(format!("`{}` is not on PATH", program));
                        match find_executable("cmake") {
                            Some(found) => diag.with_suggestion(format!(
                                "Set `executable = \"{}\"` under `[cmake]`",
                                found.display()
                            )),
                            None => diag.with_suggestion("Install CMake and make sure it is on PATH"),
                        }
                    }
                    ProcessError::NonZeroExit { .. } => diag.with_suggestion(hints::TOOL_FAILED),
                    _ => diag,
                }
            }
        }
    }
}

/// A runnable CMake invocation.
#[derive(Debug, Clone)]
pub struct CMakeTask {
    name: String,
    kind: TaskKind,
    execution: ExecutionConfiguration,
}

impl CMakeTask {
    pub fn new(name: impl Into<String>, kind: TaskKind, execution: ExecutionConfiguration) -> Self {
        CMakeTask {
            name: name.into(),
            kind,
            execution,
        }
    }

    /// The configure task of `target`.
    pub fn configure(ws: &Workspace, project: &Project, target: &Target) -> Self {
        let execution = ws.final_configuration(project, target).for_configure();
        CMakeTask::new(
            task_name(TaskKind::Configure, project, target),
            TaskKind::Configure,
            execution,
        )
    }

    /// The build task of `target`.
    pub fn build(ws: &Workspace, project: &Project, target: &Target) -> Self {
        let execution = ws.final_configuration(project, target).for_build();
        CMakeTask::new(
            task_name(TaskKind::Build, project, target),
            TaskKind::Build,
            execution,
        )
    }

    /// `cmake --version` with the executable of `config`.
    pub fn version(config: &Configuration) -> Self {
        Self::auxiliary(TaskKind::Version, config, "--version")
    }

    /// `cmake --help` with the executable of `config`.
    pub fn help(config: &Configuration) -> Self {
        Self::auxiliary(TaskKind::Help, config, "--help")
    }

    /// `cmake --help`, meant to be read through a generators section sink.
    pub fn generators(config: &Configuration) -> Self {
        Self::auxiliary(TaskKind::Generators, config, "--help")
    }

    fn auxiliary(kind: TaskKind, config: &Configuration, flag: &str) -> Self {
        let execution = ExecutionConfiguration {
            executable: config.executable.clone(),
            working_folder: config.working_folder.clone(),
            params: Params::raw([flag]),
        };
        CMakeTask::new(kind.prefix(), kind, execution)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn execution(&self) -> &ExecutionConfiguration {
        &self.execution
    }

    /// Program followed by its arguments.
    pub fn command_line(&self) -> Vec<String> {
        self.execution.command_line()
    }

    /// Check the directories this task cannot run without.
    pub fn validate(&self) -> Result<(), ActionError> {
        let required: &[(&str, &'static str)] = match self.kind {
            TaskKind::Configure => &[("-S", "source"), ("-B", "build")],
            TaskKind::Build => &[("--build", "build")],
            TaskKind::Version | TaskKind::Help | TaskKind::Generators => &[],
        };

        for &(option, what) in required {
            if self.execution.params.find_value(option).is_none() {
                return Err(ActionError::MissingDirectory {
                    task: self.name.clone(),
                    what,
                });
            }
        }
        Ok(())
    }

    /// The process this task would spawn.
    pub fn to_process(&self) -> Result<ProcessBuilder, ActionError> {
        let process = ProcessBuilder::from_command_line(&self.command_line()).map_err(|source| {
            ActionError::Process {
                task: self.name.clone(),
                source,
            }
        })?;

        Ok(match self.execution.working_folder {
            Some(ref folder) => process.cwd(folder),
            None => process,
        })
    }

    /// Validate, then run to completion.
    pub fn run(&self, options: &ExecOptions) -> Result<(), ActionError> {
        self.validate()?;
        let process = self.to_process()?;

        tracing::debug!("{}: {}", self.name, process.display_command());

        process
            .exec_streaming(options)
            .map_err(|source| ActionError::Process {
                task: self.name.clone(),
                source,
            })?;
        Ok(())
    }
}

/// `cmakeConfigureNativeArm64` for target `arm64` of project `native`.
pub fn task_name(kind: TaskKind, project: &Project, target: &Target) -> String {
    format!(
        "{}{}{}",
        kind.prefix(),
        capitalize(project.name()),
        capitalize(target.name())
    )
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
