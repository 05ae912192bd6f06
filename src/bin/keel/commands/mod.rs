//! Command implementations

pub mod args;
pub mod build;
pub mod clean;
pub mod completions;
pub mod configure;
pub mod presets;
pub mod targets;
pub mod version;

use std::env;

use anyhow::{Context, Result};

use crate::cli::GlobalOpts;
use keel::core::{find_manifest, Project, Target, Workspace};
use keel::util::shell::{ColorChoice, Shell};

/// Load the workspace named by `--manifest-path`, or the nearest Keel.toml,
/// with `-P` properties applied.
pub fn load_workspace(global: &GlobalOpts) -> Result<Workspace> {
    let manifest_path = match global.manifest_path {
        Some(ref path) => path.clone(),
        None => {
            let cwd = env::current_dir().context("failed to get current directory")?;
            find_manifest(&cwd)?
        }
    };

    let mut ws = Workspace::load(&manifest_path)?;
    for property in &global.properties {
        ws.set_property_arg(property)?;
    }
    ws.apply_properties();

    tracing::debug!(
        "loaded workspace `{}` from {}",
        ws.name(),
        manifest_path.display()
    );
    Ok(ws)
}

/// The targets named on the command line, or all of them in declaration order.
pub fn select_targets<'a>(
    ws: &'a Workspace,
    specs: &[String],
) -> Result<Vec<(&'a Project, &'a Target)>> {
    if specs.is_empty() {
        return Ok(ws.targets().collect());
    }

    let mut selected = Vec::with_capacity(specs.len());
    for spec in specs {
        selected.push(ws.resolve_target(spec)?);
    }
    Ok(selected)
}

pub fn shell(global: &GlobalOpts) -> Shell {
    let color = if global.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    Shell::from_flags(global.quiet, global.verbose, color)
}

/// `project:target`
pub fn qualified_name(project: &Project, target: &Target) -> String {
    format!("{}:{}", project.name(), target.name())
}
