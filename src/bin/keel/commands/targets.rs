//! `keel targets` command

use anyhow::Result;

use super::{load_workspace, qualified_name};
use crate::cli::GlobalOpts;

pub fn execute(global: &GlobalOpts) -> Result<()> {
    let ws = load_workspace(global)?;

    let rows: Vec<(String, &str)> = ws
        .targets()
        .map(|(project, target)| (qualified_name(project, target), target.preset()))
        .collect();
    let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

    for (name, preset) in rows {
        println!("{:<width$}  {}", name, preset, width = width);
    }

    Ok(())
}
