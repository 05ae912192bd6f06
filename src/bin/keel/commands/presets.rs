//! `keel presets` command

use anyhow::Result;

use super::load_workspace;
use crate::cli::GlobalOpts;

pub fn execute(global: &GlobalOpts) -> Result<()> {
    let ws = load_workspace(global)?;

    for name in ws.presets().names() {
        println!("{}", name);
    }

    Ok(())
}
