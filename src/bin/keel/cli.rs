//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Keel - a composable CMake configure/build driver
#[derive(Parser)]
#[command(name = "keel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Path to Keel.toml (searched upward from the current directory by default)
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Set a property, e.g. `-P arm64.sysRoot=/opt/sysroot`
    #[arg(short = 'P', long = "property", global = true, value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the CMake configure step of targets
    Configure(ConfigureArgs),

    /// Configure, then build targets
    Build(BuildArgs),

    /// Print the final CMake arguments of a target without running them
    Args(ArgsArgs),

    /// List declared targets and their presets
    Targets,

    /// List available target presets
    Presets,

    /// Remove the CMake working folder
    Clean,

    /// Show the CMake version
    Version,

    /// Show CMake's own help
    HelpCmake,

    /// List the generators CMake supports
    Generators,

    /// Generate shell completions for keel
    #[command(after_help = COMPLETIONS_HELP)]
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct ConfigureArgs {
    /// Targets as `project:target` or `target` (all targets if omitted)
    pub targets: Vec<String>,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Targets as `project:target` or `target` (all targets if omitted)
    pub targets: Vec<String>,
}

#[derive(Args)]
pub struct ArgsArgs {
    /// Target as `project:target` or `target`
    pub target: String,

    /// Show the build step instead of the configure step
    #[arg(long)]
    pub build: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

const COMPLETIONS_HELP: &str = "\
Examples:
  keel completions bash > ~/.local/share/bash-completion/completions/keel
  keel completions zsh --dir ~/.zfunc
  keel completions fish --dir ~/.config/fish/completions";

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script into this directory instead of stdout
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}
