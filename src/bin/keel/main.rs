//! Keel CLI - a composable CMake configure/build driver

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use keel::builder::ActionError;
use keel::core::{ConfigError, ManifestError};
use keel::util::diagnostic;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = commands::shell(&cli.global).use_color();

    if let Err(e) = run(cli) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.global.verbose {
        EnvFilter::new("keel=debug")
    } else if cli.global.quiet {
        EnvFilter::new("keel=warn")
    } else {
        EnvFilter::new("keel=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(!cli.global.no_color)
        .init();

    let global = cli.global;
    match cli.command {
        Commands::Configure(args) => commands::configure::execute(args, &global),
        Commands::Build(args) => commands::build::execute(args, &global),
        Commands::Args(args) => commands::args::execute(args, &global),
        Commands::Targets => commands::targets::execute(&global),
        Commands::Presets => commands::presets::execute(&global),
        Commands::Clean => commands::clean::execute(&global),
        Commands::Version => commands::version::execute(&global),
        Commands::HelpCmake => commands::version::help(&global),
        Commands::Generators => commands::version::generators(&global),
        Commands::Completions(args) => commands::completions::execute(args, &global),
    }
}

/// Print a structured diagnostic when the chain carries one of our typed
/// errors, otherwise the plain error chain.
fn report(error: &anyhow::Error, color: bool) {
    for (depth, cause) in error.chain().enumerate() {
        let diagnostic = if let Some(e) = cause.downcast_ref::<ConfigError>() {
            e.to_diagnostic()
        } else if let Some(e) = cause.downcast_ref::<ManifestError>() {
            e.to_diagnostic()
        } else if let Some(e) = cause.downcast_ref::<ActionError>() {
            e.to_diagnostic()
        } else {
            continue;
        };

        // Context added on top of the typed error goes first.
        let diagnostic = error
            .chain()
            .take(depth)
            .fold(diagnostic, |d, context| d.with_context(context.to_string()));

        diagnostic::emit(&diagnostic, color);
        return;
    }

    eprintln!("error: {:#}", error);
}
