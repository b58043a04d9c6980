mod cli;
mod commands;
mod config;
mod paths;
mod progress;
mod providers;
mod runner;
mod stacks;
mod state;
mod terraform;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use stackgraph::Operation;
use std::io;
use std::path::PathBuf;

use crate::config::DevstackConfig;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Resolved configuration file; it may not exist
    pub config_file: PathBuf,
}

impl Context {
    /// Load and validate the configuration
    pub fn load_config(&self) -> Result<DevstackConfig> {
        let config = DevstackConfig::load(&self.config_file)?;
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config_file: paths::config_file(cli.config.as_deref()),
    };
    log::debug!("config file: {}", ctx.config_file.display());

    match cli.command {
        Command::Synth(args) => commands::synth::run(&ctx, args),
        Command::List { app } => commands::list::run(&ctx, app),
        Command::Graph(args) => commands::graph::run(&ctx, args),
        Command::Deploy(args) => commands::deploy::run(&ctx, args, Operation::Deploy),
        Command::Destroy(args) => commands::deploy::run(&ctx, args, Operation::Destroy),
        Command::Outputs(args) => commands::outputs::extract(&ctx, args),
        Command::DevVars(args) => commands::outputs::dev_vars(&ctx, args),
        Command::Doctor => commands::doctor::run(&ctx),
        Command::Config(cmd) => commands::config::run(&ctx, cmd),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "devstack", &mut io::stdout());
            Ok(())
        }
    }
}
