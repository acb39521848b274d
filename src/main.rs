mod afsutil;
mod cli;
mod commands;
mod config;
mod engine;
mod error;
mod paths;
mod progress;
mod schema;
mod ui;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// `--config` / `AFSROBOT_CONFIG`
    pub config: Option<PathBuf>,
    /// `--log-dir`, overriding the config file
    pub log_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
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
        config: cli.config,
        log_dir: cli.log_dir,
    };
    log::debug!("verbosity {}", ctx.verbose);

    let result = match cli.command {
        Command::Setup(args) => commands::setup::run(&ctx, args),
        Command::Teardown(args) => commands::teardown::run(&ctx, args),
        Command::Login => commands::login::run(&ctx),
        Command::Check => commands::check::run(&ctx),
        Command::Config(cmd) => commands::config::run(&ctx, cmd),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "afsrobot", &mut io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ui::error(&err);
            ExitCode::FAILURE
        }
    }
}
