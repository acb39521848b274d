use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::paths::ENV_CONFIG;

#[derive(Parser)]
#[command(name = "afsrobot")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Stand up and tear down OpenAFS test cells", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: ./afsrobot.toml, then ~/.config/afsrobot/afsrobot.toml)
    #[arg(short, long, global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Directory for run logs, overriding `log_dir` in the config file
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install, start and create the test cell on every configured host
    Setup(RunArgs),

    /// Stop and purge the installation on every configured host
    Teardown(TeardownArgs),

    /// Obtain an admin token on this machine
    Login,

    /// Verify ssh and passwordless sudo on every configured host
    Check,

    /// Inspect the configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Log the commands that would run without running them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct TeardownArgs {
    /// Log the commands that would run without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved configuration and host roles
    Show {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the path of the configuration file in use
    Path,
}
