// Cluster runs
pub mod check;
pub mod login;
pub mod setup;
pub mod teardown;

// Configuration inspection
pub mod config;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use hostexec::{CommandRunner, DryRunRunner, LogSink, ProcessRunner};

use crate::Context;
use crate::config as loader;
use crate::error::RunError;
use crate::paths;
use crate::schema::ClusterConfig;
use crate::ui;

/// Resolve and load the configuration for this invocation
pub fn load_config(ctx: &Context) -> Result<(PathBuf, ClusterConfig)> {
    let path = paths::config_file(ctx.config.as_deref())?;
    let config = loader::load(&path)?;
    Ok((path, config))
}

/// Open `<log dir>/<name>`, truncating the previous run's log
pub fn open_log(ctx: &Context, config: &ClusterConfig, name: &str) -> Result<(LogSink, PathBuf)> {
    let dir = ctx.log_dir.as_deref().unwrap_or(&config.log_dir);
    let path = dir.join(name);
    let sink = LogSink::open(&path)
        .with_context(|| format!("Could not open run log {}", path.display()))?;
    Ok((sink, path))
}

pub fn runner(dry_run: bool) -> &'static dyn CommandRunner {
    if dry_run {
        &DryRunRunner
    } else {
        &ProcessRunner
    }
}

/// Print the details an operator needs, then hand the error to `main`
pub fn report(err: RunError, log_path: &Path) -> anyhow::Error {
    if let (Some(phase), Some(host)) = (err.phase(), err.host()) {
        let code = err.exit_code().unwrap_or(-1);
        log::info!("Run stopped in {phase} on {host} with exit code {code}");
    }
    if let RunError::CommandFailed { output, .. } = &err {
        for line in output.iter().rev().take(5).rev() {
            ui::dim(line);
        }
    }
    if let Some(advice) = err.advice() {
        ui::warn(advice);
    }
    ui::dim(&format!("Full output: {}", log_path.display()));
    anyhow::Error::new(err)
}
