use anyhow::Result;
use colored::Colorize;

use crate::Context;
use crate::cli::ConfigCommand;
use crate::schema::{ClusterConfig, HostSpec, Role};
use crate::{paths, ui};

pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => show(ctx, json),
        ConfigCommand::Path => path(ctx),
    }
}

fn show(ctx: &Context, json: bool) -> Result<()> {
    let (path, config) = super::load_config(ctx)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    ui::header("afsrobot Configuration");
    println!();
    ui::kv("File", &path.display().to_string());
    ui::kv("Cell", &config.cell.name);
    ui::kv("Admin", &config.cell.admin);
    ui::kv("Realm", &config.kerberos.realm);
    ui::kv("Credentials", mode_label(&config));
    ui::kv("afsutil", &config.afsutil);
    let log_dir = ctx.log_dir.as_deref().unwrap_or(&config.log_dir);
    ui::kv("Log directory", &log_dir.display().to_string());
    if !config.cell.top_volumes.is_empty() {
        ui::kv("Top volumes", &config.cell.top_volumes.join(", "));
    }

    ui::section("Hosts");
    for host in &config.hosts {
        let name = if host.is_local() {
            format!("{} ({})", host.name, config.local_hostname)
        } else {
            host.name.clone()
        };
        let installer = if host.is_managed() {
            host.installer.as_str().green()
        } else {
            host.installer.as_str().dimmed()
        };
        println!("  {:<32} {:<9} {}", name.bold(), installer, host_flags(host));
    }

    ui::section("Cell Servers");
    ui::kv("File servers", &list_or_none(&config.hostnames(Some(Role::FileServer), true)));
    ui::kv("Database servers", &list_or_none(&config.hostnames(Some(Role::DatabaseServer), true)));
    Ok(())
}

fn path(ctx: &Context) -> Result<()> {
    let path = paths::config_file(ctx.config.as_deref())?;
    println!("{}", path.display());
    if !path.exists() {
        ui::warn("File does not exist");
    }
    Ok(())
}

fn mode_label(config: &ClusterConfig) -> &'static str {
    if config.uses_impersonation() {
        "impersonate (fakekey)"
    } else {
        "keytab"
    }
}

/// Roles followed by the per-host switches that are turned on
fn host_flags(host: &HostSpec) -> String {
    let mut parts: Vec<&str> = host.roles().iter().map(Role::as_str).collect();
    for (on, label) in [
        (host.dynroot, "dynroot"),
        (host.setclock, "setclock"),
        (host.build, "build"),
        (host.nuke, "nuke"),
    ] {
        if on {
            parts.push(label);
        }
    }
    parts.join(" ")
}

fn list_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(" ")
    }
}
