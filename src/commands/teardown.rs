use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm;

use crate::Context;
use crate::cli::TeardownArgs;
use crate::engine::Orchestrator;
use crate::progress::ConsoleProgress;
use crate::schema::{ClusterConfig, HostSpec};
use crate::ui;

pub fn run(ctx: &Context, args: TeardownArgs) -> Result<()> {
    let (_, config) = super::load_config(ctx)?;

    if !ctx.quiet {
        ui::header(&format!("Tearing down cell {}", config.cell.name));
        for host in config.managed_hosts() {
            ui::kv(&host.name, &component_list(host));
        }
    }

    let ask = !args.yes && !args.dry_run && console::user_attended();
    if ask && !confirm_teardown(&config)? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(());
    }

    let (sink, log_path) = super::open_log(ctx, &config, "teardown.log")?;
    let progress = ConsoleProgress::new(&log_path, ctx.quiet);
    let runner = super::runner(args.dry_run);
    Orchestrator::new(&config, runner, progress, sink)
        .teardown()
        .map_err(|e| super::report(e, &log_path))?;

    if !ctx.quiet {
        println!();
        ui::success("Teardown complete");
        ui::dim(&format!("Log: {}", log_path.display()));
    }
    Ok(())
}

fn component_list(host: &HostSpec) -> String {
    let components: Vec<_> = host.components().iter().map(|c| c.as_str()).collect();
    if components.is_empty() {
        "nothing installed".to_string()
    } else {
        components.join(", ")
    }
}

fn confirm_teardown(config: &ClusterConfig) -> Result<bool> {
    println!();
    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Stop and purge OpenAFS on {} hosts?",
            config.managed_hosts().count()
        ))
        .default(false)
        .interact()?;
    Ok(confirmed)
}
