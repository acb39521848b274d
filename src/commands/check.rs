use anyhow::{Result, bail};
use colored::Colorize;

use crate::Context;
use crate::engine::{CheckOutcome, NoProgress, Orchestrator};
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let (path, config) = super::load_config(ctx)?;
    let (sink, log_path) = super::open_log(ctx, &config, "check.log")?;

    if !ctx.quiet {
        ui::header("Host Access Check");
        ui::kv("Config", &path.display().to_string());
        println!();
    }

    let report = Orchestrator::new(&config, super::runner(false), NoProgress, sink)
        .check()
        .map_err(|e| super::report(e, &log_path))?;

    for (host, outcome) in &report.hosts {
        match outcome {
            CheckOutcome::Ok => {
                if !ctx.quiet {
                    println!("  {} {}", "✓".green(), host);
                }
            }
            CheckOutcome::Denied(denial) => {
                println!("  {} {} {}", "✗".red(), host, denial.to_string().dimmed());
                println!("      {} {}", "Fix:".cyan(), denial.advice());
            }
            CheckOutcome::Failed(message) => {
                println!("  {} {} {}", "✗".red(), host, message.dimmed());
            }
        }
    }

    if !report.is_success() {
        println!();
        ui::dim(&format!("Details: {}", log_path.display()));
        bail!(
            "{} of {} hosts failed the access check",
            report.failed(),
            report.hosts.len()
        );
    }

    if !ctx.quiet {
        println!();
        ui::success("All hosts reachable with passwordless sudo");
    }
    Ok(())
}
