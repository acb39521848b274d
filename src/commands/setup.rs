use anyhow::Result;

use crate::Context;
use crate::cli::RunArgs;
use crate::engine::Orchestrator;
use crate::progress::ConsoleProgress;
use crate::ui;

pub fn run(ctx: &Context, args: RunArgs) -> Result<()> {
    let (_, config) = super::load_config(ctx)?;
    let (sink, log_path) = super::open_log(ctx, &config, "setup.log")?;

    if !ctx.quiet {
        ui::header(&format!("Setting up cell {}", config.cell.name));
        if args.dry_run {
            ui::info("Dry run - commands are written to the log, nothing is executed");
        }
    }

    let progress = ConsoleProgress::new(&log_path, ctx.quiet);
    let runner = super::runner(args.dry_run);
    Orchestrator::new(&config, runner, progress, sink)
        .setup()
        .map_err(|e| super::report(e, &log_path))?;

    if !ctx.quiet {
        println!();
        ui::success(&format!("Cell {} is up", config.cell.name));
        ui::dim(&format!("Log: {}", log_path.display()));
    }
    Ok(())
}
