use anyhow::Result;

use crate::Context;
use crate::engine::Orchestrator;
use crate::progress::ConsoleProgress;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let (_, config) = super::load_config(ctx)?;
    let (sink, log_path) = super::open_log(ctx, &config, "login.log")?;

    let progress = ConsoleProgress::new(&log_path, ctx.quiet);
    Orchestrator::new(&config, super::runner(false), progress, sink)
        .login()
        .map_err(|e| super::report(e, &log_path))?;

    if !ctx.quiet {
        ui::success(&format!(
            "Logged in as {} in cell {}",
            config.cell.admin, config.cell.name
        ));
    }
    Ok(())
}
