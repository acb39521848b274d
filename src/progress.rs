//! Terminal progress for cluster runs.
//!
//! Attended sessions get an indicatif spinner per step; otherwise each step
//! prints a plain "Installing on alpha... ok" line that reads well in CI logs.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::{Phase, Progress};

/// Create a spinner with a message
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Progress printed to stdout, pointing at the run log on failure
pub struct ConsoleProgress {
    log_path: PathBuf,
    attended: bool,
    quiet: bool,
    current: Option<ProgressBar>,
}

impl ConsoleProgress {
    pub fn new(log_path: impl Into<PathBuf>, quiet: bool) -> Self {
        Self {
            log_path: log_path.into(),
            attended: console::user_attended(),
            quiet,
            current: None,
        }
    }

    fn label(phase: Phase, host: &str) -> String {
        format!("{} on {}...", phase.verb(), host)
    }
}

impl Progress for ConsoleProgress {
    fn on_phase_start(&mut self, phase: Phase) {
        log::debug!("Starting phase {phase}");
    }

    fn on_step_start(&mut self, phase: Phase, host: &str) {
        if self.quiet {
            return;
        }
        let label = Self::label(phase, host);
        if self.attended {
            self.current = Some(spinner(&label));
        } else {
            print!("{label} ");
            let _ = io::stdout().flush();
        }
    }

    fn on_step_complete(&mut self, phase: Phase, host: &str, ok: bool) {
        if self.quiet {
            return;
        }
        let status = if ok {
            "ok".green().to_string()
        } else {
            format!("{}, see {}", "failed".red(), self.log_path.display())
        };
        match self.current.take() {
            Some(pb) => {
                pb.finish_and_clear();
                println!("{} {status}", Self::label(phase, host));
            }
            None => println!("{status}"),
        }
    }

    fn on_skip(&mut self, phase: Phase, host: &str, reason: &str) {
        if self.quiet {
            return;
        }
        println!(
            "{} {} {}",
            "⚠".yellow(),
            format!("Skipping {host} in {phase}:").yellow(),
            reason
        );
    }
}
