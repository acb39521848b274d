use hostexec::{AccessDenial, CommandRunner, LOCALHOST, RunOptions};

use super::{Orchestrator, Phase, Progress};
use crate::afsutil;
use crate::error::RunError;
use crate::schema::HostSpec;

/// Result of probing one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// ssh (for remote hosts) and non-interactive sudo both work
    Ok,
    /// ssh or sudo refused
    Denied(AccessDenial),
    /// Anything else, with the error text
    Failed(String),
}

/// Per-host probe results, in configuration order
#[derive(Debug, Default)]
pub struct CheckReport {
    pub hosts: Vec<(String, CheckOutcome)>,
}

impl CheckReport {
    pub fn is_success(&self) -> bool {
        self.hosts.iter().all(|(_, o)| *o == CheckOutcome::Ok)
    }

    pub fn failed(&self) -> usize {
        self.hosts
            .iter()
            .filter(|(_, o)| *o != CheckOutcome::Ok)
            .count()
    }
}

impl<R: CommandRunner + ?Sized, P: Progress> Orchestrator<'_, R, P> {
    /// Run `sudo -n true` on every managed host and report each one.
    ///
    /// Unlike setup, a failing host does not stop the check; only a run log
    /// write failure does.
    pub fn check(&mut self) -> Result<CheckReport, RunError> {
        self.begin_phase(Phase::Check)?;
        let argv = afsutil::probe_args();
        let hosts: Vec<HostSpec> = self.config.managed_hosts().cloned().collect();

        let mut report = CheckReport::default();
        for host in &hosts {
            let outcome = match self.step(Phase::Check, &host.name, &argv, RunOptions::elevated()) {
                Ok(()) => CheckOutcome::Ok,
                Err(err @ RunError::Log { .. }) => return Err(err),
                Err(RunError::Access { denial, .. }) => CheckOutcome::Denied(denial),
                Err(err) => CheckOutcome::Failed(err.to_string()),
            };
            report.hosts.push((host.name.clone(), outcome));
        }

        self.log(
            LOCALHOST,
            log::Level::Info,
            &format!(
                "check complete: {} of {} hosts ok",
                report.hosts.len() - report.failed(),
                report.hosts.len()
            ),
        )?;
        Ok(report)
    }
}
