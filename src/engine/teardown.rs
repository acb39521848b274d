use hostexec::{CommandRunner, LOCALHOST, RunOptions};

use super::{Orchestrator, Phase, Progress};
use crate::afsutil;
use crate::error::RunError;
use crate::schema::{Component, HostSpec};

impl<R: CommandRunner + ?Sized, P: Progress> Orchestrator<'_, R, P> {
    /// Stop and purge every managed host, one host at a time, in
    /// configuration order. Stops at the first failure.
    pub fn teardown(&mut self) -> Result<(), RunError> {
        self.begin_phase(Phase::Teardown)?;
        let hosts: Vec<HostSpec> = self.config.managed_hosts().cloned().collect();
        for host in &hosts {
            let components = host.components();
            if components.is_empty() {
                self.skip(Phase::Teardown, &host.name, "no server or client role")?;
                continue;
            }
            self.progress.on_step_start(Phase::Teardown, &host.name);
            let result = self.remove_host(host, &components);
            self.progress
                .on_step_complete(Phase::Teardown, &host.name, result.is_ok());
            result?;
        }
        self.log(LOCALHOST, log::Level::Info, "teardown complete")
    }

    fn remove_host(&mut self, host: &HostSpec, components: &[Component]) -> Result<(), RunError> {
        let stop = afsutil::stop_args(self.config, components);
        self.dispatch(Phase::Teardown, &host.name, &stop, RunOptions::elevated())?;
        let remove = afsutil::remove_args(self.config, components);
        self.dispatch(Phase::Teardown, &host.name, &remove, RunOptions::elevated())
    }
}
