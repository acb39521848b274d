use hostexec::{CommandRunner, LOCALHOST, RunOptions};

use super::{Orchestrator, Phase, Progress};
use crate::afsutil;
use crate::error::RunError;
use crate::schema::{Component, HostSpec};

impl<R: CommandRunner + ?Sized, P: Progress> Orchestrator<'_, R, P> {
    /// Bring the cell up: every phase runs on all its hosts before the next
    /// phase starts.
    ///
    /// The cell is created only after every server is running, and clients
    /// without dynroot start only once the cell exists.
    pub fn setup(&mut self) -> Result<(), RunError> {
        for phase in Phase::SETUP {
            self.begin_phase(phase)?;
            match phase {
                Phase::Clock => self.sync_clocks()?,
                Phase::Build => self.build()?,
                Phase::Install => self.install()?,
                Phase::StartServers => self.start_servers()?,
                Phase::StartDynrootClients => self.start_clients(true)?,
                Phase::CreateCell => self.create_cell()?,
                Phase::StartClients => self.start_clients(false)?,
                _ => unreachable!("{phase} is not a setup phase"),
            }
        }
        self.log(LOCALHOST, log::Level::Info, "setup complete")
    }

    /// Hosts selected by `pick`, cloned so steps can borrow `self` mutably
    fn hosts_where(&self, pick: impl Fn(&HostSpec) -> bool) -> Vec<HostSpec> {
        self.config.hosts.iter().filter(|h| pick(h)).cloned().collect()
    }

    fn sync_clocks(&mut self) -> Result<(), RunError> {
        let argv = afsutil::clock_args(self.config);
        for host in self.hosts_where(|h| h.setclock) {
            self.step(Phase::Clock, &host.name, &argv, RunOptions::elevated())?;
        }
        Ok(())
    }

    fn build(&mut self) -> Result<(), RunError> {
        for host in self.hosts_where(|h| h.build) {
            let argv = afsutil::build_args(self.config, &host);
            self.step(Phase::Build, &host.name, &argv, RunOptions::plain())?;
        }
        Ok(())
    }

    fn install(&mut self) -> Result<(), RunError> {
        for host in self.hosts_where(HostSpec::is_managed) {
            if host.components().is_empty() {
                self.skip(Phase::Install, &host.name, "no server or client role")?;
                continue;
            }
            if host.nuke {
                self.nuke(&host)?;
            }
            self.progress.on_step_start(Phase::Install, &host.name);
            let result = self.install_host(&host);
            self.progress
                .on_step_complete(Phase::Install, &host.name, result.is_ok());
            result?;
        }
        Ok(())
    }

    /// Service key (when impersonating) and install, reported as one step
    fn install_host(&mut self, host: &HostSpec) -> Result<(), RunError> {
        if self.config.uses_impersonation() {
            let argv = afsutil::fakekey_args(self.config);
            self.dispatch(Phase::Install, &host.name, &argv, RunOptions::elevated())?;
        }
        let argv = afsutil::install_args(self.config, host);
        self.dispatch(Phase::Install, &host.name, &argv, RunOptions::elevated())
    }

    /// Best-effort cleanup of whatever a previous run left on the host
    fn nuke(&mut self, host: &HostSpec) -> Result<(), RunError> {
        let stop = afsutil::stop_args(self.config, &Component::ALL);
        self.attempt(Phase::Install, &host.name, &stop, RunOptions::elevated())?;
        let remove = afsutil::remove_args(self.config, &Component::ALL);
        self.attempt(Phase::Install, &host.name, &remove, RunOptions::elevated())?;
        Ok(())
    }

    fn start_servers(&mut self) -> Result<(), RunError> {
        let argv = afsutil::start_args(self.config, Component::Server);
        for host in self.hosts_where(|h| h.is_managed() && h.is_server()) {
            self.step(Phase::StartServers, &host.name, &argv, RunOptions::elevated())?;
        }
        Ok(())
    }

    fn start_clients(&mut self, dynroot: bool) -> Result<(), RunError> {
        let phase = if dynroot {
            Phase::StartDynrootClients
        } else {
            Phase::StartClients
        };
        let argv = afsutil::start_args(self.config, Component::Client);
        for host in self.hosts_where(|h| h.is_managed() && h.is_client && h.dynroot == dynroot) {
            self.step(phase, &host.name, &argv, RunOptions::elevated())?;
        }
        Ok(())
    }

    /// Always on this machine, which needs a running client by now
    fn create_cell(&mut self) -> Result<(), RunError> {
        let argv = afsutil::newcell_args(self.config);
        self.step(Phase::CreateCell, LOCALHOST, &argv, RunOptions::elevated())
    }
}
