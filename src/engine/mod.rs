//! Orchestration engine
//!
//! The [`Orchestrator`] walks the cluster configuration and hands each
//! command to a [`CommandRunner`]. Setup is phase-major (every host finishes
//! a phase before the next phase begins), teardown is host-major, and the
//! first failure ends the run.
//!
//! Every command and its merged output lands in the run's [`LogSink`]; the
//! [`Progress`] callback only drives the terminal.

mod check;
mod login;
mod setup;
mod teardown;

pub use check::CheckOutcome;

use std::fmt;

use hostexec::{CommandRunner, LOCALHOST, LogSink, RunOptions, Target, classify, shell_quote};

use crate::error::RunError;
use crate::schema::ClusterConfig;

// ============================================================================
// Phases
// ============================================================================

/// Step of a run. Setup walks the first seven in declaration order; teardown,
/// login and check each run as a single phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Clock,
    Build,
    Install,
    StartServers,
    StartDynrootClients,
    CreateCell,
    StartClients,
    Teardown,
    Login,
    Check,
}

impl Phase {
    /// Setup phases in execution order
    pub const SETUP: [Phase; 7] = [
        Phase::Clock,
        Phase::Build,
        Phase::Install,
        Phase::StartServers,
        Phase::StartDynrootClients,
        Phase::CreateCell,
        Phase::StartClients,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Clock => "clock",
            Phase::Build => "build",
            Phase::Install => "install",
            Phase::StartServers => "start-servers",
            Phase::StartDynrootClients => "start-dynroot-clients",
            Phase::CreateCell => "create-cell",
            Phase::StartClients => "start-clients",
            Phase::Teardown => "teardown",
            Phase::Login => "login",
            Phase::Check => "check",
        }
    }

    /// Progress verb, as in "Installing on alpha..."
    pub fn verb(&self) -> &'static str {
        match self {
            Phase::Clock => "Setting clock",
            Phase::Build => "Building",
            Phase::Install => "Installing",
            Phase::StartServers => "Starting servers",
            Phase::StartDynrootClients | Phase::StartClients => "Starting client",
            Phase::CreateCell => "Creating cell",
            Phase::Teardown => "Removing",
            Phase::Login => "Logging in",
            Phase::Check => "Checking access",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Progress Reporting
// ============================================================================

/// Receives progress updates while a run executes
pub trait Progress {
    /// Called before the first host of a phase
    fn on_phase_start(&mut self, phase: Phase);

    /// Called before a host's step of a phase
    fn on_step_start(&mut self, phase: Phase, host: &str);

    /// Called after a host's step, whether it succeeded or not
    fn on_step_complete(&mut self, phase: Phase, host: &str, ok: bool);

    /// Called when a host is passed over in a phase
    fn on_skip(&mut self, phase: Phase, host: &str, reason: &str);
}

/// No-op progress callback
pub struct NoProgress;

impl Progress for NoProgress {
    fn on_phase_start(&mut self, _phase: Phase) {}
    fn on_step_start(&mut self, _phase: Phase, _host: &str) {}
    fn on_step_complete(&mut self, _phase: Phase, _host: &str, _ok: bool) {}
    fn on_skip(&mut self, _phase: Phase, _host: &str, _reason: &str) {}
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Runs cluster operations for one configuration and one run log
pub struct Orchestrator<'a, R: CommandRunner + ?Sized, P: Progress> {
    config: &'a ClusterConfig,
    runner: &'a R,
    progress: P,
    sink: LogSink,
}

impl<'a, R: CommandRunner + ?Sized, P: Progress> Orchestrator<'a, R, P> {
    pub fn new(config: &'a ClusterConfig, runner: &'a R, progress: P, sink: LogSink) -> Self {
        Self {
            config,
            runner,
            progress,
            sink,
        }
    }

    fn target(&self, host: &str) -> Target {
        Target::for_host(
            host,
            self.config.ssh.keyfile.clone().unwrap_or_default(),
            self.config.ssh.user.as_deref(),
        )
    }

    fn log(&mut self, host: &str, level: log::Level, message: &str) -> Result<(), RunError> {
        self.sink
            .write(host, level, message)
            .map_err(|error| RunError::Log {
                path: self.sink.path().to_path_buf(),
                error,
            })
    }

    fn begin_phase(&mut self, phase: Phase) -> Result<(), RunError> {
        log::info!("Phase {phase}");
        self.progress.on_phase_start(phase);
        self.log(LOCALHOST, log::Level::Info, &format!("==> {phase}"))
    }

    fn skip(&mut self, phase: Phase, host: &str, reason: &str) -> Result<(), RunError> {
        log::warn!("Skipping {host} in {phase}: {reason}");
        self.progress.on_skip(phase, host, reason);
        self.log(host, log::Level::Warn, &format!("{phase}: skipped, {reason}"))
    }

    /// Run one step of a phase on one host, reporting progress; any failure
    /// ends the run.
    fn step(
        &mut self,
        phase: Phase,
        host: &str,
        argv: &[String],
        opts: RunOptions,
    ) -> Result<(), RunError> {
        self.progress.on_step_start(phase, host);
        let result = self.dispatch(phase, host, argv, opts);
        self.progress.on_step_complete(phase, host, result.is_ok());
        result
    }

    /// Run a command whose failure is logged as a warning and otherwise ignored
    fn attempt(
        &mut self,
        phase: Phase,
        host: &str,
        argv: &[String],
        opts: RunOptions,
    ) -> Result<bool, RunError> {
        match self.dispatch(phase, host, argv, opts) {
            Ok(()) => Ok(true),
            Err(err @ RunError::Log { .. }) => Err(err),
            Err(err) => {
                log::warn!("Ignoring failure on {host}: {err}");
                self.log(host, log::Level::Warn, &format!("ignored: {err}"))?;
                Ok(false)
            }
        }
    }

    /// Run a command on a host and turn a non-zero exit into an error
    fn dispatch(
        &mut self,
        phase: Phase,
        host: &str,
        argv: &[String],
        opts: RunOptions,
    ) -> Result<(), RunError> {
        let target = self.target(host);
        let command = render(argv);
        let prefix = if opts.elevate { "sudo " } else { "" };
        self.log(host, log::Level::Info, &format!("{phase}: {prefix}{command}"))?;

        let result = match self.runner.run(&target, argv, opts, Some(&mut self.sink)) {
            Ok(result) => result,
            Err(error) => {
                self.log(host, log::Level::Error, &format!("cannot run: {error}"))?;
                return Err(RunError::Spawn {
                    phase,
                    host: host.to_string(),
                    command,
                    error,
                });
            }
        };

        if result.success() {
            return Ok(());
        }

        self.log(
            host,
            log::Level::Error,
            &format!("{phase}: exit code {}", result.exit_code),
        )?;
        Err(match classify(&target, opts, &result) {
            Some(denial) => RunError::Access {
                phase,
                host: host.to_string(),
                command,
                exit_code: result.exit_code,
                denial,
            },
            None => RunError::CommandFailed {
                phase,
                host: host.to_string(),
                command,
                exit_code: result.exit_code,
                output: result.output,
            },
        })
    }
}

fn render(argv: &[String]) -> String {
    argv.iter()
        .map(|a| shell_quote(a))
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Test Support
// ============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::io;

    use hostexec::{CommandResult, CommandRunner, LogSink, RunOptions, Target};

    use super::{Phase, Progress};

    /// One command handed to the runner
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Call {
        pub host: String,
        pub argv: Vec<String>,
        pub elevate: bool,
    }

    impl Call {
        /// afsutil subcommand (or program for system commands)
        pub fn verb(&self) -> &str {
            if self.argv[0] == "afsutil" {
                &self.argv[1]
            } else {
                &self.argv[0]
            }
        }
    }

    struct Failure {
        host: String,
        verb: String,
        exit_code: i32,
        output: Vec<String>,
    }

    /// Records every command and answers from a script
    #[derive(Default)]
    pub struct RecordingRunner {
        calls: RefCell<Vec<Call>>,
        failures: Vec<Failure>,
    }

    impl RecordingRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make `verb` on `host` exit with `exit_code`, printing `output`
        pub fn fail(mut self, host: &str, verb: &str, exit_code: i32, output: &[&str]) -> Self {
            self.failures.push(Failure {
                host: host.to_string(),
                verb: verb.to_string(),
                exit_code,
                output: output.iter().map(ToString::to_string).collect(),
            });
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        /// `host verb` pairs in dispatch order
        pub fn trace(&self) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .map(|c| format!("{} {}", c.host, c.verb()))
                .collect()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(
            &self,
            target: &Target,
            argv: &[String],
            opts: RunOptions,
            sink: Option<&mut LogSink>,
        ) -> io::Result<CommandResult> {
            let call = Call {
                host: target.name().to_string(),
                argv: argv.to_vec(),
                elevate: opts.elevate,
            };
            let failure = self
                .failures
                .iter()
                .find(|f| f.host == call.host && f.verb == call.verb());
            self.calls.borrow_mut().push(call);

            let Some(failure) = failure else {
                return Ok(CommandResult::ok());
            };
            if let Some(sink) = sink {
                for line in &failure.output {
                    sink.info(target.name(), line)?;
                }
            }
            Ok(CommandResult::new(
                failure.exit_code,
                failure.output.clone(),
            ))
        }
    }

    /// Progress callback that remembers what it was told
    #[derive(Default)]
    pub struct RecordingProgress {
        pub events: Vec<String>,
    }

    impl Progress for &mut RecordingProgress {
        fn on_phase_start(&mut self, phase: Phase) {
            self.events.push(format!("phase {phase}"));
        }
        fn on_step_start(&mut self, phase: Phase, host: &str) {
            self.events.push(format!("start {phase} {host}"));
        }
        fn on_step_complete(&mut self, phase: Phase, host: &str, ok: bool) {
            self.events.push(format!("done {phase} {host} {ok}"));
        }
        fn on_skip(&mut self, phase: Phase, host: &str, reason: &str) {
            self.events.push(format!("skip {phase} {host} {reason}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_phase_order() {
        let mut sorted = Phase::SETUP;
        sorted.sort();
        assert_eq!(sorted, Phase::SETUP);
        assert_eq!(Phase::SETUP[2].to_string(), "install");
        assert_eq!(Phase::CreateCell.to_string(), "create-cell");
    }

    #[test]
    fn test_render_quotes_only_when_needed() {
        let argv = vec!["afsutil".to_string(), "newcell".to_string(), "-o".to_string(), "fs=-L -p 4".to_string()];
        assert_eq!(render(&argv), "afsutil newcell -o 'fs=-L -p 4'");
    }
}
