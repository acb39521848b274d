use hostexec::{CommandRunner, LOCALHOST, RunOptions};

use super::{Orchestrator, Phase, Progress};
use crate::afsutil;
use crate::error::RunError;

impl<R: CommandRunner + ?Sized, P: Progress> Orchestrator<'_, R, P> {
    /// Get an admin token on this machine, as the invoking user
    pub fn login(&mut self) -> Result<(), RunError> {
        self.begin_phase(Phase::Login)?;
        let argv = afsutil::login_args(self.config);
        self.step(Phase::Login, LOCALHOST, &argv, RunOptions::plain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NoProgress;
    use crate::engine::testing::RecordingRunner;
    use crate::schema::tests::sample;
    use hostexec::LogSink;
    use tempfile::TempDir;

    #[test]
    fn test_login_runs_once_locally_without_sudo() {
        let config = sample();
        let runner = RecordingRunner::new();
        let tmp = TempDir::new().unwrap();
        let sink = LogSink::open(tmp.path().join("login.log")).unwrap();

        Orchestrator::new(&config, &runner, NoProgress, sink)
            .login()
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].host, "localhost");
        assert_eq!(calls[0].verb(), "login");
        assert!(!calls[0].elevate);
        assert!(calls[0].argv.contains(&"--akimpersonate".to_string()));
    }

    #[test]
    fn test_login_failure() {
        let config = sample();
        let runner = RecordingRunner::new().fail("localhost", "login", 1, &["aklog: no tokens"]);
        let tmp = TempDir::new().unwrap();
        let sink = LogSink::open(tmp.path().join("login.log")).unwrap();

        let err = Orchestrator::new(&config, &runner, NoProgress, sink)
            .login()
            .unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Login));
        assert_eq!(err.exit_code(), Some(1));
    }
}
