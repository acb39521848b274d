//! Error types for configuration loading and cluster runs.
//!
//! Configuration problems surface before any command is dispatched. Run
//! errors carry the phase and host that failed so operators can find the
//! matching lines in the run log.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use hostexec::AccessDenial;

use crate::engine::Phase;

/// Problems with the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file does not exist or cannot be read
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Config file is not valid TOML or has wrongly typed values
    #[error("invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Required setting is absent or empty
    #[error("missing required setting '{0}'")]
    Missing(&'static str),

    /// No `[host.*]` sections
    #[error("no hosts configured (add at least one [host.<name>] section)")]
    NoHosts,

    /// `[host.<name>]` has an unusable name
    #[error("invalid host name '{0}'")]
    InvalidHostName(String),

    /// `[host.<name>]` has unknown or wrongly typed fields
    #[error("invalid settings for host '{host}': {message}")]
    InvalidHost { host: String, message: String },

    /// A file named by the configuration cannot be read
    #[error("{what} {path} is not readable: {source}")]
    Unreadable {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The local host name could not be determined
    #[error("cannot determine local host name: {0}")]
    Hostname(#[source] io::Error),
}

/// A run stopped early
#[derive(Debug, Error)]
pub enum RunError {
    /// The command ran and exited non-zero
    #[error("{phase} failed on {host}: exit code {exit_code} from `{command}`")]
    CommandFailed {
        phase: Phase,
        host: String,
        command: String,
        exit_code: i32,
        output: Vec<String>,
    },

    /// ssh or sudo refused the command before it could run
    #[error("{phase} failed on {host}: {denial} (running `{command}`)")]
    Access {
        phase: Phase,
        host: String,
        command: String,
        exit_code: i32,
        denial: AccessDenial,
    },

    /// The program could not be started at all. The io error is part of
    /// the message so the last line printed still names host and command.
    #[error("{phase} failed on {host}: cannot run `{command}`: {error}")]
    Spawn {
        phase: Phase,
        host: String,
        command: String,
        error: io::Error,
    },

    /// The run log could not be written
    #[error("cannot write run log {path}: {error}")]
    Log { path: PathBuf, error: io::Error },
}

impl RunError {
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::CommandFailed { phase, .. }
            | Self::Access { phase, .. }
            | Self::Spawn { phase, .. } => Some(*phase),
            Self::Log { .. } => None,
        }
    }

    pub fn host(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { host, .. }
            | Self::Access { host, .. }
            | Self::Spawn { host, .. } => Some(host),
            Self::Log { .. } => None,
        }
    }

    /// Exit code of the failed command; -1 when it never ran
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { exit_code, .. } | Self::Access { exit_code, .. } => {
                Some(*exit_code)
            }
            Self::Spawn { .. } => Some(-1),
            Self::Log { .. } => None,
        }
    }

    /// Actionable advice for the operator, when there is any
    pub fn advice(&self) -> Option<&'static str> {
        match self {
            Self::Access { denial, .. } => Some(denial.advice()),
            Self::Spawn { .. } => Some("Check that the program is installed on the host"),
            Self::CommandFailed { .. } | Self::Log { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_accessors() {
        let err = RunError::CommandFailed {
            phase: Phase::Install,
            host: "localhost".to_string(),
            command: "afsutil install".to_string(),
            exit_code: 1,
            output: vec!["boom".to_string()],
        };
        assert_eq!(err.phase(), Some(Phase::Install));
        assert_eq!(err.host(), Some("localhost"));
        assert_eq!(err.exit_code(), Some(1));
        assert_eq!(err.advice(), None);
        assert_eq!(
            err.to_string(),
            "install failed on localhost: exit code 1 from `afsutil install`"
        );
    }

    #[test]
    fn test_access_error_has_advice() {
        let err = RunError::Access {
            phase: Phase::Clock,
            host: "alpha".to_string(),
            command: "ntpdate -u pool.ntp.org".to_string(),
            exit_code: 255,
            denial: AccessDenial::Ssh {
                host: "alpha".to_string(),
            },
        };
        assert!(err.advice().unwrap().contains("ssh key"));
        assert!(err.to_string().starts_with("clock failed on alpha: ssh connection"));
        assert!(err.to_string().ends_with("(running `ntpdate -u pool.ntp.org`)"));
    }

    /// The last line `ui::error` prints is the last link of the chain
    fn last_line(err: RunError) -> String {
        let err = anyhow::Error::new(err);
        err.chain().last().unwrap().to_string()
    }

    #[test]
    fn test_final_line_names_phase_host_and_command() {
        let errors = [
            RunError::CommandFailed {
                phase: Phase::Install,
                host: "localhost".to_string(),
                command: "afsutil install".to_string(),
                exit_code: 1,
                output: Vec::new(),
            },
            RunError::Access {
                phase: Phase::Install,
                host: "localhost".to_string(),
                command: "afsutil install".to_string(),
                exit_code: 1,
                denial: AccessDenial::Sudo {
                    host: "localhost".to_string(),
                    message: "sudo: a password is required".to_string(),
                },
            },
            RunError::Spawn {
                phase: Phase::Install,
                host: "localhost".to_string(),
                command: "afsutil install".to_string(),
                error: io::Error::from(io::ErrorKind::NotFound),
            },
        ];
        for err in errors {
            let line = last_line(err);
            assert!(line.starts_with("install failed on localhost"), "{line}");
            assert!(line.contains("`afsutil install`"), "{line}");
        }

        let line = last_line(RunError::Log {
            path: PathBuf::from("output/setup.log"),
            error: io::Error::other("disk full"),
        });
        assert_eq!(line, "cannot write run log output/setup.log: disk full");
    }

    #[test]
    fn test_log_error_has_no_phase() {
        let err = RunError::Log {
            path: PathBuf::from("output/setup.log"),
            error: io::Error::other("disk full"),
        };
        assert_eq!(err.phase(), None);
        assert_eq!(err.host(), None);
        assert_eq!(err.exit_code(), None);
    }
}
