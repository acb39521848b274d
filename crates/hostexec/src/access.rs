//! Recognise ssh and sudo access failures in a command result
//!
//! An access failure has the same control flow as any other failed command,
//! but operators fix it by distributing keys or sudo rules rather than by
//! looking at the tool that was being run.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::target::Target;
use crate::types::{CommandResult, RunOptions};

/// ssh exits with 255 when the connection or authentication fails
const SSH_FAILURE_EXIT: i32 = 255;

static SUDO_DENIED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^sudo: (a password is required|a terminal is required|.*is not in the sudoers file)",
    )
    .expect("sudo denial pattern is valid")
});

/// Why a host refused to run a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenial {
    /// ssh could not connect or the key was rejected
    #[error("ssh connection to {host} failed (check key distribution)")]
    Ssh { host: String },

    /// sudo wanted a password or the user has no sudo rights
    #[error("sudo refused on {host}: {message}")]
    Sudo { host: String, message: String },
}

impl AccessDenial {
    /// Short advice line for operators
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Ssh { .. } => "Verify the ssh key is authorized on the host and the host is reachable",
            Self::Sudo { .. } => "Grant passwordless sudo to the ssh user on the host",
        }
    }
}

/// Classify a failed result as an access denial, if it is one
pub fn classify(target: &Target, opts: RunOptions, result: &CommandResult) -> Option<AccessDenial> {
    if result.success() {
        return None;
    }

    if opts.elevate
        && let Some(line) = result.output.iter().find(|l| SUDO_DENIED.is_match(l))
    {
        return Some(AccessDenial::Sudo {
            host: target.name().to_string(),
            message: line.trim().to_string(),
        });
    }

    if target.is_remote() && result.exit_code == SSH_FAILURE_EXIT {
        return Some(AccessDenial::Ssh {
            host: target.name().to_string(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> Target {
        Target::for_host("alpha", "/k", None)
    }

    fn result(code: i32, lines: &[&str]) -> CommandResult {
        CommandResult::new(code, lines.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn test_success_is_never_denied() {
        assert_eq!(classify(&remote(), RunOptions::elevated(), &CommandResult::ok()), None);
    }

    #[test]
    fn test_ssh_exit_255_on_remote() {
        let denial = classify(
            &remote(),
            RunOptions::plain(),
            &result(255, &["Permission denied (publickey)."]),
        );
        assert_eq!(
            denial,
            Some(AccessDenial::Ssh {
                host: "alpha".to_string()
            })
        );
    }

    #[test]
    fn test_exit_255_on_local_is_plain_failure() {
        assert_eq!(
            classify(&Target::Local, RunOptions::plain(), &result(255, &[])),
            None
        );
    }

    #[test]
    fn test_sudo_password_required() {
        let denial = classify(
            &Target::Local,
            RunOptions::elevated(),
            &result(1, &["sudo: a password is required"]),
        )
        .unwrap();
        assert!(matches!(denial, AccessDenial::Sudo { ref host, .. } if host == "localhost"));
        assert!(denial.to_string().contains("a password is required"));
    }

    #[test]
    fn test_sudoers_denial_on_remote() {
        let denial = classify(
            &remote(),
            RunOptions::elevated(),
            &result(1, &["sudo: robot is not in the sudoers file.  This incident will be reported."]),
        );
        assert!(matches!(denial, Some(AccessDenial::Sudo { .. })));
    }

    #[test]
    fn test_sudo_text_without_elevation_is_ignored() {
        assert_eq!(
            classify(
                &Target::Local,
                RunOptions::plain(),
                &result(1, &["sudo: a password is required"])
            ),
            None
        );
    }

    #[test]
    fn test_tool_failure_is_not_access() {
        assert_eq!(
            classify(
                &remote(),
                RunOptions::elevated(),
                &result(1, &["Command failed! bos: no such file"])
            ),
            None
        );
    }
}
