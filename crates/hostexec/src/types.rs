//! Core types shared by runners and callers

use std::process::ExitStatus;

/// Options for a single command invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Run through `sudo -n` (fails instead of prompting for a password)
    pub elevate: bool,
}

impl RunOptions {
    /// Plain invocation as the current user
    pub fn plain() -> Self {
        Self { elevate: false }
    }

    /// Invocation wrapped in non-interactive sudo
    pub fn elevated() -> Self {
        Self { elevate: true }
    }
}

/// Outcome of one command invocation
///
/// `output` holds the merged stdout/stderr lines in arrival order. It is empty
/// when the command ran without a log sink (output went straight to the
/// terminal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub output: Vec<String>,
}

impl CommandResult {
    pub fn new(exit_code: i32, output: Vec<String>) -> Self {
        Self { exit_code, output }
    }

    /// Successful result with no captured output
    pub fn ok() -> Self {
        Self::new(0, Vec::new())
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Exit code for a finished process; -1 when it was killed by a signal
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_options() {
        assert!(!RunOptions::plain().elevate);
        assert!(RunOptions::elevated().elevate);
        assert_eq!(RunOptions::default(), RunOptions::plain());
    }

    #[test]
    fn test_command_result_success() {
        assert!(CommandResult::ok().success());
        assert!(!CommandResult::new(1, vec!["boom".to_string()]).success());
        assert!(!CommandResult::new(-1, Vec::new()).success());
    }
}
