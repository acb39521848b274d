//! Where a command runs, and how its process is built

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::types::RunOptions;

/// Host name meaning "this machine, no remote hop"
pub const LOCALHOST: &str = "localhost";

/// Execution target for a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Run the command directly as a child process
    Local,
    /// Run the command through an ssh session authenticated by key
    Remote {
        host: String,
        keyfile: PathBuf,
        user: Option<String>,
    },
}

impl Target {
    /// Target for a configured host name; `"localhost"` never goes through ssh
    pub fn for_host(name: &str, keyfile: impl Into<PathBuf>, user: Option<&str>) -> Self {
        if name == LOCALHOST {
            Self::Local
        } else {
            Self::Remote {
                host: name.to_string(),
                keyfile: keyfile.into(),
                user: user.map(str::to_string),
            }
        }
    }

    /// Host name used to tag log lines
    pub fn name(&self) -> &str {
        match self {
            Self::Local => LOCALHOST,
            Self::Remote { host, .. } => host,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Build the process for `argv` on this target. Stdio is left to the caller.
    pub fn command(&self, argv: &[String], opts: RunOptions) -> io::Result<Command> {
        let Some((program, args)) = argv.split_first() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty command line",
            ));
        };

        match self {
            Self::Local if opts.elevate => {
                let mut cmd = Command::new("sudo");
                cmd.args(["-n", "--"]).arg(program).args(args);
                Ok(cmd)
            }
            Self::Local => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                Ok(cmd)
            }
            Self::Remote {
                host,
                keyfile,
                user,
            } => {
                let mut cmd = Command::new("ssh");
                cmd.args(ssh_options(keyfile))
                    .arg(destination(host, user.as_deref()))
                    .arg(remote_line(argv, opts));
                Ok(cmd)
            }
        }
    }
}

/// Key-only, never-prompting ssh options
fn ssh_options(keyfile: &Path) -> Vec<String> {
    vec![
        "-i".to_string(),
        keyfile.display().to_string(),
        "-o".to_string(),
        "BatchMode=yes".to_string(),
        "-o".to_string(),
        "PasswordAuthentication=no".to_string(),
        "-o".to_string(),
        "KbdInteractiveAuthentication=no".to_string(),
    ]
}

fn destination(host: &str, user: Option<&str>) -> String {
    match user {
        Some(user) => format!("{user}@{host}"),
        None => host.to_string(),
    }
}

/// Single shell command line executed by the remote login shell
fn remote_line(argv: &[String], opts: RunOptions) -> String {
    let line = argv
        .iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ");
    if opts.elevate {
        format!("sudo -n -- {line}")
    } else {
        line
    }
}

/// Quote one argument for a POSIX shell
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r#"'"'"'"#))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    fn parts(cmd: &Command) -> (String, Vec<String>) {
        (
            cmd.get_program().to_string_lossy().to_string(),
            cmd.get_args()
                .map(|a| a.to_string_lossy().to_string())
                .collect(),
        )
    }

    #[test]
    fn test_localhost_is_local() {
        assert_eq!(Target::for_host("localhost", "/k", None), Target::Local);
        assert!(Target::for_host("alpha", "/k", None).is_remote());
        assert_eq!(Target::for_host("alpha", "/k", None).name(), "alpha");
        assert_eq!(Target::Local.name(), "localhost");
    }

    #[test]
    fn test_local_plain_command() {
        let cmd = Target::Local
            .command(&argv(&["afsutil", "start", "server"]), RunOptions::plain())
            .unwrap();
        let (program, args) = parts(&cmd);
        assert_eq!(program, "afsutil");
        assert_eq!(args, ["start", "server"]);
    }

    #[test]
    fn test_local_elevated_command() {
        let cmd = Target::Local
            .command(&argv(&["afsutil", "start"]), RunOptions::elevated())
            .unwrap();
        let (program, args) = parts(&cmd);
        assert_eq!(program, "sudo");
        assert_eq!(args, ["-n", "--", "afsutil", "start"]);
    }

    #[test]
    fn test_remote_command_disables_password_auth() {
        let target = Target::for_host("alpha", "/root/.ssh/id_rsa", Some("admin"));
        let cmd = target
            .command(
                &argv(&["afsutil", "install", "--cell", "my cell"]),
                RunOptions::elevated(),
            )
            .unwrap();
        let (program, args) = parts(&cmd);
        assert_eq!(program, "ssh");
        assert_eq!(args[0..2], ["-i", "/root/.ssh/id_rsa"]);
        assert!(args.contains(&"BatchMode=yes".to_string()));
        assert!(args.contains(&"PasswordAuthentication=no".to_string()));
        assert_eq!(args[args.len() - 2], "admin@alpha");
        assert_eq!(
            args[args.len() - 1],
            "sudo -n -- afsutil install --cell 'my cell'"
        );
    }

    #[test]
    fn test_remote_without_user_or_elevation() {
        let target = Target::for_host("beta", "/k", None);
        let cmd = target
            .command(&argv(&["uptime"]), RunOptions::plain())
            .unwrap();
        let (_, args) = parts(&cmd);
        assert_eq!(args[args.len() - 2], "beta");
        assert_eq!(args[args.len() - 1], "uptime");
    }

    #[test]
    fn test_empty_argv_is_rejected() {
        let err = Target::Local.command(&[], RunOptions::plain()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("afsutil"), "afsutil");
        assert_eq!(shell_quote("--cell=x.y"), "--cell=x.y");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("a b"), "'a b'");
        assert_eq!(shell_quote("it's"), r#"'it'"'"'s'"#);
        assert_eq!(shell_quote("$HOME"), "'$HOME'");
    }
}
