//! # hostexec
//!
//! Run commands on cluster hosts, either in-process on the local machine or
//! over `ssh`, with optional non-interactive `sudo` elevation.
//!
//! ## Core Concepts
//!
//! - **Target**: where a command runs ([`Target::Local`] or [`Target::Remote`])
//! - **CommandRunner**: the execution seam; [`ProcessRunner`] spawns real
//!   processes, [`DryRunRunner`] only records what would run
//! - **LogSink**: append-only run log, one durable line per captured output line
//! - **CommandResult**: exit code plus the captured, merged output lines
//!
//! ## Example
//!
//! ```no_run
//! use hostexec::{CommandRunner, LogSink, ProcessRunner, RunOptions, Target};
//!
//! let mut sink = LogSink::open("output/setup.log")?;
//! let target = Target::for_host("alpha", "/root/.ssh/id_rsa", None);
//! let argv = vec!["afsutil".to_string(), "start".to_string(), "server".to_string()];
//!
//! let result = ProcessRunner.run(&target, &argv, RunOptions::elevated(), Some(&mut sink))?;
//! assert!(result.success());
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! Every invocation is attempted exactly once and blocks until the local
//! process exits or the remote session closes.

pub mod access;
pub mod hostname;
pub mod runner;
pub mod sink;
pub mod target;
pub mod types;

pub use access::{AccessDenial, classify};
pub use hostname::local_hostname;
pub use runner::{CommandRunner, DryRunRunner, ProcessRunner};
pub use sink::LogSink;
pub use target::{LOCALHOST, Target, shell_quote};
pub use types::{CommandResult, RunOptions};
