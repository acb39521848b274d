//! Command runners
//!
//! [`CommandRunner`] is the seam between the orchestration code and the
//! processes it starts. [`ProcessRunner`] does the real work; tests and
//! `--dry-run` plug in something else.

use std::io::{self, BufRead, BufReader, PipeReader};
use std::process::{Command, Stdio};

use crate::sink::LogSink;
use crate::target::{Target, shell_quote};
use crate::types::{CommandResult, RunOptions, exit_code};

/// Runs one command line on one target
///
/// Implementations make a single attempt and report the exit code verbatim.
/// An `Err` means the command could not be started or its output could not
/// be logged, never that it exited non-zero.
pub trait CommandRunner {
    /// Run `argv` on `target`.
    ///
    /// With a sink, stdout and stderr are merged and each line is written to
    /// the sink as it arrives, then returned in [`CommandResult::output`].
    /// Without a sink the command shares the caller's terminal.
    fn run(
        &self,
        target: &Target,
        argv: &[String],
        opts: RunOptions,
        sink: Option<&mut LogSink>,
    ) -> io::Result<CommandResult>;
}

/// Spawns local processes and ssh sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(
        &self,
        target: &Target,
        argv: &[String],
        opts: RunOptions,
        sink: Option<&mut LogSink>,
    ) -> io::Result<CommandResult> {
        let cmd = target.command(argv, opts)?;
        log::debug!("Running on {}: {}", target.name(), render(&cmd));

        match sink {
            Some(sink) => run_logged(cmd, target.name(), sink),
            None => run_inherited(cmd),
        }
    }
}

fn run_inherited(mut cmd: Command) -> io::Result<CommandResult> {
    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;
    Ok(CommandResult::new(exit_code(status), Vec::new()))
}

fn run_logged(mut cmd: Command, host: &str, sink: &mut LogSink) -> io::Result<CommandResult> {
    let (reader, writer) = io::pipe()?;
    cmd.stdin(Stdio::null())
        .stdout(writer.try_clone()?)
        .stderr(writer);
    let mut child = cmd.spawn()?;
    // The Command still owns write ends of the pipe; EOF only arrives once they are closed.
    drop(cmd);

    let mut output = Vec::new();
    let streamed = stream_lines(reader, host, sink, &mut output);
    let status = child.wait()?;
    streamed?;

    Ok(CommandResult::new(exit_code(status), output))
}

fn stream_lines(
    reader: PipeReader,
    host: &str,
    sink: &mut LogSink,
    output: &mut Vec<String>,
) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf)
            .trim_end_matches(['\n', '\r'])
            .to_string();
        sink.info(host, &line)?;
        output.push(line);
    }
}

/// Records what would run without starting anything
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(
        &self,
        target: &Target,
        argv: &[String],
        opts: RunOptions,
        sink: Option<&mut LogSink>,
    ) -> io::Result<CommandResult> {
        let line = render(&target.command(argv, opts)?);
        match sink {
            Some(sink) => sink.info(target.name(), &format!("dry run: {line}"))?,
            None => println!("dry run on {}: {line}", target.name()),
        }
        Ok(CommandResult::ok())
    }
}

/// Shell-style rendering of a process, for logs and dry runs
pub fn render(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|part| shell_quote(&part.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_merged_output_is_streamed_to_sink() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("run.log");
        let mut sink = LogSink::open(&path).unwrap();

        let result = ProcessRunner
            .run(
                &Target::Local,
                &argv(&["sh", "-c", "echo out; echo err 1>&2; echo last"]),
                RunOptions::plain(),
                Some(&mut sink),
            )
            .unwrap();

        assert!(result.success());
        assert_eq!(result.output, ["out", "err", "last"]);

        let log = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = log.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.starts_with("localhost ")));
        assert!(lines[1].ends_with(" err"));
    }

    #[test]
    fn test_exit_code_is_returned_verbatim() {
        let tmp = TempDir::new().unwrap();
        let mut sink = LogSink::open(tmp.path().join("run.log")).unwrap();

        let result = ProcessRunner
            .run(
                &Target::Local,
                &argv(&["sh", "-c", "echo nope; exit 3"]),
                RunOptions::plain(),
                Some(&mut sink),
            )
            .unwrap();

        assert_eq!(result.exit_code, 3);
        assert_eq!(result.output, ["nope"]);
    }

    #[test]
    fn test_without_sink_nothing_is_captured() {
        let result = ProcessRunner
            .run(&Target::Local, &argv(&["true"]), RunOptions::plain(), None)
            .unwrap();
        assert!(result.success());
        assert!(result.output.is_empty());
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let mut sink = LogSink::open(tmp.path().join("run.log")).unwrap();
        let err = ProcessRunner.run(
            &Target::Local,
            &argv(&["/nonexistent/afsutil-xyzzy"]),
            RunOptions::plain(),
            Some(&mut sink),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_dry_run_spawns_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("run.log");
        let mut sink = LogSink::open(&path).unwrap();
        let target = Target::for_host("alpha", "/k", None);

        let result = DryRunRunner
            .run(
                &target,
                &argv(&["afsutil", "stop", "server"]),
                RunOptions::elevated(),
                Some(&mut sink),
            )
            .unwrap();

        assert!(result.success());
        let log = fs::read_to_string(&path).unwrap();
        assert!(log.starts_with("alpha "));
        assert!(log.contains("dry run: ssh -i /k"));
        assert!(log.contains("'sudo -n -- afsutil stop server'"));
    }

    #[test]
    fn test_render_quotes_arguments() {
        let mut cmd = Command::new("afsutil");
        cmd.args(["newcell", "--cell", "a cell"]);
        assert_eq!(render(&cmd), "afsutil newcell --cell 'a cell'");
    }
}
