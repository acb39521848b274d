//! Append-only per-run log file

use chrono::Local;
use log::Level;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Per-run log file. Every line is tagged with its origin host and level and
/// is on disk before `write` returns.
#[derive(Debug)]
pub struct LogSink {
    path: PathBuf,
    file: File,
}

impl LogSink {
    /// Create the log file, replacing any log left by a previous run
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        log::debug!("Opened run log {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record. A multi-line message becomes one tagged line per line.
    pub fn write(&mut self, host: &str, level: Level, message: &str) -> io::Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let mut buf = String::new();
        for line in message.lines() {
            buf.push_str(&format!("{host} {timestamp} {level:<5} {line}\n"));
        }
        if buf.is_empty() {
            buf = format!("{host} {timestamp} {level:<5}\n");
        }
        self.file.write_all(buf.as_bytes())?;
        self.file.flush()?;
        self.file.sync_data()
    }

    pub fn info(&mut self, host: &str, message: &str) -> io::Result<()> {
        self.write(host, Level::Info, message)
    }

    pub fn warn(&mut self, host: &str, message: &str) -> io::Result<()> {
        self.write(host, Level::Warn, message)
    }

    pub fn error(&mut self, host: &str, message: &str) -> io::Result<()> {
        self.write(host, Level::Error, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_lines_are_tagged_with_host_and_level() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("setup.log");
        let mut sink = LogSink::open(&path).unwrap();

        sink.info("alpha", "installing").unwrap();
        sink.error("beta", "failed").unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("alpha "));
        assert!(lines[0].contains(" INFO "));
        assert!(lines[0].ends_with(" installing"));
        assert!(lines[1].starts_with("beta "));
        assert!(lines[1].contains(" ERROR "));
    }

    #[test]
    fn test_open_truncates_previous_run() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("teardown.log");
        {
            let mut sink = LogSink::open(&path).unwrap();
            sink.info("alpha", "old run").unwrap();
        }
        let mut sink = LogSink::open(&path).unwrap();
        sink.info("alpha", "new run").unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("new run"));
    }

    #[test]
    fn test_open_creates_log_directory() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("output").join("nested").join("login.log");
        let mut sink = LogSink::open(&path).unwrap();
        sink.warn("localhost", "hello").unwrap();
        assert_eq!(sink.path(), path.as_path());
        assert!(path.exists());
    }

    #[test]
    fn test_multiline_message_keeps_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("setup.log");
        let mut sink = LogSink::open(&path).unwrap();

        sink.info("alpha", "one\ntwo").unwrap();
        sink.write("alpha", Level::Debug, "three").unwrap();
        sink.info("alpha", "").unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("one"));
        assert!(lines[1].ends_with("two"));
        assert!(lines[2].contains(" DEBUG "));
        assert!(lines[2].ends_with("three"));
        assert!(lines[3].starts_with("alpha "));
    }
}
