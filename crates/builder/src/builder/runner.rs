//! External process execution.
//!
//! Build logic describes processes as [`Invocation`]s and hands them to a
//! [`ProcessRunner`], so it can be exercised without real toolchains.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// One external process: program, arguments, working directory, extra env.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
    pub env: Vec<(OsString, OsString)>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            env: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Final path component of the program, e.g. `cmake`.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map_or_else(|| self.program.display().to_string(), |n| n.to_string_lossy().into_owned())
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.cwd);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Exit status of a finished process. `None` means killed by a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status(Option<i32>);

impl Status {
    pub const SUCCESS: Status = Status(Some(0));

    pub fn from_code(code: i32) -> Self {
        Self(Some(code))
    }

    pub fn code(self) -> Option<i32> {
        self.0
    }

    pub fn success(self) -> bool {
        self.0 == Some(0)
    }
}

impl From<std::process::ExitStatus> for Status {
    fn from(status: std::process::ExitStatus) -> Self {
        Self(status.code())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Output of a process run with [`ProcessRunner::capture`].
#[derive(Clone, Debug)]
pub struct Captured {
    pub status: Status,
    pub stdout: String,
    pub stderr: String,
}

pub trait ProcessRunner {
    /// Run to completion, appending stdout and stderr to `log`.
    fn run(&self, invocation: &Invocation, log: &Path) -> Result<Status>;

    /// Run to completion, capturing stdout and stderr.
    fn capture(&self, invocation: &Invocation) -> Result<Captured>;
}

/// Runs invocations as real child processes.
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation, log: &Path) -> Result<Status> {
        let stdout = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log)
            .with_context(|| format!("Failed to open log {}", log.display()))?;
        let stderr = stdout.try_clone()?;

        let status = invocation
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .status()
            .with_context(|| format!("Failed to run {}", invocation.program.display()))?;

        Ok(status.into())
    }

    fn capture(&self, invocation: &Invocation) -> Result<Captured> {
        let output = invocation
            .to_command()
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run {}", invocation.program.display()))?;

        Ok(Captured {
            status: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_invocation_display() {
        let inv = Invocation::new("/usr/bin/make", "/tmp")
            .arg("-j4")
            .args(["install", "DESTDIR=/x"]);
        assert_eq!(inv.to_string(), "/usr/bin/make -j4 install DESTDIR=/x");
        assert_eq!(inv.program_name(), "make");
        assert!(inv.has_arg("install"));
        assert!(!inv.has_arg("all"));
    }

    #[test]
    fn test_run_appends_both_streams_to_log() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join("step.log");
        std::fs::write(&log, "earlier\n").unwrap();

        let inv = Invocation::new("sh", tmp.path())
            .args(["-c", "echo out; echo err >&2; exit 3"]);
        let status = SystemRunner.run(&inv, &log).unwrap();

        assert_eq!(status.code(), Some(3));
        assert!(!status.success());
        let text = std::fs::read_to_string(&log).unwrap();
        assert!(text.starts_with("earlier\n"));
        assert!(text.contains("out"));
        assert!(text.contains("err"));
    }

    #[test]
    fn test_capture_uses_cwd_and_env() {
        let tmp = TempDir::new().unwrap();
        let inv = Invocation::new("sh", tmp.path())
            .args(["-c", "pwd; echo $GREETING"])
            .env("GREETING", "hello");
        let captured = SystemRunner.capture(&inv).unwrap();

        assert!(captured.status.success());
        let canonical = tmp.path().canonicalize().unwrap();
        assert!(captured.stdout.contains(&*canonical.to_string_lossy()));
        assert!(captured.stdout.contains("hello"));
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let inv = Invocation::new("this-tool-definitely-does-not-exist-12345", "/");
        assert!(SystemRunner.capture(&inv).is_err());
    }
}
