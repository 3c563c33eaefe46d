//! Scratch workspace and scripted process runner for pipeline tests.

#![allow(dead_code)]

use anyhow::{bail, Result};
use rv_toolchain::builder::logs::LogDir;
use rv_toolchain::builder::runner::{Captured, Invocation, ProcessRunner, Status};
use rv_toolchain::cli;
use rv_toolchain::config::{BuildConfig, EnvVars, Layout, ToolchainFile};
use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Multilib listing a RISC-V Clang typically prints.
pub const MULTILIBS: &str = "\
.;
rv32i/ilp32;@march=rv32i@mabi=ilp32
rv32imac/ilp32;@march=rv32imac@mabi=ilp32
";

type Predicate = Box<dyn Fn(&Invocation) -> bool>;

/// Records invocations instead of running them.
///
/// Every run appends a line to the log. A run matching the failure
/// predicate also writes an error and exits with 2. A run matching the
/// unstartable predicate fails like a program that cannot be spawned.
/// `build.d` runs leave a `bin/dub` behind, like the real DUB bootstrap.
pub struct FakeRunner {
    pub runs: RefCell<Vec<Invocation>>,
    pub captures: RefCell<Vec<Invocation>>,
    fail_when: Option<Predicate>,
    unstartable_when: Option<Predicate>,
    multilibs: String,
    resource_dir: PathBuf,
}

impl FakeRunner {
    pub fn new(resource_dir: impl Into<PathBuf>) -> Self {
        Self {
            runs: RefCell::new(Vec::new()),
            captures: RefCell::new(Vec::new()),
            fail_when: None,
            unstartable_when: None,
            multilibs: MULTILIBS.to_string(),
            resource_dir: resource_dir.into(),
        }
    }

    pub fn failing_when(mut self, predicate: impl Fn(&Invocation) -> bool + 'static) -> Self {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    pub fn unstartable_when(mut self, predicate: impl Fn(&Invocation) -> bool + 'static) -> Self {
        self.unstartable_when = Some(Box::new(predicate));
        self
    }

    pub fn with_multilibs(mut self, listing: &str) -> Self {
        self.multilibs = listing.to_string();
        self
    }

    pub fn runs(&self) -> Vec<Invocation> {
        self.runs.borrow().clone()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, invocation: &Invocation, log: &Path) -> Result<Status> {
        self.runs.borrow_mut().push(invocation.clone());
        if self.unstartable_when.as_ref().is_some_and(|p| p(invocation)) {
            bail!("Failed to run {}: Permission denied", invocation.program.display());
        }

        let mut out = OpenOptions::new().create(true).append(true).open(log)?;
        writeln!(out, "ran {}", invocation.program_name())?;

        if self.fail_when.as_ref().is_some_and(|fail| fail(invocation)) {
            writeln!(out, "error: simulated failure in {}", invocation.cwd.display())?;
            return Ok(Status::from_code(2));
        }

        if invocation.has_arg("build.d") {
            let bin = invocation.cwd.join("bin");
            std::fs::create_dir_all(&bin)?;
            std::fs::write(bin.join("dub"), "dub")?;
        }
        Ok(Status::SUCCESS)
    }

    fn capture(&self, invocation: &Invocation) -> Result<Captured> {
        self.captures.borrow_mut().push(invocation.clone());

        let stdout = if invocation.has_arg("-print-multi-lib") {
            self.multilibs.clone()
        } else if invocation.has_arg("-print-resource-dir") {
            format!("{}\n", self.resource_dir.display())
        } else {
            String::new()
        };
        Ok(Captured {
            status: Status::SUCCESS,
            stdout,
            stderr: String::new(),
        })
    }
}

/// `<tmp>/toolchain` as the repository root, checkouts next to it.
pub struct TestEnv {
    pub tmp: TempDir,
    pub layout: Layout,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("toolchain");
        std::fs::create_dir_all(&root).unwrap();
        Self {
            layout: Layout::new(root),
            tmp,
        }
    }

    pub fn config(&self, args: &[&str], env: &[(&str, &str)]) -> BuildConfig {
        let argv = std::iter::once("build-toolchain").chain(args.iter().copied());
        let cli = cli::parse(argv).unwrap();
        let env: EnvVars = env.iter().copied().collect();
        BuildConfig::resolve(&cli, &env, self.layout.clone(), &ToolchainFile::default()).unwrap()
    }

    pub fn logs(&self) -> LogDir {
        LogDir::create(&self.layout.logs(), chrono::Local::now()).unwrap()
    }

    pub fn resource_dir(&self) -> PathBuf {
        self.tmp.path().join("clang-resource")
    }

    pub fn runner(&self) -> FakeRunner {
        FakeRunner::new(self.resource_dir())
    }

    /// A DUB checkout with a `build.d` and a `.git` directory.
    pub fn dub_checkout(&self) -> PathBuf {
        let dub = self.layout.checkout("dub");
        std::fs::create_dir_all(dub.join(".git")).unwrap();
        std::fs::write(dub.join("build.d"), "void main() {}").unwrap();
        dub
    }

    /// Build subdirectory an invocation ran in, e.g. `llvm`.
    pub fn component_of(&self, invocation: &Invocation) -> Option<String> {
        invocation
            .cwd
            .strip_prefix(self.layout.build_root())
            .ok()?
            .components()
            .next()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
    }

    /// Components in the order they first ran.
    pub fn run_order(&self, runner: &FakeRunner) -> Vec<String> {
        let mut order: Vec<String> = Vec::new();
        for name in runner.runs().iter().filter_map(|i| self.component_of(i)) {
            if order.last() != Some(&name) {
                order.push(name);
            }
        }
        order
    }

    pub fn read_summary(&self, logs: &LogDir) -> serde_json::Value {
        let text = std::fs::read_to_string(logs.path().join("summary.json")).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}
