//! Per-component build context and the shared configure/build/install
//! recipes for autotools and CMake projects.

use super::components::Component;
use super::runner::{Invocation, ProcessRunner};
use crate::config::{BuildConfig, Layout};
use anyhow::{bail, Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct BuildContext<'a> {
    pub config: &'a BuildConfig,
    runner: &'a dyn ProcessRunner,
    component: Component,
    log: PathBuf,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        config: &'a BuildConfig,
        runner: &'a dyn ProcessRunner,
        component: Component,
        log: PathBuf,
    ) -> Self {
        Self {
            config,
            runner,
            component,
            log,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.config.layout
    }

    pub fn log(&self) -> &Path {
        &self.log
    }

    pub fn build_dir(&self) -> PathBuf {
        self.layout().build_dir(self.component)
    }

    pub fn install(&self) -> PathBuf {
        self.layout().install()
    }

    pub fn install_bin(&self) -> PathBuf {
        self.layout().install_bin()
    }

    /// An invocation with `<install>/bin` first on `PATH`.
    pub fn command(&self, program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Result<Invocation> {
        Ok(Invocation::new(program, cwd).env("PATH", self.config.search_path()?))
    }

    /// Run one step, output appended to the component log.
    ///
    /// A non-zero exit is fatal and names the log.
    pub fn run(&self, step: &str, invocation: &Invocation) -> Result<()> {
        self.append_header(step, invocation)?;
        tracing::debug!(component = %self.component, step, "{invocation}");

        let status = self
            .runner
            .run(invocation, &self.log)
            .with_context(|| format!("{} {step} could not start", self.component))?;

        if !status.success() {
            bail!(
                "{} {step} failed ({status}), see {}",
                self.component,
                self.log.display()
            );
        }
        Ok(())
    }

    /// Run a query and return its stdout.
    pub fn capture(&self, invocation: &Invocation) -> Result<String> {
        let captured = self.runner.capture(invocation)?;
        if !captured.status.success() {
            bail!(
                "`{invocation}` failed ({}): {}",
                captured.status,
                captured.stderr.trim()
            );
        }
        Ok(captured.stdout)
    }

    fn append_header(&self, step: &str, invocation: &Invocation) -> Result<()> {
        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log)
            .with_context(|| format!("Failed to open log {}", self.log.display()))?;
        writeln!(log, "==> {} {step}: {invocation}", self.component)?;
        Ok(())
    }

    /// `EXTRA_OPTS` then `EXTRA_<COMPONENT>_OPTS`.
    pub fn extra_opts(&self) -> Vec<String> {
        self.config.extra_opts_for(self.component)
    }

    pub fn jobs_arg(&self) -> String {
        format!("-j{}", self.config.jobs)
    }

    /// `configure && make && make install` from a separate build directory.
    pub fn autotools(&self, project: &Autotools<'_>) -> Result<()> {
        let build_dir = project.build_dir;

        let configure = self
            .command(project.source.join("configure"), build_dir)?
            .args(&project.flags)
            .args(self.extra_opts());
        self.run("configure", &configure)?;

        let build = self
            .command("make", build_dir)?
            .arg(self.jobs_arg())
            .args(project.build_targets.iter().copied());
        self.run("build", &build)?;

        let install = self
            .command("make", build_dir)?
            .args(project.install_targets.iter().copied());
        self.run("install", &install)
    }

    /// CMake configure, build and install.
    pub fn cmake(&self, source: &Path, build_dir: &Path, defines: &[String]) -> Result<()> {
        let configure = self
            .command("cmake", build_dir)?
            .args(["-G", self.config.generator.cmake_name()])
            .arg("-S")
            .arg(source)
            .arg("-B")
            .arg(build_dir)
            .args(defines)
            .args(self.extra_opts());
        self.run("configure", &configure)?;

        let build = self
            .command("cmake", build_dir)?
            .arg("--build")
            .arg(build_dir)
            .args(["--parallel".to_string(), self.config.jobs.to_string()]);
        self.run("build", &build)?;

        let install = self
            .command("cmake", build_dir)?
            .arg("--build")
            .arg(build_dir)
            .args(["--target", "install"]);
        self.run("install", &install)
    }
}

/// An autotools project built out of tree.
pub struct Autotools<'a> {
    pub source: &'a Path,
    pub build_dir: &'a Path,
    pub flags: Vec<String>,
    pub build_targets: &'a [&'a str],
    pub install_targets: &'a [&'a str],
}

/// `-DNAME=VALUE`.
pub fn define(name: &str, value: impl std::fmt::Display) -> String {
    format!("-D{name}={value}")
}

/// CMake boolean spelling.
pub fn on_off(flag: bool) -> &'static str {
    if flag {
        "ON"
    } else {
        "OFF"
    }
}
