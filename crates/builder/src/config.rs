//! Build configuration: repository layout, environment snapshot and the
//! resolved, immutable [`BuildConfig`].

use crate::builder::components::Component;
use crate::builder::graph;
use crate::cli::Cli;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Target triple used when `config/toolchain.toml` does not name one.
pub const DEFAULT_TRIPLE: &str = "riscv32-unknown-elf";

/// Toolchain configuration file, relative to the repository root.
pub const TOOLCHAIN_FILE: &str = "config/toolchain.toml";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[value(name = "debug")]
    Debug,
    #[default]
    #[value(name = "release")]
    Release,
    #[value(name = "reldebug")]
    #[serde(rename = "reldebug")]
    ReleaseWithDebugInfo,
}

impl BuildMode {
    /// Value passed as `CMAKE_BUILD_TYPE`.
    pub fn cmake_build_type(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
            Self::ReleaseWithDebugInfo => "RelWithDebInfo",
        }
    }

    pub fn shared_libs(self) -> bool {
        matches!(self, Self::Debug)
    }

    pub fn assertions(self) -> bool {
        matches!(self, Self::Debug | Self::ReleaseWithDebugInfo)
    }

    /// Debug builds keep their symbols even when `--strip` is given.
    pub fn allows_strip(self) -> bool {
        !matches!(self, Self::Debug)
    }
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Debug => "debug",
            Self::Release => "release",
            Self::ReleaseWithDebugInfo => "reldebug",
        })
    }
}

/// CMake generator, picked once per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Generator {
    Ninja,
    Makefiles,
}

impl Generator {
    /// Ninja when it is on `PATH`, Makefiles otherwise.
    pub fn detect() -> Self {
        if which::which("ninja").is_ok() {
            Self::Ninja
        } else {
            Self::Makefiles
        }
    }

    pub fn cmake_name(self) -> &'static str {
        match self {
            Self::Ninja => "Ninja",
            Self::Makefiles => "Unix Makefiles",
        }
    }
}

/// Snapshot of the process environment taken once at startup.
///
/// Empty values are treated as unset.
#[derive(Clone, Debug, Default)]
pub struct EnvVars(BTreeMap<String, String>);

impl EnvVars {
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvVars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Where sources, build trees, the install prefix and logs live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `TOOLCHAIN_ROOT`, or the workspace root containing this crate.
    pub fn discover(env: &EnvVars) -> Result<Self> {
        if let Some(root) = env.get("TOOLCHAIN_ROOT") {
            return Ok(Self::new(root));
        }
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .ancestors()
            .nth(2)
            .map(Self::new)
            .context("builder is expected at <repo>/crates/builder")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source checkouts are siblings of the repository root.
    pub fn checkout(&self, dir: &str) -> PathBuf {
        self.root
            .parent()
            .unwrap_or(&self.root)
            .join(dir)
    }

    pub fn build_root(&self) -> PathBuf {
        self.root.join("build")
    }

    pub fn build_dir(&self, component: Component) -> PathBuf {
        self.build_root().join(component.name())
    }

    pub fn install(&self) -> PathBuf {
        self.root.join("install")
    }

    pub fn install_bin(&self) -> PathBuf {
        self.install().join("bin")
    }

    pub fn logs(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn toolchain_file(&self) -> PathBuf {
        self.root.join(TOOLCHAIN_FILE)
    }
}

/// Contents of `config/toolchain.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainFile {
    #[serde(default)]
    pub target: TargetSection,
    /// Expected branch per checkout name.
    #[serde(default)]
    pub branches: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSection {
    #[serde(default = "default_triple")]
    pub triple: String,
}

impl Default for TargetSection {
    fn default() -> Self {
        Self {
            triple: default_triple(),
        }
    }
}

fn default_triple() -> String {
    DEFAULT_TRIPLE.to_string()
}

impl ToolchainFile {
    /// Load the file; a missing file yields the defaults with no branch
    /// expectations.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Everything a build step needs to know. Resolved once, never mutated.
#[derive(Clone, Debug)]
pub struct BuildConfig {
    pub layout: Layout,
    /// Enabled components, prerequisites included.
    pub components: BTreeSet<Component>,
    pub mode: BuildMode,
    pub shared_libs: bool,
    pub assertions: bool,
    pub strip: bool,
    pub clean: bool,
    pub jobs: usize,
    /// D compiler used to build DUB.
    pub dmd: PathBuf,
    /// `DMD` as given by the user, used to bootstrap LDC.
    pub host_dmd: Option<PathBuf>,
    pub target: String,
    pub generator: Generator,
    /// `EXTRA_OPTS`, appended to every configure step.
    pub extra_opts: Vec<String>,
    /// `EXTRA_<COMPONENT>_OPTS`, appended after `extra_opts`.
    pub component_opts: BTreeMap<Component, Vec<String>>,
    /// Host `PATH`, extended with the install prefix for every step.
    pub host_path: Option<OsString>,
}

impl BuildConfig {
    pub fn resolve(cli: &Cli, env: &EnvVars, layout: Layout, file: &ToolchainFile) -> Result<Self> {
        let mut requested = cli.requested();

        let host_dmd = env.get("DMD").map(PathBuf::from);
        let dmd = match &host_dmd {
            Some(dmd) => dmd.clone(),
            None => {
                if requested.contains(&Component::Dub) {
                    requested.insert(Component::Ldc);
                }
                layout.install_bin().join("ldmd2")
            }
        };

        let components = graph::with_prerequisites(&requested);
        let mode = cli.mode;
        let strip = cli.strip && mode.allows_strip();
        if cli.strip && !strip {
            tracing::debug!("--strip ignored in {mode} mode");
        }

        let component_opts = Component::ALL
            .into_iter()
            .filter_map(|c| {
                let opts = split_opts(env.get(&format!("EXTRA_{}_OPTS", c.env_key())));
                (!opts.is_empty()).then_some((c, opts))
            })
            .collect();

        Ok(Self {
            components,
            mode,
            shared_libs: mode.shared_libs(),
            assertions: mode.assertions(),
            strip,
            clean: cli.clean,
            jobs: parse_jobs(env.get("PARALLEL_JOBS"))?,
            dmd,
            host_dmd,
            target: file.target.triple.clone(),
            generator: Generator::detect(),
            extra_opts: split_opts(env.get("EXTRA_OPTS")),
            component_opts,
            host_path: env.get("PATH").map(OsString::from),
            layout,
        })
    }

    pub fn is_enabled(&self, component: Component) -> bool {
        self.components.contains(&component)
    }

    /// Generic extra options followed by the component-specific ones.
    pub fn extra_opts_for(&self, component: Component) -> Vec<String> {
        let mut opts = self.extra_opts.clone();
        if let Some(specific) = self.component_opts.get(&component) {
            opts.extend(specific.iter().cloned());
        }
        opts
    }

    /// `PATH` with `<install>/bin` in front.
    pub fn search_path(&self) -> Result<OsString> {
        let mut paths = vec![self.layout.install_bin()];
        if let Some(host) = &self.host_path {
            paths.extend(std::env::split_paths(host));
        }
        Ok(std::env::join_paths(paths)?)
    }
}

fn split_opts(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| v.split_whitespace().map(String::from).collect())
        .unwrap_or_default()
}

fn parse_jobs(value: Option<&str>) -> Result<usize> {
    match value {
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(0) | Err(_) => bail!("PARALLEL_JOBS must be a positive integer, got {raw:?}"),
            Ok(jobs) => Ok(jobs),
        },
        None => Ok(std::thread::available_parallelism()
            .map(std::num::NonZero::get)
            .unwrap_or(1)),
    }
}
