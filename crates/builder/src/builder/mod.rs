//! Toolchain build pipeline.
//!
//! Structure:
//! - `components/` - one [`Buildable`](components::Buildable) per component
//! - `graph` - prerequisite closure and build order
//! - `branches` - source checkout branch validation
//! - `preflight` - host tool checks
//! - `context` - per-component step runner and autotools/CMake recipes
//! - `runner` - external process execution
//! - `multilib` - `-print-multi-lib` parser for compiler-rt
//! - `strip` - post-install symbol stripping
//! - `logs` - timestamped log directory and run summary

pub mod branches;
pub mod components;
pub mod context;
pub mod graph;
pub mod logs;
pub mod multilib;
pub mod preflight;
pub mod runner;
pub mod strip;

use crate::config::BuildConfig;
use anyhow::{Context, Result};
use components::{registry, Buildable};
use context::BuildContext;
use logs::{LogDir, Outcome, Summary};
use runner::ProcessRunner;
use std::time::Instant;

/// Build every enabled component in dependency order, then strip if asked.
///
/// Stops at the first failure. The summary is written either way.
pub fn build_all(config: &BuildConfig, runner: &dyn ProcessRunner, logs: &LogDir) -> Result<Summary> {
    println!(
        "=== Building {} toolchain ({} mode, {} jobs) ===",
        config.target, config.mode, config.jobs
    );
    println!("Logs: {}\n", logs.path().display());

    let mut summary = Summary::new(config);
    let result = build_components(config, runner, logs, &mut summary);

    if let Err(err) = logs.write_summary(&summary) {
        tracing::warn!("could not write build summary: {err:#}");
    }
    result?;

    if config.strip {
        strip::strip_install(config, runner, &logs.file("strip"))?;
    }

    Ok(summary)
}

fn build_components(
    config: &BuildConfig,
    runner: &dyn ProcessRunner,
    logs: &LogDir,
    summary: &mut Summary,
) -> Result<()> {
    for component in graph::build_order()? {
        if !config.is_enabled(component) {
            tracing::info!("skipping {component}");
            summary.record(component, Outcome::Skipped, std::time::Duration::ZERO);
            continue;
        }

        let started = Instant::now();
        let result = build_one(registry::get(component), config, runner, logs);
        let outcome = if result.is_ok() {
            Outcome::Built
        } else {
            Outcome::Failed
        };
        summary.record(component, outcome, started.elapsed());
        result?;
    }
    Ok(())
}

fn build_one(
    buildable: &dyn Buildable,
    config: &BuildConfig,
    runner: &dyn ProcessRunner,
    logs: &LogDir,
) -> Result<()> {
    let component = buildable.component();
    println!("=== Building {component} ===");

    let log = logs.component_log(component);
    let ctx = BuildContext::new(config, runner, component, log);
    let build_dir = ctx.build_dir();

    if config.clean && build_dir.exists() {
        std::fs::remove_dir_all(&build_dir)
            .with_context(|| format!("Failed to clean {}", build_dir.display()))?;
        tracing::info!("cleaned {}", build_dir.display());
    }
    std::fs::create_dir_all(&build_dir)
        .with_context(|| format!("Failed to create {}", build_dir.display()))?;

    buildable.build(&ctx)?;

    println!("  Installed {component} (log: {})\n", ctx.log().display());
    Ok(())
}
