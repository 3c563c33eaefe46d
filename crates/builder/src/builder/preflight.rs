//! Host tool checks before anything is built.

use super::components::registry;
use crate::config::BuildConfig;
use anyhow::{bail, Result};
use std::collections::BTreeSet;

/// Host programs needed by the enabled components, plus `git`.
pub fn required_tools(config: &BuildConfig) -> BTreeSet<&'static str> {
    let mut tools = BTreeSet::from(["git"]);
    for component in &config.components {
        tools.extend(registry::get(*component).host_tools().iter().copied());
    }
    tools
}

pub fn check(config: &BuildConfig) -> Result<()> {
    check_with(config, |tool| which::which(tool).is_ok())
}

/// Like [`check`], with tool lookup supplied by the caller.
pub fn check_with(config: &BuildConfig, found: impl Fn(&str) -> bool) -> Result<()> {
    let missing: Vec<_> = required_tools(config)
        .into_iter()
        .filter(|tool| !found(tool))
        .collect();

    if !missing.is_empty() {
        println!("\nPreflight FAILED. Missing tools:");
        for tool in &missing {
            println!("   - {tool}");
        }
        bail!("Missing host tools: {}", missing.join(", "));
    }

    tracing::info!("preflight ok, CMake generator: {}", config.generator.cmake_name());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli;
    use crate::config::{EnvVars, Layout, ToolchainFile};

    fn config(args: &[&str]) -> BuildConfig {
        let argv = std::iter::once("build-toolchain").chain(args.iter().copied());
        BuildConfig::resolve(
            &cli::parse(argv).unwrap(),
            &EnvVars::default(),
            Layout::new("/work/toolchain"),
            &ToolchainFile::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_required_tools_follow_components() {
        let tools = required_tools(&config(&["--with-gdb"]));
        assert_eq!(tools, BTreeSet::from(["git", "make"]));

        let tools = required_tools(&config(&["--with-llvm"]));
        assert_eq!(tools, BTreeSet::from(["cmake", "git", "make"]));
    }

    #[test]
    fn test_missing_tools_fail() {
        let err = check_with(&config(&["--with-llvm"]), |tool| tool != "cmake").unwrap_err();
        assert!(err.to_string().contains("cmake"));
    }

    #[test]
    fn test_all_present_passes() {
        assert!(check_with(&config(&["--all"]), |_| true).is_ok());
    }

    #[test]
    fn test_tool_lookup() {
        assert!(which::which("sh").is_ok());
        assert!(which::which("this-tool-definitely-does-not-exist-12345").is_err());
    }
}
