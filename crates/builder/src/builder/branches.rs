//! Source checkouts and branch validation.
//!
//! Mismatches are advisory: they are reported and the build carries on.

use super::runner::{Invocation, ProcessRunner};
use crate::config::Layout;
use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const GDB: &str = "riscv-gdb";
pub const QEMU: &str = "riscv-qemu";
pub const BINUTILS: &str = "riscv-binutils";
pub const LLVM_PROJECT: &str = "llvm-project";
pub const LDC: &str = "ldc";
pub const DUB: &str = "dub";
pub const NEWLIB: &str = "newlib";

/// A git checkout whose branch is validated before building.
#[derive(Clone, Copy, Debug)]
pub struct Checkout {
    /// Key in the `[branches]` table.
    pub name: &'static str,
    /// Sibling directory name; `None` for this repository.
    pub dir: Option<&'static str>,
}

impl Checkout {
    pub fn path(&self, layout: &Layout) -> PathBuf {
        match self.dir {
            Some(dir) => layout.checkout(dir),
            None => layout.root().to_path_buf(),
        }
    }
}

pub const CHECKOUTS: [Checkout; 8] = [
    Checkout { name: "toolchain", dir: None },
    Checkout { name: "gdb", dir: Some(GDB) },
    Checkout { name: "qemu", dir: Some(QEMU) },
    Checkout { name: "binutils", dir: Some(BINUTILS) },
    Checkout { name: "llvm-project", dir: Some(LLVM_PROJECT) },
    Checkout { name: "ldc", dir: Some(LDC) },
    Checkout { name: "dub", dir: Some(DUB) },
    Checkout { name: "newlib", dir: Some(NEWLIB) },
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BranchCheck {
    Match,
    Mismatch { expected: String, actual: String },
    Missing,
    Unconfigured { actual: String },
    QueryFailed(String),
}

/// Compare every checkout's current branch with its expectation.
///
/// Never fails; problems are logged as warnings and returned.
pub fn validate(
    layout: &Layout,
    expected: &BTreeMap<String, String>,
    runner: &dyn ProcessRunner,
) -> Vec<(&'static str, BranchCheck)> {
    println!("=== Checking source branches ===");

    CHECKOUTS
        .iter()
        .map(|checkout| {
            let check = check(checkout, layout, expected, runner);
            report(checkout, layout, &check);
            (checkout.name, check)
        })
        .collect()
}

fn check(
    checkout: &Checkout,
    layout: &Layout,
    expected: &BTreeMap<String, String>,
    runner: &dyn ProcessRunner,
) -> BranchCheck {
    let path = checkout.path(layout);
    if !path.is_dir() {
        return BranchCheck::Missing;
    }

    let actual = match current_branch(&path, runner) {
        Ok(branch) => branch,
        Err(err) => return BranchCheck::QueryFailed(format!("{err:#}")),
    };

    match expected.get(checkout.name) {
        None => BranchCheck::Unconfigured { actual },
        Some(want) if *want == actual => BranchCheck::Match,
        Some(want) => BranchCheck::Mismatch {
            expected: want.clone(),
            actual,
        },
    }
}

fn report(checkout: &Checkout, layout: &Layout, check: &BranchCheck) {
    let name = checkout.name;
    match check {
        BranchCheck::Match => tracing::info!("{name}: on expected branch"),
        BranchCheck::Mismatch { expected, actual } => {
            tracing::warn!("{name}: on branch '{actual}', expected '{expected}'");
        }
        BranchCheck::Missing => {
            tracing::warn!("{name}: checkout not found at {}", checkout.path(layout).display());
        }
        BranchCheck::Unconfigured { actual } => {
            tracing::warn!("{name}: no expected branch configured (on '{actual}')");
        }
        BranchCheck::QueryFailed(err) => tracing::warn!("{name}: could not read branch: {err}"),
    }
}

fn current_branch(dir: &Path, runner: &dyn ProcessRunner) -> Result<String> {
    let query = Invocation::new("git", dir).args(["rev-parse", "--abbrev-ref", "HEAD"]);
    let captured = runner.capture(&query)?;
    if !captured.status.success() {
        bail!("git rev-parse failed: {}", captured.stderr.trim());
    }
    Ok(captured.stdout.trim().to_string())
}
