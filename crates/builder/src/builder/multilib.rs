//! Parser for `clang -print-multi-lib` output.
//!
//! Each line is `<dir>;<flags>` where flags are `@`-separated without their
//! leading dash, e.g. `rv32imac/ilp32;@march=rv32imac@mabi=ilp32`. The
//! default variant is `.;`.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultilibVariant {
    /// Relative library directory, `.` for the default variant.
    pub dir: String,
    /// Compiler flags selecting this variant, e.g. `-march=rv32imac`.
    pub flags: Vec<String>,
}

impl MultilibVariant {
    pub fn default_variant() -> Self {
        Self {
            dir: ".".to_string(),
            flags: Vec::new(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.dir == "."
    }

    /// Build subdirectory name: `rv32imac/ilp32` becomes `rv32imac_ilp32`.
    pub fn build_subdir(&self) -> String {
        if self.is_default() {
            "default".to_string()
        } else {
            self.dir.replace('/', "_")
        }
    }

    /// `<resource_dir>/lib/<dir>`.
    pub fn install_dir(&self, resource_dir: &Path) -> PathBuf {
        let lib = resource_dir.join("lib");
        if self.is_default() {
            lib
        } else {
            lib.join(&self.dir)
        }
    }

    pub fn cflags(&self) -> String {
        self.flags.join(" ")
    }

    /// `-march=` value, if the variant pins one.
    pub fn march(&self) -> Option<&str> {
        self.flags.iter().find_map(|f| f.strip_prefix("-march="))
    }

    /// `default` with its architecture swapped to match `-march`.
    ///
    /// `rv64*` variants of `riscv32-unknown-elf` build for `riscv64-unknown-elf`.
    pub fn target_triple(&self, default: &str) -> String {
        let arch = match self.march() {
            Some(march) if march.starts_with("rv64") => "riscv64",
            Some(march) if march.starts_with("rv32") => "riscv32",
            _ => return default.to_string(),
        };
        match default.split_once('-') {
            Some((_, rest)) => format!("{arch}-{rest}"),
            None => arch.to_string(),
        }
    }
}

/// Parse `-print-multi-lib` output. Empty output yields the default variant.
pub fn parse(output: &str) -> Result<Vec<MultilibVariant>> {
    let mut variants: Vec<MultilibVariant> = Vec::new();

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((dir, flags)) = line.split_once(';') else {
            bail!("Malformed multilib line (no ';'): {line:?}");
        };
        if dir.is_empty() {
            bail!("Malformed multilib line (empty directory): {line:?}");
        }
        if variants.iter().any(|v| v.dir == dir) {
            continue;
        }

        variants.push(MultilibVariant {
            dir: dir.to_string(),
            flags: flags
                .split('@')
                .filter(|f| !f.is_empty())
                .map(|f| format!("-{f}"))
                .collect(),
        });
    }

    if variants.is_empty() {
        variants.push(MultilibVariant::default_variant());
    }
    Ok(variants)
}
