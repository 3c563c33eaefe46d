//! LLVM/Clang/LLD builder.
//!
//! After install, `<triple>-<alias>` links are created in `<install>/bin` so
//! build systems that look for target-prefixed tools pick up Clang.
//!
//! Links replace entries of the same name, so `<triple>-as` from binutils
//! becomes the LLVM assembler. GNU `as` stays reachable as
//! `<install>/<triple>/bin/as`.

use super::{Buildable, Component};
use crate::builder::branches;
use crate::builder::context::{define, on_off, BuildContext};
use crate::config::Layout;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// `(alias, tool)`: `<triple>-<alias>` links to `<tool>` in the same directory.
pub const TOOL_LINKS: &[(&str, &str)] = &[
    ("clang", "clang"),
    ("clang++", "clang++"),
    ("cc", "clang"),
    ("c++", "clang++"),
    ("as", "llvm-mc"),
    ("ld.lld", "ld.lld"),
    ("llvm-ar", "llvm-ar"),
    ("llvm-ranlib", "llvm-ranlib"),
    ("llvm-objcopy", "llvm-objcopy"),
    ("llvm-objdump", "llvm-objdump"),
];

/// LLVM component.
pub struct Llvm;

impl Buildable for Llvm {
    fn component(&self) -> Component {
        Component::Llvm
    }

    fn prerequisites(&self) -> &'static [Component] {
        &[Component::Binutils]
    }

    fn source(&self, layout: &Layout) -> PathBuf {
        layout.checkout(branches::LLVM_PROJECT).join("llvm")
    }

    fn host_tools(&self) -> &'static [&'static str] {
        &["cmake"]
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        let config = ctx.config;
        let binutils_include = ctx.layout().checkout(branches::BINUTILS).join("include");

        let defines = vec![
            define("CMAKE_BUILD_TYPE", config.mode.cmake_build_type()),
            define("CMAKE_INSTALL_PREFIX", ctx.install().display()),
            define("LLVM_ENABLE_PROJECTS", "clang;lld"),
            define("LLVM_TARGETS_TO_BUILD", "host;RISCV"),
            define("LLVM_DEFAULT_TARGET_TRIPLE", &config.target),
            define("LLVM_BINUTILS_INCDIR", binutils_include.display()),
            define("BUILD_SHARED_LIBS", on_off(config.shared_libs)),
            define("LLVM_ENABLE_ASSERTIONS", on_off(config.assertions)),
            define("LLVM_INSTALL_UTILS", "ON"),
            define("LLVM_INCLUDE_BENCHMARKS", "OFF"),
        ];

        ctx.cmake(&self.source(ctx.layout()), &ctx.build_dir(), &defines)?;

        let links = link_target_tools(&ctx.install_bin(), &config.target)?;
        println!("  Linked {} {}-* tools", links.len(), config.target);
        Ok(())
    }
}

/// Create `<triple>-<alias>` symlinks in `bin`, replacing existing entries.
pub fn link_target_tools(bin: &Path, triple: &str) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(bin)?;
    let mut links = Vec::with_capacity(TOOL_LINKS.len());

    for (alias, tool) in TOOL_LINKS {
        let link = bin.join(format!("{triple}-{alias}"));
        if link.symlink_metadata().is_ok() {
            std::fs::remove_file(&link)
                .with_context(|| format!("Failed to replace {}", link.display()))?;
        }
        std::os::unix::fs::symlink(tool, &link)
            .with_context(|| format!("Failed to link {} -> {tool}", link.display()))?;
        links.push(link);
    }

    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_links_resolve_to_tools() {
        let tmp = TempDir::new().unwrap();
        let bin = tmp.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("clang"), "").unwrap();
        std::fs::write(bin.join("clang++"), "").unwrap();

        link_target_tools(&bin, "riscv32-unknown-elf").unwrap();

        let cc = bin.join("riscv32-unknown-elf-cc");
        assert_eq!(std::fs::read_link(&cc).unwrap(), PathBuf::from("clang"));
        assert_eq!(
            cc.canonicalize().unwrap(),
            bin.join("clang").canonicalize().unwrap()
        );
        assert_eq!(
            std::fs::read_link(bin.join("riscv32-unknown-elf-c++")).unwrap(),
            PathBuf::from("clang++")
        );
        assert_eq!(
            std::fs::read_link(bin.join("riscv32-unknown-elf-as")).unwrap(),
            PathBuf::from("llvm-mc")
        );
    }

    #[test]
    fn test_links_replace_existing_entries() {
        let tmp = TempDir::new().unwrap();
        let bin = tmp.path().to_path_buf();
        std::fs::write(bin.join("riscv32-unknown-elf-clang"), "stale").unwrap();
        std::fs::write(bin.join("riscv32-unknown-elf-as"), "gnu as").unwrap();
        std::os::unix::fs::symlink("nowhere", bin.join("riscv32-unknown-elf-ld.lld")).unwrap();

        let links = link_target_tools(&bin, "riscv32-unknown-elf").unwrap();

        assert_eq!(links.len(), TOOL_LINKS.len());
        assert_eq!(
            std::fs::read_link(bin.join("riscv32-unknown-elf-clang")).unwrap(),
            PathBuf::from("clang")
        );
        assert_eq!(
            std::fs::read_link(bin.join("riscv32-unknown-elf-ld.lld")).unwrap(),
            PathBuf::from("ld.lld")
        );
        assert_eq!(
            std::fs::read_link(bin.join("riscv32-unknown-elf-as")).unwrap(),
            PathBuf::from("llvm-mc")
        );
    }
}
