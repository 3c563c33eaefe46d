//! compiler-rt builder.
//!
//! Builds the bare-metal builtins once per multilib variant reported by the
//! installed Clang. Every variant appends to the same log. Afterwards the
//! architecture suffix is dropped from installed artifacts
//! (`libclang_rt.builtins-riscv32.a` becomes `libclang_rt.builtins.a`).

use super::{Buildable, Component};
use crate::builder::branches;
use crate::builder::context::{define, BuildContext};
use crate::builder::multilib::{self, MultilibVariant};
use crate::config::Layout;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Architecture suffixes compiler-rt appends to its artifact names.
const ARCH_SUFFIXES: &[&str] = &["-riscv32", "-riscv64"];

/// Extensions of artifacts that get renamed.
const ARTIFACT_EXTENSIONS: &[&str] = &[".a", ".o"];

/// compiler-rt component.
pub struct CompilerRt;

impl Buildable for CompilerRt {
    fn component(&self) -> Component {
        Component::CompilerRt
    }

    fn prerequisites(&self) -> &'static [Component] {
        &[Component::Llvm]
    }

    fn source(&self, layout: &Layout) -> PathBuf {
        layout.checkout(branches::LLVM_PROJECT).join("compiler-rt")
    }

    fn host_tools(&self) -> &'static [&'static str] {
        &["cmake"]
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        let config = ctx.config;
        let bin = ctx.install_bin();
        let clang = bin.join("clang");
        let target_flag = format!("--target={}", config.target);

        let listing = ctx.capture(
            &ctx.command(&clang, ctx.layout().root())?
                .args([target_flag.as_str(), "-print-multi-lib"]),
        )?;
        let variants = multilib::parse(&listing)?;

        let resource_dir = ctx.capture(
            &ctx.command(&clang, ctx.layout().root())?
                .args([target_flag.as_str(), "-print-resource-dir"]),
        )?;
        let resource_dir = PathBuf::from(resource_dir.trim());
        if resource_dir.as_os_str().is_empty() {
            bail!("{} printed no resource directory", clang.display());
        }

        println!(
            "  {} multilib variant(s), installing under {}",
            variants.len(),
            resource_dir.display()
        );

        let source = self.source(ctx.layout());
        for variant in &variants {
            let build_dir = ctx.build_dir().join(variant.build_subdir());
            std::fs::create_dir_all(&build_dir)?;
            tracing::info!("compiler-rt: building variant {}", variant.dir);

            let defines = variant_defines(ctx, variant, &bin, &resource_dir);
            ctx.cmake(&source, &build_dir, &defines)
                .with_context(|| format!("multilib variant {}", variant.dir))?;
        }

        let renamed = drop_arch_suffixes(&resource_dir)?;
        println!("  Renamed {} artifact(s)", renamed.len());
        Ok(())
    }
}

fn variant_defines(
    ctx: &BuildContext<'_>,
    variant: &MultilibVariant,
    bin: &Path,
    resource_dir: &Path,
) -> Vec<String> {
    let target = variant.target_triple(&ctx.config.target);
    let cflags = variant.cflags();
    let prefix = variant.install_dir(resource_dir);

    vec![
        define("CMAKE_BUILD_TYPE", ctx.config.mode.cmake_build_type()),
        define("CMAKE_INSTALL_PREFIX", prefix.display()),
        define("CMAKE_SYSTEM_NAME", "Generic"),
        define("CMAKE_TRY_COMPILE_TARGET_TYPE", "STATIC_LIBRARY"),
        define("CMAKE_C_COMPILER", bin.join("clang").display()),
        define("CMAKE_CXX_COMPILER", bin.join("clang++").display()),
        define("CMAKE_ASM_COMPILER", bin.join("clang").display()),
        define("CMAKE_AR", bin.join("llvm-ar").display()),
        define("CMAKE_NM", bin.join("llvm-nm").display()),
        define("CMAKE_RANLIB", bin.join("llvm-ranlib").display()),
        define("CMAKE_C_COMPILER_TARGET", &target),
        define("CMAKE_CXX_COMPILER_TARGET", &target),
        define("CMAKE_ASM_COMPILER_TARGET", &target),
        define("CMAKE_C_FLAGS", &cflags),
        define("CMAKE_CXX_FLAGS", &cflags),
        define("CMAKE_ASM_FLAGS", &cflags),
        define("COMPILER_RT_BAREMETAL_BUILD", "ON"),
        define("COMPILER_RT_DEFAULT_TARGET_ONLY", "ON"),
        define("COMPILER_RT_BUILD_BUILTINS", "ON"),
        define("COMPILER_RT_BUILD_CRT", "ON"),
        define("COMPILER_RT_BUILD_SANITIZERS", "OFF"),
        define("COMPILER_RT_BUILD_XRAY", "OFF"),
        define("COMPILER_RT_BUILD_LIBFUZZER", "OFF"),
        define("COMPILER_RT_BUILD_PROFILE", "OFF"),
        define("COMPILER_RT_BUILD_MEMPROF", "OFF"),
        define("COMPILER_RT_BUILD_ORC", "OFF"),
        define("COMPILER_RT_INCLUDE_TESTS", "OFF"),
    ]
}

/// `libclang_rt.builtins-riscv32.a` → `libclang_rt.builtins.a`.
pub fn strip_arch_suffix(file_name: &str) -> Option<String> {
    ARTIFACT_EXTENSIONS.iter().find_map(|ext| {
        let stem = file_name.strip_suffix(ext)?;
        ARCH_SUFFIXES
            .iter()
            .find_map(|suffix| stem.strip_suffix(suffix))
            .filter(|base| !base.is_empty())
            .map(|base| format!("{base}{ext}"))
    })
}

/// Rename every suffixed artifact under `dir`. Returns the new paths.
pub fn drop_arch_suffixes(dir: &Path) -> Result<Vec<PathBuf>> {
    let candidates: Vec<(PathBuf, String)> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let renamed = strip_arch_suffix(&e.file_name().to_string_lossy())?;
            Some((e.into_path(), renamed))
        })
        .collect();

    let mut renamed = Vec::with_capacity(candidates.len());
    for (path, new_name) in candidates {
        let dest = path.with_file_name(&new_name);
        std::fs::rename(&path, &dest).with_context(|| {
            format!("Failed to rename {} -> {new_name}", path.display())
        })?;
        renamed.push(dest);
    }
    Ok(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_strip_arch_suffix() {
        assert_eq!(
            strip_arch_suffix("libclang_rt.builtins-riscv32.a").as_deref(),
            Some("libclang_rt.builtins.a")
        );
        assert_eq!(
            strip_arch_suffix("clang_rt.crtbegin-riscv64.o").as_deref(),
            Some("clang_rt.crtbegin.o")
        );
        assert_eq!(strip_arch_suffix("libclang_rt.builtins.a"), None);
        assert_eq!(strip_arch_suffix("libclang_rt.builtins-riscv32.so"), None);
        assert_eq!(strip_arch_suffix("-riscv32.a"), None);
    }

    #[test]
    fn test_drop_arch_suffixes_walks_variants() {
        let tmp = TempDir::new().unwrap();
        let resource = tmp.path();
        let variant = resource.join("lib/rv32imac/ilp32/lib/generic");
        std::fs::create_dir_all(&variant).unwrap();
        std::fs::write(variant.join("libclang_rt.builtins-riscv32.a"), "a").unwrap();
        std::fs::write(variant.join("clang_rt.crtend-riscv32.o"), "o").unwrap();
        std::fs::write(variant.join("README.txt"), "keep").unwrap();
        std::fs::write(resource.join("lib/libclang_rt.builtins-riscv64.a"), "a").unwrap();

        let renamed = drop_arch_suffixes(resource).unwrap();

        assert_eq!(renamed.len(), 3);
        assert!(variant.join("libclang_rt.builtins.a").is_file());
        assert!(variant.join("clang_rt.crtend.o").is_file());
        assert!(variant.join("README.txt").is_file());
        assert!(resource.join("lib/libclang_rt.builtins.a").is_file());

        let leftovers = WalkDir::new(resource)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains("-riscv"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
