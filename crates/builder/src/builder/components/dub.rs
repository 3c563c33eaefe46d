//! DUB (D package manager) builder.
//!
//! DUB has no configure step: its source tree is copied into the build area
//! and its `build.d` script is run by the D compiler, then `bin/` is copied
//! into the install prefix.

use super::{Buildable, Component};
use crate::builder::branches;
use crate::builder::context::BuildContext;
use crate::config::Layout;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// DUB component.
pub struct Dub;

impl Buildable for Dub {
    fn component(&self) -> Component {
        Component::Dub
    }

    fn source(&self, layout: &Layout) -> PathBuf {
        layout.checkout(branches::DUB)
    }

    fn host_tools(&self) -> &'static [&'static str] {
        &[]
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        let dmd = &ctx.config.dmd;
        let build_dir = ctx.build_dir();

        let copied = copy_tree(&self.source(ctx.layout()), &build_dir)?;
        tracing::debug!("copied {copied} dub sources into {}", build_dir.display());

        let build = ctx
            .command(dmd, &build_dir)?
            .args(["-run", "build.d"])
            .env("DMD", dmd);
        ctx.run("build", &build)?;

        let out = build_dir.join("bin");
        if !out.join("dub").is_file() {
            bail!(
                "dub build produced no {}, see {}",
                out.join("dub").display(),
                ctx.log().display()
            );
        }

        let installed = install_binaries(&out, &ctx.install_bin())?;
        for path in installed {
            println!("  Installed: {}", path.display());
        }
        Ok(())
    }
}

/// Copy `src` into `dest` recursively, skipping `.git`. Returns files copied.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<usize> {
    if !src.is_dir() {
        bail!("{} not found", src.display());
    }

    let mut copied = 0;
    let walker = WalkDir::new(src)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    for entry in walker {
        let entry = entry?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            let link = std::fs::read_link(entry.path())?;
            if target.symlink_metadata().is_ok() {
                std::fs::remove_file(&target)?;
            }
            std::os::unix::fs::symlink(link, &target)?;
        } else {
            std::fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy {} -> {}", entry.path().display(), target.display())
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Copy every regular file in `out` into `bin`.
fn install_binaries(out: &Path, bin: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(bin)?;
    let mut installed = Vec::new();
    for entry in std::fs::read_dir(out)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            let dest = bin.join(entry.file_name());
            std::fs::copy(entry.path(), &dest)?;
            installed.push(dest);
        }
    }
    installed.sort();
    Ok(installed)
}
