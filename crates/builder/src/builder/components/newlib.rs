//! newlib (C library) builder, compiled with the freshly installed Clang.

use super::{Buildable, Component};
use crate::builder::branches;
use crate::builder::context::{Autotools, BuildContext};
use crate::config::{BuildMode, Layout};
use anyhow::Result;
use std::path::PathBuf;

/// newlib component.
pub struct Newlib;

impl Buildable for Newlib {
    fn component(&self) -> Component {
        Component::Newlib
    }

    fn prerequisites(&self) -> &'static [Component] {
        &[Component::Llvm]
    }

    fn source(&self, layout: &Layout) -> PathBuf {
        layout.checkout(branches::NEWLIB)
    }

    fn host_tools(&self) -> &'static [&'static str] {
        &["make"]
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        let config = ctx.config;
        let triple = &config.target;
        let bin = ctx.install_bin();
        let source = self.source(ctx.layout());
        let build_dir = ctx.build_dir();

        let optimize = match config.mode {
            BuildMode::Debug => "-O0",
            BuildMode::Release | BuildMode::ReleaseWithDebugInfo => "-O2",
        };

        let mut flags = vec![
            format!("--prefix={}", ctx.install().display()),
            format!("--target={triple}"),
            // The llvm step installs these target-prefixed links
            format!("CC_FOR_TARGET={}", bin.join(format!("{triple}-clang")).display()),
            format!("AR_FOR_TARGET={}", bin.join("llvm-ar").display()),
            format!("RANLIB_FOR_TARGET={}", bin.join("llvm-ranlib").display()),
            format!("NM_FOR_TARGET={}", bin.join("llvm-nm").display()),
            format!("CFLAGS_FOR_TARGET=-g {optimize} -ffunction-sections -fdata-sections -mcmodel=medany"),
        ];
        flags.extend(
            [
                "--disable-nls",
                "--disable-newlib-supplied-syscalls",
                "--enable-newlib-reent-small",
                "--enable-newlib-nano-malloc",
                "--enable-lite-exit",
                "--enable-newlib-global-atexit",
            ]
            .map(String::from),
        );

        ctx.autotools(&Autotools {
            source: &source,
            build_dir: &build_dir,
            flags,
            build_targets: &[],
            install_targets: &["install"],
        })
    }
}
