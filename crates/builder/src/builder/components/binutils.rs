//! GNU binutils builder (assembler, linker, object tools for the target).

use super::{Buildable, Component};
use crate::builder::branches;
use crate::builder::context::{Autotools, BuildContext};
use crate::config::Layout;
use anyhow::Result;
use std::path::PathBuf;

/// binutils component.
pub struct Binutils;

impl Buildable for Binutils {
    fn component(&self) -> Component {
        Component::Binutils
    }

    fn source(&self, layout: &Layout) -> PathBuf {
        layout.checkout(branches::BINUTILS)
    }

    fn host_tools(&self) -> &'static [&'static str] {
        &["make"]
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        let source = self.source(ctx.layout());
        let build_dir = ctx.build_dir();

        let mut flags = vec![
            format!("--prefix={}", ctx.install().display()),
            format!("--target={}", ctx.config.target),
        ];
        flags.extend(
            [
                "--disable-werror",
                "--disable-nls",
                "--disable-gdb",
                "--disable-gdbserver",
                "--disable-sim",
                "--disable-libdecnumber",
                "--disable-readline",
                // LLVM's gold plugin is built against these headers
                "--enable-plugins",
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
