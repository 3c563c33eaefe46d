//! GDB builder (debugger only, from the binutils-gdb tree).

use super::{Buildable, Component};
use crate::builder::branches;
use crate::builder::context::{Autotools, BuildContext};
use crate::config::Layout;
use anyhow::Result;
use std::path::PathBuf;

/// GDB component.
pub struct Gdb;

impl Buildable for Gdb {
    fn component(&self) -> Component {
        Component::Gdb
    }

    fn source(&self, layout: &Layout) -> PathBuf {
        layout.checkout(branches::GDB)
    }

    fn host_tools(&self) -> &'static [&'static str] {
        &["make"]
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        let config = ctx.config;
        let source = self.source(ctx.layout());
        let build_dir = ctx.build_dir();

        let mut flags = vec![
            format!("--prefix={}", ctx.install().display()),
            format!("--target={}", config.target),
        ];
        flags.extend(
            [
                "--disable-werror",
                "--disable-nls",
                // The tree also carries binutils; only the debugger is wanted here
                "--disable-binutils",
                "--disable-ld",
                "--disable-gas",
                "--disable-gold",
                "--disable-gprof",
                "--disable-sim",
                "--enable-tui",
                "--with-expat",
                "--without-python",
            ]
            .map(String::from),
        );

        ctx.autotools(&Autotools {
            source: &source,
            build_dir: &build_dir,
            flags,
            build_targets: &["all-gdb"],
            install_targets: &["install-gdb"],
        })
    }
}
