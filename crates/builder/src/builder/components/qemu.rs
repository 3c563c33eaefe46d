//! QEMU builder (RISC-V system emulators).

use super::{Buildable, Component};
use crate::builder::branches;
use crate::builder::context::{Autotools, BuildContext};
use crate::config::{BuildMode, Layout};
use anyhow::Result;
use std::path::PathBuf;

/// Emulated targets.
const TARGET_LIST: &str = "riscv32-softmmu,riscv64-softmmu";

/// QEMU component.
pub struct Qemu;

impl Buildable for Qemu {
    fn component(&self) -> Component {
        Component::Qemu
    }

    fn source(&self, layout: &Layout) -> PathBuf {
        layout.checkout(branches::QEMU)
    }

    fn host_tools(&self) -> &'static [&'static str] {
        &["make"]
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        let source = self.source(ctx.layout());
        let build_dir = ctx.build_dir();

        let mut flags = vec![
            format!("--prefix={}", ctx.install().display()),
            format!("--target-list={TARGET_LIST}"),
            "--disable-werror".to_string(),
            "--disable-docs".to_string(),
        ];
        if ctx.config.mode == BuildMode::Debug {
            flags.push("--enable-debug".to_string());
        }

        ctx.autotools(&Autotools {
            source: &source,
            build_dir: &build_dir,
            flags,
            build_targets: &[],
            install_targets: &["install"],
        })
    }
}
