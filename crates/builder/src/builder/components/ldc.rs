//! LDC (LLVM-based D compiler) builder.

use super::{Buildable, Component};
use crate::builder::branches;
use crate::builder::context::{define, on_off, BuildContext};
use crate::config::Layout;
use anyhow::Result;
use std::path::PathBuf;

/// LDC component.
pub struct Ldc;

impl Buildable for Ldc {
    fn component(&self) -> Component {
        Component::Ldc
    }

    fn prerequisites(&self) -> &'static [Component] {
        &[Component::Llvm]
    }

    fn source(&self, layout: &Layout) -> PathBuf {
        layout.checkout(branches::LDC)
    }

    fn host_tools(&self) -> &'static [&'static str] {
        &["cmake"]
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Result<()> {
        let config = ctx.config;

        let mut defines = vec![
            define("CMAKE_BUILD_TYPE", config.mode.cmake_build_type()),
            define("CMAKE_INSTALL_PREFIX", ctx.install().display()),
            define("LLVM_ROOT_DIR", ctx.install().display()),
            define("BUILD_SHARED_LIBS", on_off(config.shared_libs)),
            define("LDC_ENABLE_ASSERTIONS", on_off(config.assertions)),
        ];
        // Bootstrap compiler; CMake searches PATH when unset
        if let Some(dmd) = &config.host_dmd {
            defines.push(define("D_COMPILER", dmd.display()));
        }

        ctx.cmake(&self.source(ctx.layout()), &ctx.build_dir(), &defines)
    }
}
