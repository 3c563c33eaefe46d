//! Buildable toolchain components.
//!
//! Each module builds one component from its source checkout.

pub mod binutils;
pub mod compiler_rt;
pub mod dub;
pub mod gdb;
pub mod ldc;
pub mod llvm;
pub mod newlib;
pub mod qemu;
pub mod registry;

use super::context::BuildContext;
use crate::config::Layout;
use anyhow::Result;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// The toolchain components. Declaration order is the canonical build order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Component {
    Gdb,
    Qemu,
    Binutils,
    Llvm,
    Ldc,
    Dub,
    Newlib,
    CompilerRt,
}

impl Component {
    pub const ALL: [Component; 8] = [
        Component::Gdb,
        Component::Qemu,
        Component::Binutils,
        Component::Llvm,
        Component::Ldc,
        Component::Dub,
        Component::Newlib,
        Component::CompilerRt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Gdb => "gdb",
            Self::Qemu => "qemu",
            Self::Binutils => "binutils",
            Self::Llvm => "llvm",
            Self::Ldc => "ldc",
            Self::Dub => "dub",
            Self::Newlib => "newlib",
            Self::CompilerRt => "compiler-rt",
        }
    }

    /// Infix of `EXTRA_<COMPONENT>_OPTS`.
    pub fn env_key(self) -> String {
        self.name().to_uppercase().replace('-', "_")
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A component that can be configured, built and installed.
pub trait Buildable: Sync {
    fn component(&self) -> Component;

    /// Components that must be enabled whenever this one is.
    fn prerequisites(&self) -> &'static [Component] {
        &[]
    }

    /// Source tree handed to the native build system.
    fn source(&self, layout: &Layout) -> PathBuf;

    /// Host programs the build needs on `PATH`.
    fn host_tools(&self) -> &'static [&'static str];

    /// Configure, build and install into the prefix.
    ///
    /// The build directory already exists when this is called.
    fn build(&self, ctx: &BuildContext<'_>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_keys() {
        assert_eq!(Component::CompilerRt.env_key(), "COMPILER_RT");
        assert_eq!(Component::Llvm.env_key(), "LLVM");
    }

    #[test]
    fn test_canonical_order() {
        let mut sorted = Component::ALL;
        sorted.sort();
        assert_eq!(sorted, Component::ALL);
    }
}
