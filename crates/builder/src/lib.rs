//! # RISC-V toolchain builder
//!
//! Builds a cross toolchain for `riscv32-unknown-elf` from sibling source
//! checkouts: gdb, qemu, binutils, LLVM/Clang, LDC, DUB, newlib and
//! compiler-rt.
//!
//! ## Layout
//!
//! ```text
//! <parent>/
//!   toolchain/          this repository (the root)
//!     config/toolchain.toml
//!     build/<component>/
//!     install/
//!     logs/<timestamp>/<component>.log
//!   riscv-gdb/  riscv-qemu/  riscv-binutils/  llvm-project/
//!   ldc/  dub/  newlib/
//! ```

pub mod builder;
pub mod cli;
pub mod config;
