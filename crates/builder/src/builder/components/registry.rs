//! Maps every [`Component`] to its [`Buildable`] implementation.

use super::{
    binutils::Binutils, compiler_rt::CompilerRt, dub::Dub, gdb::Gdb, ldc::Ldc, llvm::Llvm,
    newlib::Newlib, qemu::Qemu, Buildable, Component,
};

/// All registered components, in canonical order.
pub static COMPONENTS: &[&dyn Buildable] = &[
    &Gdb,
    &Qemu,
    &Binutils,
    &Llvm,
    &Ldc,
    &Dub,
    &Newlib,
    &CompilerRt,
];

/// Get the builder for a component.
#[must_use]
pub fn get(component: Component) -> &'static dyn Buildable {
    match component {
        Component::Gdb => &Gdb,
        Component::Qemu => &Qemu,
        Component::Binutils => &Binutils,
        Component::Llvm => &Llvm,
        Component::Ldc => &Ldc,
        Component::Dub => &Dub,
        Component::Newlib => &Newlib,
        Component::CompilerRt => &CompilerRt,
    }
}
