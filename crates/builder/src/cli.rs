//! Command-line flags.

use crate::builder::components::Component;
use crate::config::BuildMode;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::collections::BTreeSet;
use std::ffi::OsString;

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "build-toolchain",
    about = "Build the RISC-V embedded cross toolchain",
    disable_version_flag = true,
    args_override_self = true
)]
pub struct Cli {
    /// Remove each selected component's build directory before building it
    #[arg(long)]
    pub clean: bool,

    /// Build mode, given as `--mode=<MODE>`
    #[arg(long, value_enum, require_equals = true, default_value_t = BuildMode::Release)]
    pub mode: BuildMode,

    /// Build gdb
    #[arg(long = "with-gdb")]
    pub with_gdb: bool,

    /// Build qemu
    #[arg(long = "with-qemu")]
    pub with_qemu: bool,

    /// Build binutils
    #[arg(long = "with-binutils")]
    pub with_binutils: bool,

    /// Build LLVM/Clang (implies binutils)
    #[arg(long = "with-llvm")]
    pub with_llvm: bool,

    /// Build the LDC D compiler (implies llvm)
    #[arg(long = "with-ldc")]
    pub with_ldc: bool,

    /// Build newlib (implies llvm)
    #[arg(long = "with-newlib")]
    pub with_newlib: bool,

    /// Build compiler-rt for every multilib (implies llvm)
    #[arg(long = "with-compiler-rt")]
    pub with_compiler_rt: bool,

    /// Build DUB. Without DMD set, LDC (with LLVM and binutils) is built to compile it
    #[arg(long = "with-dub")]
    pub with_dub: bool,

    /// Build every component
    #[arg(long)]
    pub all: bool,

    /// Strip installed binaries (ignored in debug mode)
    #[arg(long)]
    pub strip: bool,
}

impl Cli {
    /// Components named on the command line, before prerequisites are added.
    pub fn requested(&self) -> BTreeSet<Component> {
        if self.all {
            return Component::ALL.into_iter().collect();
        }

        [
            (self.with_gdb, Component::Gdb),
            (self.with_qemu, Component::Qemu),
            (self.with_binutils, Component::Binutils),
            (self.with_llvm, Component::Llvm),
            (self.with_ldc, Component::Ldc),
            (self.with_dub, Component::Dub),
            (self.with_newlib, Component::Newlib),
            (self.with_compiler_rt, Component::CompilerRt),
        ]
        .into_iter()
        .filter_map(|(on, component)| on.then_some(component))
        .collect()
    }
}

/// Early termination requested by the parser: usage text plus exit code.
#[derive(Debug)]
pub struct Exit {
    pub code: u8,
    pub text: String,
}

impl Exit {
    /// `--help` goes to stdout, everything else to stderr.
    pub fn print(&self) {
        if self.code == 0 {
            print!("{}", self.text);
        } else {
            eprint!("{}", self.text);
        }
    }
}

/// Parse process arguments (including the program name).
///
/// `--help` exits with 0; any unrecognized token exits with 1.
pub fn parse<I, T>(args: I) -> Result<Cli, Exit>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|err| {
        let code = match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
            _ => 1,
        };
        let mut text = err.render().to_string();
        if code != 0 && !text.contains("Usage:") {
            text.push_str(&format!("\n{}\n", Cli::command().render_usage()));
        }
        Exit { code, text }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let argv = std::iter::once("build-toolchain").chain(args.iter().copied());
        parse(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = cli(&[]);
        assert_eq!(cli.mode, BuildMode::Release);
        assert!(!cli.clean);
        assert!(!cli.strip);
        assert!(cli.requested().is_empty());
    }

    #[test]
    fn test_mode_values() {
        assert_eq!(cli(&["--mode=debug"]).mode, BuildMode::Debug);
        assert_eq!(cli(&["--mode=release"]).mode, BuildMode::Release);
        assert_eq!(
            cli(&["--mode=reldebug"]).mode,
            BuildMode::ReleaseWithDebugInfo
        );
    }

    #[test]
    fn test_with_flags_select_components() {
        let requested = cli(&["--with-gdb", "--with-compiler-rt"]).requested();
        assert_eq!(
            requested.into_iter().collect::<Vec<_>>(),
            vec![Component::Gdb, Component::CompilerRt]
        );
    }

    #[test]
    fn test_all_selects_everything() {
        assert_eq!(cli(&["--all"]).requested().len(), Component::ALL.len());
    }

    #[test]
    fn test_help_exits_zero_with_usage() {
        let exit = parse(["build-toolchain", "--help"]).unwrap_err();
        assert_eq!(exit.code, 0);
        assert!(exit.text.contains("Usage:"));
        assert!(exit.text.contains("--with-llvm"));
    }

    #[test]
    fn test_unknown_flag_exits_one_with_usage() {
        let exit = parse(["build-toolchain", "--with-gcc"]).unwrap_err();
        assert_eq!(exit.code, 1);
        assert!(exit.text.contains("Usage:"));
    }

    #[test]
    fn test_stray_token_exits_one() {
        let exit = parse(["build-toolchain", "llvm"]).unwrap_err();
        assert_eq!(exit.code, 1);
    }

    #[test]
    fn test_repeated_flags_last_one_wins() {
        let parsed = cli(&["--with-llvm", "--with-llvm", "--mode=debug", "--mode=release"]);
        assert_eq!(parsed.mode, BuildMode::Release);
        assert_eq!(
            parsed.requested().into_iter().collect::<Vec<_>>(),
            vec![Component::Llvm]
        );
        assert!(cli(&["--strip", "--strip", "--clean", "--clean"]).strip);
    }

    #[test]
    fn test_mode_requires_equals() {
        let exit = parse(["build-toolchain", "--mode", "debug"]).unwrap_err();
        assert_eq!(exit.code, 1);
    }

    #[test]
    fn test_dub_help_mentions_dmd() {
        let exit = parse(["build-toolchain", "--help"]).unwrap_err();
        assert!(exit.text.contains("Without DMD set"));
    }

    #[test]
    fn test_bad_mode_exits_one() {
        let exit = parse(["build-toolchain", "--mode=fast"]).unwrap_err();
        assert_eq!(exit.code, 1);
    }
}
