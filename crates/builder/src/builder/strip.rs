//! Strip symbols from installed executables.
//!
//! Only 64-bit ELF and PE32+ images are stripped; anything else in
//! `<install>/bin` (scripts, 32-bit images, symlinks) is left untouched.

use super::runner::{Invocation, ProcessRunner};
use crate::config::BuildConfig;
use anyhow::{Context, Result};
use std::io::Read;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Bytes read from each file to classify it.
const HEADER_LEN: u64 = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryFormat {
    Elf64,
    Pe64,
    Other,
}

impl BinaryFormat {
    pub fn is_strippable(self) -> bool {
        matches!(self, Self::Elf64 | Self::Pe64)
    }
}

/// Classify a file from its leading bytes.
pub fn detect(header: &[u8]) -> BinaryFormat {
    if infer::app::is_elf(header) {
        // EI_CLASS: 2 is ELFCLASS64
        return if header.get(4) == Some(&2) {
            BinaryFormat::Elf64
        } else {
            BinaryFormat::Other
        };
    }
    if infer::app::is_exe(header) && is_pe32_plus(header) {
        return BinaryFormat::Pe64;
    }
    BinaryFormat::Other
}

/// PE signature at `e_lfanew`, optional header magic 0x20b.
fn is_pe32_plus(header: &[u8]) -> bool {
    let read_u32 = |at: usize| {
        header
            .get(at..at + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    };
    let Some(pe) = read_u32(0x3c).map(|v| v as usize) else {
        return false;
    };
    if header.get(pe..pe + 4) != Some(b"PE\0\0".as_slice()) {
        return false;
    }
    // COFF header is 20 bytes; optional header magic follows
    header
        .get(pe + 24..pe + 26)
        .is_some_and(|m| u16::from_le_bytes([m[0], m[1]]) == 0x20b)
}

fn read_header(path: &Path) -> Result<Vec<u8>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut header = Vec::new();
    file.take(HEADER_LEN).read_to_end(&mut header)?;
    Ok(header)
}

#[derive(Debug, Default)]
pub struct StripReport {
    pub stripped: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

/// Executable `llvm-strip` from the install prefix, else host `strip`.
fn strip_tool(config: &BuildConfig) -> Option<PathBuf> {
    let llvm_strip = config.layout.install_bin().join("llvm-strip");
    if is_executable(&llvm_strip) {
        return Some(llvm_strip);
    }
    which::which("strip").ok()
}

/// Strip every recognized executable under `<install>/bin`.
///
/// Failures on individual files are warnings and end up in
/// [`StripReport::failed`].
pub fn strip_install(
    config: &BuildConfig,
    runner: &dyn ProcessRunner,
    log: &Path,
) -> Result<StripReport> {
    let bin = config.layout.install_bin();
    let mut report = StripReport::default();
    if !bin.is_dir() {
        tracing::warn!("nothing to strip, {} does not exist", bin.display());
        return Ok(report);
    }
    let Some(tool) = strip_tool(config) else {
        tracing::warn!("no strip tool found, leaving binaries as they are");
        return Ok(report);
    };

    println!("=== Stripping {} ===", bin.display());

    for entry in WalkDir::new(&bin).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if entry.metadata()?.permissions().mode() & 0o111 == 0 {
            continue;
        }
        let header = match read_header(path) {
            Ok(header) => header,
            Err(err) => {
                tracing::warn!("could not read {}: {err:#}", path.display());
                report.failed.push(path.to_path_buf());
                continue;
            }
        };
        if !detect(&header).is_strippable() {
            report.skipped.push(path.to_path_buf());
            continue;
        }

        let strip = Invocation::new(&tool, &bin).arg("--strip-all").arg(path);
        match runner.run(&strip, log) {
            Ok(status) if status.success() => report.stripped.push(path.to_path_buf()),
            Ok(status) => {
                tracing::warn!("strip failed for {} ({status})", path.display());
                report.failed.push(path.to_path_buf());
            }
            Err(err) => {
                tracing::warn!("strip failed for {}: {err:#}", path.display());
                report.failed.push(path.to_path_buf());
            }
        }
    }

    println!(
        "  Stripped {} file(s), skipped {}, failed {}",
        report.stripped.len(),
        report.skipped.len(),
        report.failed.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elf(class: u8) -> Vec<u8> {
        let mut bytes = vec![0u8; 64];
        bytes[..4].copy_from_slice(b"\x7fELF");
        bytes[4] = class;
        bytes[5] = 1;
        bytes[6] = 1;
        bytes
    }

    fn pe(magic: u16) -> Vec<u8> {
        let mut bytes = vec![0u8; 0x200];
        bytes[..2].copy_from_slice(b"MZ");
        bytes[0x3c..0x40].copy_from_slice(&0x80u32.to_le_bytes());
        bytes[0x80..0x84].copy_from_slice(b"PE\0\0");
        bytes[0x80 + 24..0x80 + 26].copy_from_slice(&magic.to_le_bytes());
        bytes
    }

    #[test]
    fn test_detect_elf_classes() {
        assert_eq!(detect(&elf(2)), BinaryFormat::Elf64);
        assert_eq!(detect(&elf(1)), BinaryFormat::Other);
    }

    #[test]
    fn test_detect_pe_variants() {
        assert_eq!(detect(&pe(0x20b)), BinaryFormat::Pe64);
        assert_eq!(detect(&pe(0x10b)), BinaryFormat::Other);
    }

    #[test]
    fn test_detect_other() {
        assert_eq!(detect(b"#!/bin/sh\necho hi\n"), BinaryFormat::Other);
        assert_eq!(detect(&[]), BinaryFormat::Other);
        // MZ with a bogus e_lfanew
        let mut truncated = pe(0x20b);
        truncated[0x3c..0x40].copy_from_slice(&0xffffu32.to_le_bytes());
        assert_eq!(detect(&truncated), BinaryFormat::Other);
    }
}
