//! Zip packaging for release binaries.
//!
//! Each target produces one archive, `<out>/motd-<alias>.zip`, containing a
//! single deflated entry: the compiled binary under its bare name. A
//! checksums file in GNU coreutils `sha256sum` format is written alongside
//! the archives so downloads can be verified.

use anyhow::{Context, Result, bail};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::targets::{HostOs, archive_file_name, binary_file_name};

/// Filename of the checksums file written next to the archives.
pub const CHECKSUMS_FILE_NAME: &str = "checksums-sha256.txt";

/// Package a compiled binary into `<out_dir>/motd-<alias>.zip`.
///
/// Creates `out_dir` if needed and overwrites any existing archive. The
/// single entry is named after the bare binary (`motd`, or `motd.exe` on
/// Windows hosts) and carries unix mode 0755 so extraction yields an
/// executable file.
pub fn package_binary(
    binary_path: &Path,
    out_dir: &Path,
    alias: &str,
    host: HostOs,
) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let archive_path = out_dir.join(archive_file_name(alias));
    let file = File::create(&archive_path)
        .with_context(|| format!("failed to create archive {}", archive_path.display()))?;

    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);

    zip.start_file(binary_file_name(host), options)
        .with_context(|| format!("failed to start zip entry in {}", archive_path.display()))?;

    let mut src = File::open(binary_path)
        .with_context(|| format!("failed to open binary {}", binary_path.display()))?;
    io::copy(&mut src, &mut zip)
        .with_context(|| format!("failed to write binary into {}", archive_path.display()))?;

    zip.finish()
        .with_context(|| format!("failed to finalize archive {}", archive_path.display()))?;

    Ok(archive_path)
}

/// Compute the SHA256 digest of a file as a lowercase hex string.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for checksum: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for checksum: {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Write `checksums-sha256.txt` for a set of archives.
///
/// One line per archive in GNU coreutils format (`<hash>  <filename>`, two
/// spaces), so the file is directly usable with `sha256sum -c`.
pub fn write_checksums(out_dir: &Path, archives: &[PathBuf]) -> Result<PathBuf> {
    if archives.is_empty() {
        bail!("no archives to checksum");
    }

    let checksums_path = out_dir.join(CHECKSUMS_FILE_NAME);
    let mut file = File::create(&checksums_path)
        .with_context(|| format!("failed to create {}", checksums_path.display()))?;

    for archive in archives {
        let name = archive
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("archive has no valid filename: {}", archive.display()))?;
        let hash = sha256_file(archive)?;
        writeln!(file, "{hash}  {name}")
            .with_context(|| format!("failed to write {}", checksums_path.display()))?;
    }

    Ok(checksums_path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
