//! External toolchain invocations.
//!
//! All functions shell out via `std::process::Command` and check the exit
//! status, failing with the command's trimmed stderr on non-zero exit. The
//! static-CRT rustflags are passed per-invocation to the cargo child process
//! rather than written into our own environment.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::targets::{HostOs, binary_file_name};

/// Rustflags forcing static linkage against the C runtime, so the released
/// binaries do not depend on a system libc/msvcrt at the built version.
const STATIC_CRT_RUSTFLAGS: &str = "-C target-feature=+crt-static";

/// Cross-compilation linker packages required on Linux hosts for the
/// non-native targets in the table.
const CROSS_GCC_PACKAGES: &[&str] = &["gcc-aarch64-linux-gnu", "gcc-i686-linux-gnu"];

// ---------------------------------------------------------------------------
// Internal helper
// ---------------------------------------------------------------------------

/// Run a command to completion and fail with its stderr on non-zero exit.
fn run_checked(cmd: &mut Command, what: &str) -> Result<()> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to execute {what}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{what} failed (exit {}): {}", output.status, stderr.trim());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Install the cross-compilation gcc toolchains via apt (Linux hosts only).
pub fn install_cross_compilers() -> Result<()> {
    for pkg in CROSS_GCC_PACKAGES {
        run_checked(
            Command::new("sudo").args(["apt", "install", "-y", pkg]),
            &format!("apt install {pkg}"),
        )?;
    }
    Ok(())
}

/// Register a target with the toolchain: `rustup target add <triple>`.
pub fn add_target(triple: &str) -> Result<()> {
    run_checked(
        Command::new("rustup").args(["target", "add", triple]),
        &format!("rustup target add {triple}"),
    )
}

/// Build the application in release mode for a target triple.
///
/// Runs `cargo build --release --target <triple>` inside `project_dir` with
/// the static-CRT rustflags set only on the child process environment.
pub fn build_release(project_dir: &Path, triple: &str) -> Result<()> {
    run_checked(
        Command::new("cargo")
            .args(["build", "--release", "--target", triple])
            .current_dir(project_dir)
            .env("RUSTFLAGS", STATIC_CRT_RUSTFLAGS),
        &format!("cargo build --release --target {triple}"),
    )
}

/// Resolve the path to the binary a release build produced for `triple`.
///
/// A missing binary after a reported-successful build is a hard error so
/// packaging never zips a stale or absent artifact.
pub fn built_binary_path(project_dir: &Path, triple: &str, host: HostOs) -> Result<PathBuf> {
    let path = project_dir
        .join("target")
        .join(triple)
        .join("release")
        .join(binary_file_name(host));

    if !path.is_file() {
        bail!(
            "built binary not found at {}: the release build for {triple} \
             did not produce the expected artifact",
            path.display()
        );
    }
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
