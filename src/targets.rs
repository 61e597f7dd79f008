//! Host platform detection and the static build-target table.
//!
//! The table maps each supported host OS to the set of target triples we
//! cross-compile for, each paired with the short alias used in archive names
//! and registry metadata (e.g. "linux-x64").

use anyhow::{Result, bail};

/// Name of the application being packaged. Fixed: this tool exists to
/// release exactly one binary.
pub const APP_NAME: &str = "motd";

/// The host operating system the packager is running on.
///
/// Only these three hosts have entries in the target table; anything else
/// (freebsd, android, ...) is rejected up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Linux,
    Macos,
}

impl HostOs {
    /// Detect the host OS from the compile-time platform constant.
    pub fn detect() -> Result<Self> {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Map an `std::env::consts::OS`-style name to a `HostOs`.
    pub fn from_os_name(name: &str) -> Result<Self> {
        match name {
            "windows" => Ok(HostOs::Windows),
            "linux" => Ok(HostOs::Linux),
            "macos" => Ok(HostOs::Macos),
            other => bail!(
                "unsupported host OS '{other}': release targets are only \
                 configured for windows, linux, and macos"
            ),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HostOs::Windows => "windows",
            HostOs::Linux => "linux",
            HostOs::Macos => "macos",
        }
    }
}

/// One row of the target table: a rustc target triple and its release alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub triple: &'static str,
    pub alias: &'static str,
}

const WINDOWS_TARGETS: &[Target] = &[
    Target {
        triple: "x86_64-pc-windows-msvc",
        alias: "windows-x64",
    },
    Target {
        triple: "i686-pc-windows-msvc",
        alias: "windows-x86",
    },
    Target {
        triple: "aarch64-pc-windows-msvc",
        alias: "windows-arm64",
    },
];

const LINUX_TARGETS: &[Target] = &[
    Target {
        triple: "x86_64-unknown-linux-gnu",
        alias: "linux-x64",
    },
    Target {
        triple: "aarch64-unknown-linux-gnu",
        alias: "linux-arm64",
    },
    Target {
        triple: "i686-unknown-linux-gnu",
        alias: "linux-x86",
    },
];

const MACOS_TARGETS: &[Target] = &[
    Target {
        triple: "x86_64-apple-darwin",
        alias: "macos-intel",
    },
    Target {
        triple: "aarch64-apple-darwin",
        alias: "macos-apple-silicon",
    },
];

/// The build targets configured for a given host OS.
pub fn targets_for(host: HostOs) -> &'static [Target] {
    match host {
        HostOs::Windows => WINDOWS_TARGETS,
        HostOs::Linux => LINUX_TARGETS,
        HostOs::Macos => MACOS_TARGETS,
    }
}

/// Release archive filename for an alias: `motd-<alias>.zip`.
pub fn archive_file_name(alias: &str) -> String {
    format!("{APP_NAME}-{alias}.zip")
}

/// Name of the compiled binary, and of the single entry inside each archive.
///
/// The `.exe` suffix is gated on the HOST OS, not the target triple: a
/// Windows host produces `motd.exe` for every target it builds. This matches
/// how cargo names the artifact on the building machine.
pub fn binary_file_name(host: HostOs) -> &'static str {
    match host {
        HostOs::Windows => "motd.exe",
        HostOs::Linux | HostOs::Macos => "motd",
    }
}

/// Split an alias into its `(os, arch)` components on the FIRST hyphen only.
///
/// Compound architecture names keep their internal hyphens:
/// `"macos-apple-silicon"` yields `("macos", "apple-silicon")`.
pub fn split_alias(alias: &str) -> Result<(&str, &str)> {
    match alias.split_once('-') {
        Some((os, arch)) if !os.is_empty() && !arch.is_empty() => Ok((os, arch)),
        _ => bail!("malformed target alias '{alias}': expected '<os>-<arch>'"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
