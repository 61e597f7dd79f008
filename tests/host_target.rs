//! Tests for the compile-time TARGET env var set by build.rs.
//!
//! The binary uses its own target triple to mark the native entry when
//! listing the build-target table, so the value has to be a well-formed
//! triple.

use motd_dist::targets::{HostOs, targets_for};

/// The compile-time TARGET value emitted by build.rs.
const TARGET: &str = env!("TARGET");

#[test]
fn target_is_non_empty() {
    #[allow(clippy::const_is_empty)]
    let non_empty = !TARGET.is_empty();
    assert!(non_empty, "TARGET compile-time env var must not be empty");
}

#[test]
fn target_has_minimum_segment_count() {
    // Valid target triples have at least 3 segments (arch-vendor-os or
    // arch-os-env), e.g. "aarch64-apple-darwin" (3) or
    // "x86_64-unknown-linux-gnu" (4).
    let segments: Vec<&str> = TARGET.split('-').collect();
    assert!(
        segments.len() >= 3,
        "TARGET '{TARGET}' should have at least 3 hyphen-separated segments, got {}",
        segments.len()
    );
}

#[test]
fn target_segments_are_non_empty() {
    for (i, segment) in TARGET.split('-').enumerate() {
        assert!(
            !segment.is_empty(),
            "TARGET '{TARGET}' segment {i} is empty, malformed triple"
        );
    }
}

#[test]
fn host_table_aliases_match_host_name() {
    // Whatever host this test binary runs on, every alias in its table must
    // lead with the host OS name, since the alias os component is what the
    // registry metadata carries.
    let host = match HostOs::detect() {
        Ok(h) => h,
        Err(_) => return,
    };

    for target in targets_for(host) {
        assert!(
            target.alias.starts_with(host.as_str()),
            "alias '{}' does not lead with host '{}'",
            target.alias,
            host.as_str()
        );
    }
}

#[test]
fn target_os_segment_matches_detected_host() {
    // The triple we were compiled for should agree with the host table we
    // select at runtime.
    let host = match HostOs::detect() {
        Ok(h) => h,
        Err(_) => return,
    };

    let os_marker = match host {
        HostOs::Windows => "windows",
        HostOs::Linux => "linux",
        HostOs::Macos => "darwin",
    };
    assert!(
        TARGET.contains(os_marker),
        "TARGET '{TARGET}' does not contain expected OS marker '{os_marker}'"
    );
}
