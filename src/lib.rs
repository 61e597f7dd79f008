//! Library entrypoint for motd-dist.
//!
//! The primary interface is the `motd-dist` binary. This lib target exists
//! to expose internal modules to integration tests.

pub mod archive;
pub mod config;
pub mod output;
pub mod registry;
pub mod targets;
pub mod toolchain;
