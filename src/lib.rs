//! Installs sccache and configures Rust builds to use it.
//!
//! The `now` pipeline makes the `sccache` executable resolvable (package
//! managers first, then the GitHub release archive), persists
//! `RUSTC_WRAPPER`, `SCCACHE_DIR` and `SCCACHE_CACHE_SIZE` for the user,
//! merges `[build] rustc-wrapper = "sccache"` into the project's
//! `.cargo/config.toml`, and reports the cache statistics.

pub mod logger;

pub mod cli;
pub mod commands;
pub mod installers;
pub mod libs;
pub mod schemas;
