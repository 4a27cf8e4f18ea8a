//! Offline bundle builder library.
//!
//! This crate fetches the tools a host application (opencode by default)
//! would otherwise download on demand, and packages them together with the
//! host binary into a self-contained bundle that runs without network
//! access. It backs the `offline-bundler` CLI binary and can be driven
//! programmatically with injected collaborators for testing.
//!
//! # Modules
//!
//! - [`acquire`] - Dependency acquisition into a dependency root
//! - [`artefact`] - Domain types, fetching, extraction, and the manifest
//! - [`bundle`] - Bundle assembly, launcher, README, and archive creation
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - TOML configuration with built-in defaults
//! - [`error`] - Top-level error type
//! - [`exec`] - External command execution
//! - [`output`] - Progress and error reporting
//! - [`pipeline`] - `fetch` and `package` orchestration
//! - [`timestamp`] - UTC timestamp formatting

pub mod acquire;
pub mod artefact;
pub mod bundle;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod output;
pub mod pipeline;
pub mod timestamp;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
