//! Dependency artefacts: fetching, extraction, release resolution, and the
//! provenance manifest.
//!
//! # Sub-modules
//!
//! - [`commit_sha`] - Git commit SHA newtype (`CommitSha`).
//! - [`download`] - Download trait and HTTP implementation.
//! - [`error`] - Semantic error types for validation failures.
//! - [`extraction`] - Archive extraction with path traversal protection.
//! - [`layout`] - Fixed paths inside the dependency root and the bundle.
//! - [`manifest`] - Manifest schema, generation, and persistence.
//! - [`platform`] - Target platform and its upstream naming schemes.
//! - [`release`] - Latest-release resolution and asset selection.
//! - [`schema_version`] - Manifest version newtype (`SchemaVersion`).

pub mod commit_sha;
pub mod download;
pub mod error;
pub mod extraction;
pub mod layout;
pub mod manifest;
pub mod platform;
pub mod release;
pub mod schema_version;
