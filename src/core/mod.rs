//! Core building blocks for patchline
//!
//! - **config**: patchline.toml parsing and validation
//! - **error**: unified error types with exit codes and help messages
//! - **vcs**: git operations abstraction (SystemGit)

pub mod config;
pub mod error;
pub mod vcs;
