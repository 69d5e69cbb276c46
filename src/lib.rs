//! patchline: assemble versioned release patch sets across independently
//! tagged git repositories
//!
//! The library exposes the pipeline stages so they can be driven and tested
//! individually; the `patchline` binary wires them into the CLI workflow.

pub mod commands;
pub mod core;
pub mod package;
pub mod pipeline;
pub mod report;
pub mod ui;
