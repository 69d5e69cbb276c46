//! CLI commands for patchline
//!
//! - **tags**: resolve and show the two most recent release tags per repository
//! - **plan**: resolve tags and enumerate the commit window, without writing anything
//! - **assemble**: run the full pipeline and assemble the patch package

pub mod assemble;
pub mod plan;
pub mod tags;

pub use assemble::run_assemble;
pub use plan::run_plan;
pub use tags::run_tags;
