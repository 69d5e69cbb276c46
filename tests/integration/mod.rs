//! Integration tests driving the pipeline against real git repositories

mod test_assemble;
mod test_patches;
mod test_tags;
