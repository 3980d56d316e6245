//! CLI subcommand implementations.

pub mod presets;
pub mod process;
pub mod response;
