pub mod app;
pub mod memory;
pub mod run;

use std::path::PathBuf;

pub use app::run as run_cli;
pub use memory::{cmd_memory, MemoryArgs};
pub use run::{cmd_run, RunArgs};

/// Memory store location when `--memory-file` is not given.
pub(crate) fn default_memory_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("webpilot").join("memory.json"))
        .unwrap_or_else(|| PathBuf::from(".data/memory.json"))
}
