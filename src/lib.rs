//! Webpilot: a vision-driven browser agent with cross-run memory.
//!
//! The binary wires the concrete edges (a Chrome instance driven over CDP
//! and an OpenAI-compatible model endpoint) into the loop, parser and
//! memory crates under `crates/`.

pub mod browser;
pub mod cli;
pub mod llm;
