//! Observe-think-act loop: configuration and the controller that drives it.

pub mod config;
pub mod controller;

pub use config::AgentConfig;
pub use controller::AgentLoop;
