//! Core of the webpilot browser agent.
//!
//! The crate wires four seams together: a [`ModelClient`] for the vision
//! model, a [`BrowserDriver`] for page interaction, the decision parser from
//! `action-parser`, and the episode store from `memory-center`. The
//! [`AgentLoop`] orchestrates them into the observe-think-act cycle.

pub mod agent_loop;
pub mod driver;
pub mod errors;
pub mod executor;
pub mod llm;
pub mod planner;
pub mod prompts;
pub mod summarizer;

pub use agent_loop::{AgentConfig, AgentLoop};
pub use driver::BrowserDriver;
pub use errors::AgentError;
pub use llm::{ChatMessage, ContentPart, MockModelClient, ModelClient, Role};
pub use summarizer::ModelSummarizer;
