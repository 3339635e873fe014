//! Configuration for agent loop execution.

use serde::{Deserialize, Serialize};

use action_parser::ActionGrammar;

/// Configuration for one observe-think-act run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum loop iterations before the run is declared exhausted.
    /// Default: 25
    pub max_iterations: u32,

    /// How many recent episodes for the start site to inject into the
    /// system prompt.
    /// Default: 5
    pub episode_recall: usize,

    /// Which decision grammar the deployed model speaks.
    pub grammar: ActionGrammar,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            episode_recall: 5,
            grammar: ActionGrammar::default(),
        }
    }
}

impl AgentConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a minimal config for testing.
    pub fn minimal() -> Self {
        Self {
            max_iterations: 3,
            episode_recall: 2,
            grammar: ActionGrammar::Call,
        }
    }

    /// Builder: set the iteration bound.
    pub fn max_iterations(mut self, iterations: u32) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Builder: set the episode recall depth.
    pub fn episode_recall(mut self, recall: usize) -> Self {
        self.episode_recall = recall;
        self
    }

    /// Builder: set the decision grammar.
    pub fn grammar(mut self, grammar: ActionGrammar) -> Self {
        self.grammar = grammar;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.max_iterations, 25);
        assert_eq!(config.episode_recall, 5);
        assert_eq!(config.grammar, ActionGrammar::Call);
    }

    #[test]
    fn builder() {
        let config = AgentConfig::new()
            .max_iterations(10)
            .grammar(ActionGrammar::Tag);
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.grammar, ActionGrammar::Tag);
    }
}
