//! Decision parsers for the webpilot agent loop.
//!
//! A model's raw text reply is turned into a validated
//! [`Action`](webpilot_core_types::Action) by one of two mutually exclusive
//! grammars. The active grammar is selected by configuration (it depends on
//! which model is deployed), never by sniffing the reply content, so a
//! payload that happens to resemble the other grammar cannot be
//! misinterpreted.

pub mod call;
pub mod errors;
pub mod tag;
mod validate;

use serde::{Deserialize, Serialize};
use webpilot_core_types::Action;

pub use errors::ParseError;

/// Which decision grammar the deployed model speaks.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionGrammar {
    /// `<reasoning>..</reasoning><action_type>..</action_type>` blocks.
    Tag,
    /// UI-TARS style `name(arg='value', ...)` calls.
    #[default]
    Call,
}

/// Grammar-selected parser producing validated actions.
#[derive(Clone, Copy, Debug)]
pub struct ActionParser {
    grammar: ActionGrammar,
}

impl ActionParser {
    pub fn new(grammar: ActionGrammar) -> Self {
        Self { grammar }
    }

    pub fn grammar(&self) -> ActionGrammar {
        self.grammar
    }

    /// Parse a raw model reply into a structured action.
    ///
    /// Fails when the text matches no recognized grammar prefix, when a
    /// sub-field delimiter is missing, or when the kind-specific required
    /// arguments do not validate.
    pub fn parse(&self, raw: &str) -> Result<Action, ParseError> {
        let mut action = match self.grammar {
            ActionGrammar::Tag => tag::parse(raw)?,
            ActionGrammar::Call => call::parse(raw)?,
        };
        validate::validate(&mut action)?;
        Ok(action)
    }
}
