use thiserror::Error;

/// Errors emitted while turning a raw model decision into an [`Action`].
///
/// [`Action`]: webpilot_core_types::Action
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// The input matched no recognized grammar prefix.
    #[error("unrecognized decision text: {0}")]
    UnrecognizedInput(String),

    /// A required sub-field delimiter was missing.
    #[error("missing delimiter {delimiter:?} while scanning {context}")]
    MissingDelimiter {
        delimiter: &'static str,
        context: &'static str,
    },

    /// The action name is outside the closed kind set.
    #[error("invalid action type: {0:?}")]
    InvalidAction(String),

    /// The same argument name appeared more than once in one decision.
    #[error("duplicate argument {0:?}")]
    DuplicateArgument(String),

    /// A kind-specific required argument was absent.
    #[error("action {kind:?} is missing required argument {name:?}")]
    MissingArgument { kind: &'static str, name: &'static str },

    /// A coordinate payload did not decode to an integer pair.
    #[error("invalid coordinate payload: {0:?}")]
    InvalidCoordinate(String),

    /// An argument carried a value outside its allowed token set.
    #[error("invalid value {value:?} for argument {name:?}")]
    InvalidArgument { name: &'static str, value: String },

    /// A quoted value never closed (after honoring escapes).
    #[error("unterminated quoted value for parameter {parameter:?}")]
    UnterminatedString { parameter: String },
}

impl ParseError {
    pub(crate) fn unrecognized(raw: &str) -> Self {
        // Keep error payloads short; decisions can be whole paragraphs.
        let mut snippet: String = raw.chars().take(80).collect();
        if raw.chars().count() > 80 {
            snippet.push_str("...");
        }
        Self::UnrecognizedInput(snippet)
    }

    pub(crate) fn missing(delimiter: &'static str, context: &'static str) -> Self {
        Self::MissingDelimiter { delimiter, context }
    }
}
