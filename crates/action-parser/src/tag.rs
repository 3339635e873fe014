//! Tag-grammar parser.
//!
//! Grammar:
//! `<reasoning>...</reasoning><action_type>NAME</action_type>` followed by
//! zero or more `<action_argument name="K">V</action_argument>` blocks.
//!
//! Parsing is positional substring scanning: each opening delimiter is
//! located from the last scanned position, the payload is extracted up to the
//! matching closing delimiter, and the cursor advances past it. Scanning
//! stops when no further opening delimiter is found.

use webpilot_core_types::{Action, ActionKind};

use crate::errors::ParseError;

const REASONING_OPEN: &str = "<reasoning>";
const REASONING_CLOSE: &str = "</reasoning>";
const ACTION_TYPE_OPEN: &str = "<action_type>";
const ACTION_TYPE_CLOSE: &str = "</action_type>";
const ARG_OPEN: &str = "<action_argument name=\"";
const ARG_NAME_CLOSE: &str = "\">";
const ARG_CLOSE: &str = "</action_argument>";

pub fn parse(raw: &str) -> Result<Action, ParseError> {
    let mut pos = 0usize;

    // The reasoning block is advisory; skip it when present so a stray
    // `<action_type>` inside the reasoning text cannot shadow the real one.
    if let Some(rel) = raw[pos..].find(REASONING_OPEN) {
        let start = pos + rel + REASONING_OPEN.len();
        let end = raw[start..]
            .find(REASONING_CLOSE)
            .ok_or_else(|| ParseError::missing(REASONING_CLOSE, "reasoning block"))?;
        pos = start + end + REASONING_CLOSE.len();
    }

    let rel = raw[pos..]
        .find(ACTION_TYPE_OPEN)
        .ok_or_else(|| ParseError::unrecognized(raw))?;
    let name_start = pos + rel + ACTION_TYPE_OPEN.len();
    let name_end = raw[name_start..]
        .find(ACTION_TYPE_CLOSE)
        .ok_or_else(|| ParseError::missing(ACTION_TYPE_CLOSE, "action type"))?;
    let name = raw[name_start..name_start + name_end]
        .trim()
        .to_ascii_lowercase();
    pos = name_start + name_end + ACTION_TYPE_CLOSE.len();

    let kind = ActionKind::from_name(&name).ok_or(ParseError::InvalidAction(name))?;
    let mut action = Action::new(kind);

    while let Some(rel) = raw[pos..].find(ARG_OPEN) {
        let key_start = pos + rel + ARG_OPEN.len();
        let key_end = raw[key_start..]
            .find(ARG_NAME_CLOSE)
            .ok_or_else(|| ParseError::missing(ARG_NAME_CLOSE, "argument name"))?;
        let key = raw[key_start..key_start + key_end].to_string();

        let value_start = key_start + key_end + ARG_NAME_CLOSE.len();
        let value_end = raw[value_start..]
            .find(ARG_CLOSE)
            .ok_or_else(|| ParseError::missing(ARG_CLOSE, "argument value"))?;
        let value = raw[value_start..value_start + value_end].to_string();
        pos = value_start + value_end + ARG_CLOSE.len();

        if action.args.insert(key.clone(), value).is_some() {
            return Err(ParseError::DuplicateArgument(key));
        }
    }

    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_action_with_arguments_in_document_order() {
        let raw = "<reasoning>need to search</reasoning>\
                   <action_type>type</action_type>\
                   <action_argument name=\"content\">fridge under $1000</action_argument>\
                   <action_argument name=\"point\">(120,340)</action_argument>";
        let action = parse(raw).unwrap();
        assert_eq!(action.kind, ActionKind::TypeText);
        assert_eq!(action.args.len(), 2);
        assert_eq!(action.arg("content"), Some("fridge under $1000"));
        assert_eq!(action.arg("point"), Some("(120,340)"));
    }

    #[test]
    fn action_type_is_trimmed_and_lowercased() {
        let raw = "<action_type>  Click \n</action_type>\
                   <action_argument name=\"point\">(5,6)</action_argument>";
        let action = parse(raw).unwrap();
        assert_eq!(action.kind, ActionKind::Click);
    }

    #[test]
    fn zero_arguments_yield_empty_map() {
        let raw = "<reasoning>done</reasoning><action_type>wait</action_type>";
        let action = parse(raw).unwrap();
        assert_eq!(action.kind, ActionKind::Wait);
        assert!(action.args.is_empty());
    }

    #[test]
    fn unknown_action_type_is_invalid() {
        let raw = "<action_type>teleport</action_type>";
        assert_eq!(
            parse(raw),
            Err(ParseError::InvalidAction("teleport".to_string()))
        );
    }

    #[test]
    fn missing_action_type_is_unrecognized() {
        let err = parse("just some prose with no tags").unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedInput(_)));
    }

    #[test]
    fn unclosed_argument_is_a_delimiter_error() {
        let raw = "<action_type>type</action_type>\
                   <action_argument name=\"content\">never closed";
        let err = parse(raw).unwrap_err();
        assert!(matches!(err, ParseError::MissingDelimiter { .. }));
    }

    #[test]
    fn action_type_inside_reasoning_is_ignored() {
        let raw = "<reasoning>I could use <action_type>drag</action_type> here</reasoning>\
                   <action_type>wait</action_type>";
        let action = parse(raw).unwrap();
        assert_eq!(action.kind, ActionKind::Wait);
    }

    #[test]
    fn repeated_argument_name_is_rejected() {
        let raw = "<action_type>click</action_type>\
                   <action_argument name=\"point\">(1,2)</action_argument>\
                   <action_argument name=\"point\">(3,4)</action_argument>";
        assert_eq!(
            parse(raw),
            Err(ParseError::DuplicateArgument("point".to_string()))
        );
    }

    #[test]
    fn n_well_formed_blocks_extract_n_pairs() {
        let raw = "<action_type>drag</action_type>\
                   <action_argument name=\"start_box\">(1,2)</action_argument>\
                   <action_argument name=\"end_box\">(3,4)</action_argument>";
        let action = parse(raw).unwrap();
        assert_eq!(action.args.len(), 2);
        assert_eq!(action.arg("start_box"), Some("(1,2)"));
        assert_eq!(action.arg("end_box"), Some("(3,4)"));
    }
}
