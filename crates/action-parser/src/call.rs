//! Call-grammar parser.
//!
//! Grammar: a function-call-like string, `name(arg='value', ...)`, usually
//! preceded by `Thought: ...` and an `Action:` marker. Coordinate-bearing
//! values are `'(x,y)'` (or the `<point>x y</point>` spelling some models
//! emit); `type` and `finished` carry free text that may itself contain the
//! quote character, so quoted values are read with a real escape-aware
//! scanner honoring `\'`, `\"`, `\n`, `\t` and `\\` instead of stopping at
//! the first quote.

use std::collections::BTreeMap;

use webpilot_core_types::{Action, ActionKind};

use crate::errors::ParseError;

const ACTION_MARKER: &str = "Action:";

pub fn parse(raw: &str) -> Result<Action, ParseError> {
    // Only the text after the last `Action:` marker is the decision; the
    // thought section may quote earlier actions verbatim.
    let body = match raw.rfind(ACTION_MARKER) {
        Some(idx) => &raw[idx + ACTION_MARKER.len()..],
        None => raw,
    };
    let body = body.trim();

    let open = body.find('(').ok_or_else(|| ParseError::unrecognized(raw))?;
    let name = body[..open].trim().to_ascii_lowercase();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ParseError::unrecognized(raw));
    }
    let kind = ActionKind::from_name(&name).ok_or(ParseError::InvalidAction(name))?;

    let args = parse_arguments(&body[open + 1..])?;
    Ok(Action { kind, args })
}

/// Parse `k='v', k2='v2', ...)` starting just past the opening parenthesis.
fn parse_arguments(input: &str) -> Result<BTreeMap<String, String>, ParseError> {
    let mut args = BTreeMap::new();
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0usize;

    loop {
        while pos < chars.len() && (chars[pos].is_whitespace() || chars[pos] == ',') {
            pos += 1;
        }
        if pos >= chars.len() {
            return Err(ParseError::missing(")", "argument list"));
        }
        if chars[pos] == ')' {
            return Ok(args);
        }

        let key_start = pos;
        while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
            pos += 1;
        }
        let key: String = chars[key_start..pos].iter().collect();
        if key.is_empty() {
            return Err(ParseError::missing("=", "argument name"));
        }

        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }
        if pos >= chars.len() || chars[pos] != '=' {
            return Err(ParseError::missing("=", "argument assignment"));
        }
        pos += 1;
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }
        if pos >= chars.len() || chars[pos] != '\'' {
            return Err(ParseError::missing("'", "argument value"));
        }
        pos += 1;

        let (value, consumed) = scan_quoted(&chars[pos..], &key)?;
        pos += consumed;
        if args.insert(key.clone(), value).is_some() {
            return Err(ParseError::DuplicateArgument(key));
        }
    }
}

/// Read characters up to the closing single quote, decoding escapes.
///
/// Returns the decoded value and the number of input characters consumed,
/// including the closing quote.
fn scan_quoted(chars: &[char], parameter: &str) -> Result<(String, usize), ParseError> {
    let mut value = String::new();
    let mut pos = 0usize;

    while pos < chars.len() {
        match chars[pos] {
            '\'' => return Ok((value, pos + 1)),
            '\\' if pos + 1 < chars.len() => {
                match chars[pos + 1] {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    '\'' => value.push('\''),
                    '"' => value.push('"'),
                    '\\' => value.push('\\'),
                    // Unknown escapes pass through verbatim.
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
                pos += 2;
            }
            other => {
                value.push(other);
                pos += 1;
            }
        }
    }

    Err(ParseError::UnterminatedString {
        parameter: parameter.to_string(),
    })
}

/// Decode a coordinate payload to an integer pair.
///
/// Accepts `(x,y)`, bare `x,y`, and the `<point>x y</point>` spelling.
pub fn parse_point(value: &str) -> Result<(i32, i32), ParseError> {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix("<point>")
        .and_then(|s| s.strip_suffix("</point>"))
        .unwrap_or(trimmed);
    let inner = inner
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim();

    let mut parts = if inner.contains(',') {
        inner.splitn(2, ',')
    } else {
        inner.splitn(2, ' ')
    };

    let x = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i32>().ok());
    let y = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i32>().ok());

    match (x, y) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(ParseError::InvalidCoordinate(value.to_string())),
    }
}

/// Canonical serialization of a coordinate pair; `parse_point` inverts it.
pub fn format_point(point: (i32, i32)) -> String {
    format!("({},{})", point.0, point.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_click_with_start_box() {
        let action = parse("click(start_box='(100,200)')").unwrap();
        assert_eq!(action.kind, ActionKind::Click);
        assert_eq!(action.arg("start_box"), Some("(100,200)"));
    }

    #[test]
    fn parses_thought_action_framing() {
        let raw = "Thought: the search box is at the top.\nAction: type(content='rust books\\n')";
        let action = parse(raw).unwrap();
        assert_eq!(action.kind, ActionKind::TypeText);
        assert_eq!(action.arg("content"), Some("rust books\n"));
    }

    #[test]
    fn uses_last_action_marker() {
        let raw = "Thought: earlier I ran Action: click(point='(1,1)') which failed.\n\
                   Action: scroll(point='(400,300)', direction='down')";
        let action = parse(raw).unwrap();
        assert_eq!(action.kind, ActionKind::Scroll);
        assert_eq!(action.arg("direction"), Some("down"));
    }

    #[test]
    fn escaped_quote_does_not_truncate_content() {
        let action = parse("finished(content='it\\'s a $899 fridge, size: (large)')").unwrap();
        assert_eq!(action.kind, ActionKind::Finished);
        assert_eq!(action.terminal_content(), "it's a $899 fridge, size: (large)");
    }

    #[test]
    fn escape_sequences_decode() {
        let action = parse("type(content='line one\\nline \"two\"\\t\\\\end')").unwrap();
        assert_eq!(action.arg("content"), Some("line one\nline \"two\"\t\\end"));
    }

    #[test]
    fn unterminated_value_errors() {
        let err = parse("type(content='never closed)").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnterminatedString {
                parameter: "content".to_string()
            }
        );
    }

    #[test]
    fn no_argument_call_parses_to_empty_map() {
        let action = parse("wait()").unwrap();
        assert_eq!(action.kind, ActionKind::Wait);
        assert!(action.args.is_empty());

        let action = parse("finished()").unwrap();
        assert_eq!(action.kind, ActionKind::Finished);
        assert!(action.args.is_empty());
    }

    #[test]
    fn drag_carries_two_coordinate_pairs() {
        let action = parse("drag(start_box='(10,20)', end_box='(30,40)')").unwrap();
        assert_eq!(parse_point(action.arg("start_box").unwrap()).unwrap(), (10, 20));
        assert_eq!(parse_point(action.arg("end_box").unwrap()).unwrap(), (30, 40));
    }

    #[test]
    fn hotkey_carries_space_separated_sequence() {
        let action = parse("hotkey(key='ctrl shift t')").unwrap();
        assert_eq!(action.arg("key"), Some("ctrl shift t"));
    }

    #[test]
    fn repeated_argument_name_is_rejected() {
        assert_eq!(
            parse("drag(start_box='(1,2)', start_box='(3,4)')").unwrap_err(),
            ParseError::DuplicateArgument("start_box".to_string())
        );
    }

    #[test]
    fn unknown_function_name_is_invalid_action() {
        assert_eq!(
            parse("fly(point='(1,2)')").unwrap_err(),
            ParseError::InvalidAction("fly".to_string())
        );
    }

    #[test]
    fn prose_without_call_shape_is_unrecognized() {
        let err = parse("I think we should click the button").unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedInput(_)));
    }

    #[test]
    fn point_round_trips_through_serialization() {
        for point in [(0, 0), (100, 200), (-5, 42), (1920, 1080)] {
            assert_eq!(parse_point(&format_point(point)).unwrap(), point);
        }
    }

    #[test]
    fn point_accepts_tag_spelling_and_bare_pair() {
        assert_eq!(parse_point("<point>120 340</point>").unwrap(), (120, 340));
        assert_eq!(parse_point("120,340").unwrap(), (120, 340));
        assert_eq!(parse_point("( 120 , 340 )").unwrap(), (120, 340));
    }

    #[test]
    fn malformed_point_is_invalid_coordinate() {
        assert!(matches!(
            parse_point("(banana,7)"),
            Err(ParseError::InvalidCoordinate(_))
        ));
        assert!(matches!(
            parse_point("(12)"),
            Err(ParseError::InvalidCoordinate(_))
        ));
    }
}
