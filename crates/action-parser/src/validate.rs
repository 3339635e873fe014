//! Post-extraction validation of the kind-specific required-argument sets.
//!
//! Both grammars funnel through here, so the `point=` / legacy `start_box=`
//! spellings of a single coordinate resolve to one canonical `point`
//! argument regardless of which grammar produced the action.

use webpilot_core_types::{Action, ActionKind};

use crate::call::{format_point, parse_point};
use crate::errors::ParseError;

const SCROLL_DIRECTIONS: [&str; 4] = ["up", "down", "left", "right"];

pub(crate) fn validate(action: &mut Action) -> Result<(), ParseError> {
    match action.kind {
        ActionKind::Click | ActionKind::LeftDouble | ActionKind::RightSingle => {
            canonicalize_point(action, "point")?;
        }
        ActionKind::Drag => {
            canonicalize_coordinate(action, "start_box")?;
            canonicalize_coordinate(action, "end_box")?;
        }
        ActionKind::Hotkey => {
            require(action, "key")?;
        }
        ActionKind::TypeText => {
            require(action, "content")?;
        }
        ActionKind::Scroll => {
            canonicalize_point(action, "point")?;
            let direction = require(action, "direction")?.to_ascii_lowercase();
            if !SCROLL_DIRECTIONS.contains(&direction.as_str()) {
                return Err(ParseError::InvalidArgument {
                    name: "direction",
                    value: direction,
                });
            }
            action.args.insert("direction".to_string(), direction);
        }
        ActionKind::Navigate => {
            require(action, "url")?;
        }
        // A bare wait()/finished() is a valid action with an empty map.
        ActionKind::Wait | ActionKind::Finished => {}
    }
    Ok(())
}

fn require(action: &Action, name: &'static str) -> Result<String, ParseError> {
    action
        .arg(name)
        .map(str::to_string)
        .ok_or(ParseError::MissingArgument {
            kind: action.kind.as_str(),
            name,
        })
}

/// Resolve `name` or the legacy `start_box` spelling into canonical `name`.
fn canonicalize_point(action: &mut Action, name: &'static str) -> Result<(), ParseError> {
    let raw = action
        .arg(name)
        .or_else(|| action.arg("start_box"))
        .map(str::to_string)
        .ok_or(ParseError::MissingArgument {
            kind: action.kind.as_str(),
            name,
        })?;
    let point = parse_point(&raw)?;
    action.args.remove("start_box");
    action.args.insert(name.to_string(), format_point(point));
    Ok(())
}

/// Re-serialize a coordinate argument under its own name.
fn canonicalize_coordinate(action: &mut Action, name: &'static str) -> Result<(), ParseError> {
    let raw = require(action, name)?;
    let point = parse_point(&raw)?;
    action.args.insert(name.to_string(), format_point(point));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_start_box_and_point_resolve_identically() {
        let mut via_point = Action::new(ActionKind::Scroll)
            .with_arg("point", "(400,300)")
            .with_arg("direction", "down");
        let mut via_start_box = Action::new(ActionKind::Scroll)
            .with_arg("start_box", "(400,300)")
            .with_arg("direction", "down");

        validate(&mut via_point).unwrap();
        validate(&mut via_start_box).unwrap();

        assert_eq!(via_point.arg("point"), Some("(400,300)"));
        assert_eq!(via_start_box.arg("point"), Some("(400,300)"));
    }

    #[test]
    fn click_without_coordinates_is_missing_argument() {
        let mut action = Action::new(ActionKind::Click);
        assert_eq!(
            validate(&mut action),
            Err(ParseError::MissingArgument {
                kind: "click",
                name: "point"
            })
        );
    }

    #[test]
    fn scroll_rejects_unknown_direction() {
        let mut action = Action::new(ActionKind::Scroll)
            .with_arg("point", "(1,2)")
            .with_arg("direction", "sideways");
        assert!(matches!(
            validate(&mut action),
            Err(ParseError::InvalidArgument {
                name: "direction",
                ..
            })
        ));
    }

    #[test]
    fn drag_requires_both_boxes() {
        let mut action = Action::new(ActionKind::Drag).with_arg("start_box", "(1,2)");
        assert_eq!(
            validate(&mut action),
            Err(ParseError::MissingArgument {
                kind: "drag",
                name: "end_box"
            })
        );
    }

    #[test]
    fn wait_and_finished_need_no_arguments() {
        validate(&mut Action::new(ActionKind::Wait)).unwrap();
        validate(&mut Action::new(ActionKind::Finished)).unwrap();
    }
}
