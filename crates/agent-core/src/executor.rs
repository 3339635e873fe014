//! Dispatch of a parsed action onto the browser driver.
//!
//! Execution failures are absorbed: the driver error is logged and the
//! iteration's action simply does not enter the trajectory, leaving the
//! model to observe the unchanged page and try something else. Only actions
//! that executed cleanly are worth remembering.

use tracing::warn;

use action_parser::call::parse_point;
use webpilot_core_types::{Action, ActionKind};

use crate::driver::BrowserDriver;

/// Execute one non-terminal action. Returns whether it executed cleanly.
pub async fn execute(driver: &dyn BrowserDriver, action: &Action) -> bool {
    let result = match action.kind {
        ActionKind::Click => match point_arg(action, "point") {
            Some((x, y)) => driver.click(x, y).await,
            None => return false,
        },
        ActionKind::LeftDouble => match point_arg(action, "point") {
            Some((x, y)) => driver.double_click(x, y).await,
            None => return false,
        },
        ActionKind::RightSingle => match point_arg(action, "point") {
            Some((x, y)) => driver.right_click(x, y).await,
            None => return false,
        },
        ActionKind::Drag => {
            match (point_arg(action, "start_box"), point_arg(action, "end_box")) {
                (Some(from), Some(to)) => driver.drag(from, to).await,
                _ => return false,
            }
        }
        ActionKind::Hotkey => match action.arg("key") {
            Some(keys) => driver.press_hotkey(keys).await,
            None => return false,
        },
        ActionKind::TypeText => match action.arg("content") {
            Some(content) => driver.type_text(content).await,
            None => return false,
        },
        ActionKind::Scroll => {
            match (point_arg(action, "point"), action.arg("direction")) {
                (Some((x, y)), Some(direction)) => driver.scroll(x, y, direction).await,
                _ => return false,
            }
        }
        ActionKind::Wait => driver.wait_fixed().await,
        ActionKind::Navigate => match action.arg("url") {
            Some(url) => driver.navigate(url).await,
            None => return false,
        },
        // Terminal actions are intercepted by the loop before dispatch.
        ActionKind::Finished => {
            warn!("terminal action reached the executor; ignoring");
            return false;
        }
    };

    match result {
        Ok(()) => true,
        Err(err) => {
            warn!(kind = %action.kind, error = %err, "action failed to execute");
            false
        }
    }
}

/// Decode a canonical `(x,y)` argument; validation upstream makes a miss
/// here a logic error worth logging, not a panic.
fn point_arg(action: &Action, name: &str) -> Option<(i32, i32)> {
    let raw = match action.arg(name) {
        Some(raw) => raw,
        None => {
            warn!(kind = %action.kind, argument = name, "required coordinate missing");
            return None;
        }
    };
    match parse_point(raw) {
        Ok(point) => Some(point),
        Err(err) => {
            warn!(kind = %action.kind, argument = name, error = %err, "bad coordinate");
            None
        }
    }
}
