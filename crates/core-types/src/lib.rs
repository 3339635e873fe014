//! Shared primitives for the webpilot agent loop.
//!
//! Everything that crosses a crate boundary lives here: the structured
//! [`Action`] produced by the decision parser, the [`Observation`] taken from
//! the browser each iteration, the per-run [`TrajectoryStep`] record, and the
//! [`MemoryEntry`] shape persisted between runs.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a single agent run.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of action kinds the decision parser may emit.
///
/// The wire names match the grammar spellings (`type`, `left_double`, ...);
/// `finished` is the sole terminal kind and is intercepted by the agent loop
/// before it ever reaches the executor.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    LeftDouble,
    RightSingle,
    Drag,
    Hotkey,
    #[serde(rename = "type")]
    TypeText,
    Scroll,
    Wait,
    Navigate,
    Finished,
}

impl ActionKind {
    /// Wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::LeftDouble => "left_double",
            ActionKind::RightSingle => "right_single",
            ActionKind::Drag => "drag",
            ActionKind::Hotkey => "hotkey",
            ActionKind::TypeText => "type",
            ActionKind::Scroll => "scroll",
            ActionKind::Wait => "wait",
            ActionKind::Navigate => "navigate",
            ActionKind::Finished => "finished",
        }
    }

    /// Look up a kind by its wire name. Returns `None` for names outside the
    /// closed set; both grammars funnel unknown names through this path.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "click" => Some(ActionKind::Click),
            "left_double" | "double_click" => Some(ActionKind::LeftDouble),
            "right_single" | "right_click" => Some(ActionKind::RightSingle),
            "drag" => Some(ActionKind::Drag),
            "hotkey" => Some(ActionKind::Hotkey),
            "type" | "input" => Some(ActionKind::TypeText),
            "scroll" => Some(ActionKind::Scroll),
            "wait" => Some(ActionKind::Wait),
            "navigate" | "goto" => Some(ActionKind::Navigate),
            "finished" | "terminal" => Some(ActionKind::Finished),
            _ => None,
        }
    }

    /// Terminal kinds end the run instead of being dispatched to the browser.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionKind::Finished)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured instruction derived from one model decision.
///
/// Created per decision, consumed immediately by the executor, and retained
/// only as a [`TrajectoryStep`] afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    /// Argument map; keys depend on the kind and are validated at parse time.
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            args: BTreeMap::new(),
        }
    }

    /// Builder-style argument insertion, mostly for tests and mocks.
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }

    /// Free-text payload of a terminal action (empty when absent).
    pub fn terminal_content(&self) -> &str {
        self.arg("content").unwrap_or("")
    }
}

/// Browser-state snapshot shown to the model each iteration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Observation {
    /// URL of the active page.
    pub url: String,
    /// PNG screenshot encoded as a `data:image/png;base64,` URI.
    pub screenshot_data_uri: String,
}

/// Retained fields of one successfully executed action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStep {
    pub kind: ActionKind,
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

impl From<&Action> for TrajectoryStep {
    fn from(action: &Action) -> Self {
        Self {
            kind: action.kind,
            args: action.args.clone(),
        }
    }
}

/// Ordered record of successfully executed actions for one run.
pub type Trajectory = Vec<TrajectoryStep>;

/// Structured post-hoc analysis of one episode.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(default)]
    pub key_learnings: Vec<String>,
    #[serde(default)]
    pub improvement_areas: Vec<String>,
    #[serde(default)]
    pub success_factors: Vec<String>,
}

/// One completed run's outcome, appended to the episodic log and never
/// mutated afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub task: String,
    pub success: bool,
    pub trajectory: Trajectory,
    pub url: String,
    pub insights: Insight,
    /// Recency sort key for `recent_episodes`.
    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}

impl MemoryEntry {
    pub fn new(
        task: impl Into<String>,
        success: bool,
        trajectory: Trajectory,
        url: impl Into<String>,
        insights: Insight,
    ) -> Self {
        Self {
            task: task.into(),
            success,
            trajectory,
            url: url.into(),
            insights,
            recorded_at: Utc::now(),
        }
    }
}

/// Final status of an agent run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Terminal action judged successful against the task.
    Success,
    /// Terminal action judged unsuccessful.
    Failure,
    /// Iteration bound reached without a terminal action.
    Exhausted,
}

/// Result of one agent run, returned to the caller with the three terminal
/// outcomes kept distinguishable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    /// Terminal payload on success/failure, or an exhaustion notice.
    pub message: String,
    /// Site the episode was recorded against (empty if none was visited).
    pub url: String,
    /// Iterations consumed.
    pub steps_taken: u32,
    /// Successfully executed actions, in order.
    pub trajectory: Trajectory,
    /// Wall-clock duration of the run.
    pub total_time_ms: u64,
}

impl RunResult {
    pub fn success(
        message: impl Into<String>,
        url: impl Into<String>,
        steps: u32,
        trajectory: Trajectory,
        time_ms: u64,
    ) -> Self {
        Self {
            status: RunStatus::Success,
            message: message.into(),
            url: url.into(),
            steps_taken: steps,
            trajectory,
            total_time_ms: time_ms,
        }
    }

    pub fn failure(
        message: impl Into<String>,
        url: impl Into<String>,
        steps: u32,
        trajectory: Trajectory,
        time_ms: u64,
    ) -> Self {
        Self {
            status: RunStatus::Failure,
            message: message.into(),
            url: url.into(),
            steps_taken: steps,
            trajectory,
            total_time_ms: time_ms,
        }
    }

    pub fn exhausted(
        max_iterations: u32,
        url: impl Into<String>,
        trajectory: Trajectory,
        time_ms: u64,
    ) -> Self {
        Self {
            status: RunStatus::Exhausted,
            message: format!("Reached maximum iteration limit: {max_iterations}"),
            url: url.into(),
            steps_taken: max_iterations,
            trajectory,
            total_time_ms: time_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_wire_names_round_trip() {
        for kind in [
            ActionKind::Click,
            ActionKind::LeftDouble,
            ActionKind::RightSingle,
            ActionKind::Drag,
            ActionKind::Hotkey,
            ActionKind::TypeText,
            ActionKind::Scroll,
            ActionKind::Wait,
            ActionKind::Navigate,
            ActionKind::Finished,
        ] {
            assert_eq!(ActionKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(ActionKind::from_name("explode"), None);
    }

    #[test]
    fn terminal_kind_is_only_finished() {
        assert!(ActionKind::Finished.is_terminal());
        assert!(!ActionKind::Click.is_terminal());
        assert!(!ActionKind::Wait.is_terminal());
    }

    #[test]
    fn type_kind_serializes_with_wire_name() {
        let action = Action::new(ActionKind::TypeText).with_arg("content", "hello");
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"kind\":\"type\""));

        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn terminal_content_defaults_to_empty() {
        let action = Action::new(ActionKind::Finished);
        assert_eq!(action.terminal_content(), "");

        let action = action.with_arg("content", "done");
        assert_eq!(action.terminal_content(), "done");
    }

    #[test]
    fn run_result_constructors() {
        let ok = RunResult::success("found it", "https://a.example", 3, Vec::new(), 1200);
        assert!(ok.is_success());
        assert_eq!(ok.status, RunStatus::Success);

        let exhausted = RunResult::exhausted(25, "", Vec::new(), 10);
        assert_eq!(exhausted.status, RunStatus::Exhausted);
        assert!(exhausted.message.contains("25"));
    }
}
