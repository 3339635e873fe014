//! Browser driver seam.
//!
//! The loop treats the browser as an external collaborator behind this
//! trait: every primitive the executor dispatches lives here, plus the
//! observation the loop takes at the top of each iteration. Implementations
//! are expected to settle the page themselves (fixed post-action waits)
//! before returning.

use async_trait::async_trait;

use webpilot_core_types::Observation;

use crate::errors::AgentError;

#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Load a URL in the active page and wait for it to settle.
    async fn navigate(&self, url: &str) -> Result<(), AgentError>;

    /// Single left click at viewport coordinates.
    async fn click(&self, x: i32, y: i32) -> Result<(), AgentError>;

    /// Double left click at viewport coordinates.
    async fn double_click(&self, x: i32, y: i32) -> Result<(), AgentError>;

    /// Single right click at viewport coordinates.
    async fn right_click(&self, x: i32, y: i32) -> Result<(), AgentError>;

    /// Press-move-release from one point to another.
    async fn drag(&self, from: (i32, i32), to: (i32, i32)) -> Result<(), AgentError>;

    /// Press a space-separated key sequence as one chord (`"ctrl c"`).
    async fn press_hotkey(&self, keys: &str) -> Result<(), AgentError>;

    /// Type free text into the focused element, character by character.
    async fn type_text(&self, content: &str) -> Result<(), AgentError>;

    /// Wheel-scroll at a point; `direction` is one of `up`, `down`, `left`,
    /// `right` (validated upstream by the decision parser).
    async fn scroll(&self, x: i32, y: i32, direction: &str) -> Result<(), AgentError>;

    /// Sleep long enough for slow pages to make visible progress.
    async fn wait_fixed(&self) -> Result<(), AgentError>;

    /// Snapshot the current page: URL plus a PNG screenshot data URI.
    async fn observe(&self) -> Result<Observation, AgentError>;
}
