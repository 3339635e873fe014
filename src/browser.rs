//! Chrome-backed implementation of the browser driver seam.
//!
//! Input is synthesized at the CDP level (mouse and key events at viewport
//! coordinates) rather than through selectors: the model points at pixels in
//! the screenshot it was shown. Pages are given fixed settle time after each
//! action instead of waiting on load states, which keeps behavior uniform
//! across sites that never go network-idle.

use std::time::Duration;

use agent_core::{AgentError, BrowserDriver};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as Base64, Engine as _};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};
use webpilot_core_types::Observation;

/// Settle time after an input action.
const ACTION_SETTLE: Duration = Duration::from_secs(3);
/// Extra settle time after a navigation, on top of the load event.
const NAV_SETTLE: Duration = Duration::from_secs(6);
/// Duration of an explicit `wait` action.
const WAIT_STEP: Duration = Duration::from_secs(5);
/// Wheel delta per scroll action, in CSS pixels.
const WHEEL_DELTA: f64 = 1000.0;

const VIEWPORT_WIDTH: u32 = 1280;
const VIEWPORT_HEIGHT: u32 = 800;

// Chrome's input-event modifier bitmask.
const MOD_ALT: i64 = 1;
const MOD_CTRL: i64 = 2;
const MOD_META: i64 = 4;
const MOD_SHIFT: i64 = 8;

pub struct CdpDriver {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl CdpDriver {
    /// Launch a Chrome instance with one blank page.
    pub async fn launch(headful: bool) -> Result<Self, AgentError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT);
        if headful {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|err| AgentError::browser(format!("failed to build browser config: {err}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| AgentError::browser(format!("failed to launch browser: {err}")))?;

        // Pump CDP messages for the lifetime of the browser.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    debug!("CDP handler event loop ended");
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|err| AgentError::browser(format!("failed to open page: {err}")))?;

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Shut down the browser process.
    pub async fn close(mut self) {
        if let Err(err) = self.browser.close().await {
            warn!(error = %err, "error closing browser");
        }
        let _ = self.handler.await;
    }

    async fn dispatch_mouse(&self, params: DispatchMouseEventParams) -> Result<(), AgentError> {
        self.page
            .execute(params)
            .await
            .map_err(|err| AgentError::browser(format!("mouse event failed: {err}")))?;
        Ok(())
    }

    async fn dispatch_key(&self, params: DispatchKeyEventParams) -> Result<(), AgentError> {
        self.page
            .execute(params)
            .await
            .map_err(|err| AgentError::browser(format!("key event failed: {err}")))?;
        Ok(())
    }

    async fn move_mouse(&self, x: i32, y: i32) -> Result<(), AgentError> {
        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseMoved)
            .x(f64::from(x))
            .y(f64::from(y))
            .build()
            .map_err(AgentError::browser)?;
        self.dispatch_mouse(params).await
    }

    async fn press_and_release(
        &self,
        x: i32,
        y: i32,
        button: MouseButton,
        click_count: i64,
    ) -> Result<(), AgentError> {
        let pressed = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MousePressed)
            .x(f64::from(x))
            .y(f64::from(y))
            .button(button.clone())
            .click_count(click_count)
            .build()
            .map_err(AgentError::browser)?;
        self.dispatch_mouse(pressed).await?;

        let released = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseReleased)
            .x(f64::from(x))
            .y(f64::from(y))
            .button(button)
            .click_count(click_count)
            .build()
            .map_err(AgentError::browser)?;
        self.dispatch_mouse(released).await
    }

    async fn press_dom_key(&self, key: &str, modifiers: i64) -> Result<(), AgentError> {
        let down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyDown)
            .key(key.to_string())
            .modifiers(modifiers)
            .build()
            .map_err(AgentError::browser)?;
        self.dispatch_key(down).await?;

        let up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key(key.to_string())
            .modifiers(modifiers)
            .build()
            .map_err(AgentError::browser)?;
        self.dispatch_key(up).await
    }

    async fn settle(&self) {
        sleep(ACTION_SETTLE).await;
    }
}

#[async_trait]
impl BrowserDriver for CdpDriver {
    async fn navigate(&self, url: &str) -> Result<(), AgentError> {
        self.page
            .goto(url)
            .await
            .map_err(|err| AgentError::browser(format!("navigation to {url} failed: {err}")))?;
        sleep(NAV_SETTLE).await;
        Ok(())
    }

    async fn click(&self, x: i32, y: i32) -> Result<(), AgentError> {
        self.move_mouse(x, y).await?;
        self.press_and_release(x, y, MouseButton::Left, 1).await?;
        self.settle().await;
        Ok(())
    }

    async fn double_click(&self, x: i32, y: i32) -> Result<(), AgentError> {
        self.move_mouse(x, y).await?;
        self.press_and_release(x, y, MouseButton::Left, 1).await?;
        self.press_and_release(x, y, MouseButton::Left, 2).await?;
        self.settle().await;
        Ok(())
    }

    async fn right_click(&self, x: i32, y: i32) -> Result<(), AgentError> {
        self.move_mouse(x, y).await?;
        self.press_and_release(x, y, MouseButton::Right, 1).await?;
        self.settle().await;
        Ok(())
    }

    async fn drag(&self, from: (i32, i32), to: (i32, i32)) -> Result<(), AgentError> {
        self.move_mouse(from.0, from.1).await?;
        let pressed = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MousePressed)
            .x(f64::from(from.0))
            .y(f64::from(from.1))
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(AgentError::browser)?;
        self.dispatch_mouse(pressed).await?;

        self.move_mouse(to.0, to.1).await?;
        let released = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseReleased)
            .x(f64::from(to.0))
            .y(f64::from(to.1))
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(AgentError::browser)?;
        self.dispatch_mouse(released).await?;
        self.settle().await;
        Ok(())
    }

    async fn press_hotkey(&self, keys: &str) -> Result<(), AgentError> {
        let keys: Vec<&str> = keys.split_whitespace().collect();
        let Some((&main_key, modifier_keys)) = keys.split_last() else {
            return Err(AgentError::browser("hotkey with no keys"));
        };

        let mut modifiers = 0i64;
        for modifier in modifier_keys {
            modifiers |= match *modifier {
                "ctrl" => MOD_CTRL,
                "shift" => MOD_SHIFT,
                "alt" => MOD_ALT,
                "cmd" | "meta" => MOD_META,
                other => {
                    warn!(key = other, "unknown hotkey modifier; ignoring");
                    0
                }
            };
        }

        self.press_dom_key(dom_key_name(main_key), modifiers).await?;
        self.settle().await;
        Ok(())
    }

    async fn type_text(&self, content: &str) -> Result<(), AgentError> {
        for ch in content.chars() {
            if ch == '\n' {
                // Trailing newline is the submit convention.
                self.press_dom_key("Enter", 0).await?;
                continue;
            }
            let params = DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::Char)
                .text(ch.to_string())
                .build()
                .map_err(AgentError::browser)?;
            self.dispatch_key(params).await?;
        }
        self.settle().await;
        Ok(())
    }

    async fn scroll(&self, x: i32, y: i32, direction: &str) -> Result<(), AgentError> {
        let (delta_x, delta_y) = match direction {
            "down" => (0.0, WHEEL_DELTA),
            "up" => (0.0, -WHEEL_DELTA),
            "right" => (WHEEL_DELTA, 0.0),
            "left" => (-WHEEL_DELTA, 0.0),
            other => {
                return Err(AgentError::browser(format!(
                    "unknown scroll direction: {other}"
                )))
            }
        };

        let params = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(f64::from(x))
            .y(f64::from(y))
            .delta_x(delta_x)
            .delta_y(delta_y)
            .build()
            .map_err(AgentError::browser)?;
        self.dispatch_mouse(params).await?;
        self.settle().await;
        Ok(())
    }

    async fn wait_fixed(&self) -> Result<(), AgentError> {
        sleep(WAIT_STEP).await;
        Ok(())
    }

    async fn observe(&self) -> Result<Observation, AgentError> {
        let url = self
            .page
            .url()
            .await
            .map_err(|err| AgentError::browser(format!("failed to read page URL: {err}")))?
            .unwrap_or_default();

        let png = self
            .page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(false)
                    .build(),
            )
            .await
            .map_err(|err| AgentError::browser(format!("screenshot failed: {err}")))?;

        Ok(Observation {
            url,
            screenshot_data_uri: format!("data:image/png;base64,{}", Base64.encode(&png)),
        })
    }
}

/// Map a grammar key name to the DOM key name Chrome expects.
fn dom_key_name(key: &str) -> &str {
    match key {
        "enter" => "Enter",
        "tab" => "Tab",
        "backspace" => "Backspace",
        "delete" => "Delete",
        "esc" => "Escape",
        "space" => " ",
        "up" => "ArrowUp",
        "down" => "ArrowDown",
        "left" => "ArrowLeft",
        "right" => "ArrowRight",
        other => other,
    }
}
