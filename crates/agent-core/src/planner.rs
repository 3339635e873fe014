//! One-shot start-URL planner.
//!
//! Runs once per task before the loop starts. The model is asked for a
//! `START_URL:` line; a reply without one (or with an unparseable URL) is a
//! valid "no preference" outcome, in which case the loop starts on whatever
//! page the browser is already showing.

use tracing::{debug, warn};
use url::Url;

use crate::errors::AgentError;
use crate::llm::{ChatMessage, ModelClient};
use crate::prompts;

const START_URL_MARKER: &str = "START_URL:";

/// Planner output: the chosen start site plus the full reply, which seeds
/// the transcript as the initial plan.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub start_url: Option<String>,
    pub plan_text: String,
}

/// Ask the model for an initial plan and a starting site for the task.
pub async fn plan(
    model: &dyn ModelClient,
    task: &str,
    procedural_overview: &str,
) -> Result<PlanOutcome, AgentError> {
    let prompt = prompts::format_planner_prompt(task, procedural_overview);
    let reply = model.complete(&[ChatMessage::user(prompt)]).await?;

    Ok(PlanOutcome {
        start_url: extract_start_url(&reply),
        plan_text: reply,
    })
}

/// Scan for the first `START_URL:` line; first match wins.
fn extract_start_url(reply: &str) -> Option<String> {
    for line in reply.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix(START_URL_MARKER) else {
            continue;
        };
        let candidate = rest.trim();
        return match Url::parse(candidate) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                debug!(url = candidate, "planner chose a start URL");
                Some(candidate.to_string())
            }
            _ => {
                warn!(candidate, "planner produced an unusable start URL; ignoring");
                None
            }
        };
    }

    debug!("planner reply carried no start URL");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockModelClient;

    #[tokio::test]
    async fn extracts_start_url_line_and_keeps_plan_text() {
        let model = MockModelClient::new();
        model.push_reply("Apple sells macbooks directly.\nSTART_URL: https://www.apple.com\n");

        let outcome = plan(&model, "buy a macbook", "").await.unwrap();
        assert_eq!(outcome.start_url.as_deref(), Some("https://www.apple.com"));
        assert!(outcome.plan_text.contains("Apple sells macbooks"));
    }

    #[tokio::test]
    async fn reply_without_marker_is_no_preference() {
        let model = MockModelClient::new();
        model.push_reply("I would start somewhere relevant to the task.");

        let outcome = plan(&model, "task", "").await.unwrap();
        assert_eq!(outcome.start_url, None);
        assert!(!outcome.plan_text.is_empty());
    }

    #[tokio::test]
    async fn unparseable_url_is_ignored() {
        let model = MockModelClient::new();
        model.push_reply("START_URL: not a url at all");

        let outcome = plan(&model, "task", "").await.unwrap();
        assert_eq!(outcome.start_url, None);
    }

    #[tokio::test]
    async fn non_http_scheme_is_ignored() {
        let model = MockModelClient::new();
        model.push_reply("START_URL: ftp://files.example");

        let outcome = plan(&model, "task", "").await.unwrap();
        assert_eq!(outcome.start_url, None);
    }

    #[test]
    fn first_marker_line_wins() {
        let reply = "START_URL: https://first.example\nSTART_URL: https://second.example";
        assert_eq!(
            extract_start_url(reply).as_deref(),
            Some("https://first.example")
        );
    }
}
