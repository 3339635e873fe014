//! Agent loop controller: orchestration of the observe-think-act cycle.
//!
//! Each iteration observes the browser (URL + screenshot), consults the
//! vision model for the next action, parses the reply under the configured
//! grammar, and executes. A reply that fails to parse costs its iteration
//! and feeds a corrective notice into the next turn instead of aborting.
//! Terminal actions are judged against the task; every finished run is
//! recorded as an episode before the result is returned.

use std::time::Instant;

use tracing::{info, warn};

use action_parser::ActionParser;
use memory_center::{MemoryStore, Summarizer};
use webpilot_core_types::{Insight, RunResult, TaskId, Trajectory, TrajectoryStep};

use super::config::AgentConfig;
use crate::driver::BrowserDriver;
use crate::errors::AgentError;
use crate::executor;
use crate::llm::{ChatMessage, ContentPart, ModelClient};
use crate::planner;
use crate::prompts;

/// The observe-think-act loop for one task.
pub struct AgentLoop {
    config: AgentConfig,
    parser: ActionParser,
}

impl AgentLoop {
    pub fn new(config: AgentConfig) -> Self {
        let parser = ActionParser::new(config.grammar);
        Self { config, parser }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run the task to completion, exhaustion, or a fatal error.
    ///
    /// The episode is recorded against the last URL the loop observed; a run
    /// that never observed a page (the browser failed before the first
    /// iteration) records nothing.
    pub async fn run(
        &self,
        task: &str,
        model: &dyn ModelClient,
        driver: &dyn BrowserDriver,
        memory: &mut MemoryStore,
        summarizer: &dyn Summarizer,
    ) -> Result<RunResult, AgentError> {
        let started = Instant::now();
        let task_id = TaskId::new();
        info!(%task_id, task, "agent run starting");

        let plan = planner::plan(model, task, &memory.procedural_overview()).await?;
        if let Some(url) = &plan.start_url {
            driver.navigate(url).await?;
        }

        let memory_context = plan.start_url.as_deref().map(|url| {
            prompts::format_memory_context(
                &memory.site_summary(url),
                &memory.procedural_summary(url),
                &memory.recent_episodes(url, self.config.episode_recall),
            )
        });
        let system =
            prompts::format_system_prompt(self.config.grammar, task, memory_context.as_deref());
        // The plan seeds the transcript so each decision turn can see it.
        let mut messages = vec![
            ChatMessage::system(system),
            ChatMessage::assistant(plan.plan_text.clone()),
        ];

        let mut trajectory: Trajectory = Vec::new();
        let mut pending_notice: Option<String> = None;
        let mut last_url = String::new();
        // (judged success, terminal message, iterations consumed)
        let mut outcome: Option<(bool, String, u32)> = None;

        for iteration in 1..=self.config.max_iterations {
            let observation = driver.observe().await?;
            last_url = observation.url.clone();

            // Only the newest screenshot stays an image; earlier ones are
            // collapsed to placeholders to bound the context.
            strip_screenshots(&mut messages);
            let mut text = format!("URL: {}", observation.url);
            if let Some(notice) = pending_notice.take() {
                text.push_str("\n\n");
                text.push_str(&notice);
            }
            messages.push(ChatMessage::user_with_image(
                text,
                observation.screenshot_data_uri,
            ));

            let raw = model.complete(&messages).await?;
            messages.push(ChatMessage::assistant(raw.clone()));

            let action = match self.parser.parse(&raw) {
                Ok(action) => action,
                Err(err) => {
                    warn!(iteration, error = %err, "model reply did not parse");
                    pending_notice = Some(prompts::format_parse_failure(&err.to_string()));
                    continue;
                }
            };

            if action.kind.is_terminal() {
                let message = action.terminal_content().to_string();
                let success = judge(model, task, &message, &last_url).await?;
                outcome = Some((success, message, iteration));
                break;
            }

            info!(iteration, kind = %action.kind, "executing action");
            if executor::execute(driver, &action).await {
                trajectory.push(TrajectoryStep::from(&action));
            } else {
                pending_notice = Some(prompts::format_execution_failure(action.kind.as_str()));
            }
        }

        let elapsed = started.elapsed().as_millis() as u64;
        let result = match outcome {
            Some((true, message, steps)) => {
                RunResult::success(message, &last_url, steps, trajectory.clone(), elapsed)
            }
            Some((false, message, steps)) => {
                RunResult::failure(message, &last_url, steps, trajectory.clone(), elapsed)
            }
            None => RunResult::exhausted(
                self.config.max_iterations,
                &last_url,
                trajectory.clone(),
                elapsed,
            ),
        };

        // Record against the last observed page, falling back to the
        // planned start site if the loop never observed one.
        let record_url = if last_url.is_empty() {
            plan.start_url.clone().unwrap_or_default()
        } else {
            last_url
        };
        if record_url.is_empty() {
            warn!("no page was observed; skipping episode recording");
        } else {
            let insights =
                generate_insights(model, task, &result.message, result.is_success()).await;
            memory
                .add_episode(
                    task,
                    result.is_success(),
                    trajectory,
                    &record_url,
                    insights,
                    summarizer,
                )
                .await?;
        }

        info!(
            %task_id,
            status = ?result.status,
            steps = result.steps_taken,
            time_ms = result.total_time_ms,
            "agent run finished"
        );
        Ok(result)
    }
}

/// Collapse earlier screenshots to text placeholders, in place.
fn strip_screenshots(messages: &mut [ChatMessage]) {
    for message in messages.iter_mut() {
        for part in message.content.iter_mut() {
            if matches!(part, ContentPart::ImageUrl { .. }) {
                *part = ContentPart::Text {
                    text: "[screenshot from an earlier step omitted]".to_string(),
                };
            }
        }
    }
}

/// Ask the model whether the terminal message actually completed the task.
///
/// A reply without a usable `success` field counts as a failure verdict.
async fn judge(
    model: &dyn ModelClient,
    task: &str,
    final_message: &str,
    url: &str,
) -> Result<bool, AgentError> {
    let prompt = prompts::format_judge_prompt(task, final_message, url);
    let verdict = model.complete_structured(&prompt).await?;
    match verdict.get("success").and_then(serde_json::Value::as_bool) {
        Some(success) => Ok(success),
        None => {
            warn!(%verdict, "judge reply carried no boolean verdict; treating as failure");
            Ok(false)
        }
    }
}

/// Extract structured insights for the episode record. Lenient: a failed
/// call or unusable reply degrades to empty insights rather than losing the
/// episode.
async fn generate_insights(
    model: &dyn ModelClient,
    task: &str,
    result: &str,
    success: bool,
) -> Insight {
    let prompt = prompts::format_insight_prompt(task, result, success);
    match model.complete_structured(&prompt).await {
        Ok(value) => match serde_json::from_value::<Insight>(value) {
            Ok(insights) => insights,
            Err(err) => {
                warn!(error = %err, "insight reply did not deserialize; recording empty insights");
                Insight::default()
            }
        },
        Err(err) => {
            warn!(error = %err, "insight call failed; recording empty insights");
            Insight::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use webpilot_core_types::{ActionKind, Observation, RunStatus};

    use crate::llm::MockModelClient;
    use memory_center::MemoryError;

    struct CannedSummarizer;

    #[async_trait]
    impl Summarizer for CannedSummarizer {
        async fn summarize_site(
            &self,
            _url: &str,
            _episodes: &[webpilot_core_types::MemoryEntry],
        ) -> Result<String, MemoryError> {
            Ok("site summary".to_string())
        }

        async fn summarize_successes(
            &self,
            _url: &str,
            _episodes: &[webpilot_core_types::MemoryEntry],
        ) -> Result<String, MemoryError> {
            Ok("procedural summary".to_string())
        }
    }

    /// Driver double serving a fixed page and recording dispatches.
    #[derive(Default)]
    struct StubDriver {
        calls: Mutex<Vec<String>>,
    }

    impl StubDriver {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }
    }

    #[async_trait]
    impl BrowserDriver for StubDriver {
        async fn navigate(&self, url: &str) -> Result<(), AgentError> {
            self.record(format!("navigate {url}"));
            Ok(())
        }

        async fn click(&self, x: i32, y: i32) -> Result<(), AgentError> {
            self.record(format!("click {x},{y}"));
            Ok(())
        }

        async fn double_click(&self, _x: i32, _y: i32) -> Result<(), AgentError> {
            self.record("double_click");
            Ok(())
        }

        async fn right_click(&self, _x: i32, _y: i32) -> Result<(), AgentError> {
            self.record("right_click");
            Ok(())
        }

        async fn drag(&self, _from: (i32, i32), _to: (i32, i32)) -> Result<(), AgentError> {
            self.record("drag");
            Ok(())
        }

        async fn press_hotkey(&self, keys: &str) -> Result<(), AgentError> {
            self.record(format!("hotkey {keys}"));
            Ok(())
        }

        async fn type_text(&self, content: &str) -> Result<(), AgentError> {
            self.record(format!("type {content}"));
            Ok(())
        }

        async fn scroll(&self, _x: i32, _y: i32, direction: &str) -> Result<(), AgentError> {
            self.record(format!("scroll {direction}"));
            Ok(())
        }

        async fn wait_fixed(&self) -> Result<(), AgentError> {
            self.record("wait");
            Ok(())
        }

        async fn observe(&self) -> Result<Observation, AgentError> {
            Ok(Observation {
                url: "https://shop.example".to_string(),
                screenshot_data_uri: "data:image/png;base64,AAAA".to_string(),
            })
        }
    }

    fn memory_in(dir: &tempfile::TempDir) -> MemoryStore {
        MemoryStore::open(dir.path().join("memory.json"))
    }

    #[tokio::test]
    async fn immediate_terminal_action_ends_the_run() {
        let model = MockModelClient::new();
        model.push_reply("no start url preference"); // planner
        model.push_reply("Thought: done already.\nAction: finished(content='the answer')");
        model.push_structured(json!({"success": true, "reasoning": "answered"})); // judge
        model.push_structured(json!({
            "key_learnings": ["was easy"],
            "improvement_areas": [],
            "success_factors": ["direct answer"]
        })); // insights

        let driver = StubDriver::default();
        let dir = tempfile::tempdir().unwrap();
        let mut memory = memory_in(&dir);

        let result = AgentLoop::new(AgentConfig::minimal())
            .run("answer the question", &model, &driver, &mut memory, &CannedSummarizer)
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.message, "the answer");
        assert_eq!(result.steps_taken, 1);
        assert!(result.trajectory.is_empty());
        // The terminal action never reached the browser.
        assert!(driver.calls().is_empty());
        // The episode was recorded.
        assert_eq!(memory.episode_count(), 1);
        assert_ne!(memory.site_summary("https://shop.example"), memory_center::NO_EXPERIENCE);
    }

    #[tokio::test]
    async fn iteration_bound_yields_exhausted() {
        let model = MockModelClient::new();
        model.push_reply("no preference"); // planner
        for _ in 0..3 {
            model.push_reply("Action: wait()");
        }
        // Structured queue left empty: insights degrade to default.

        let driver = StubDriver::default();
        let dir = tempfile::tempdir().unwrap();
        let mut memory = memory_in(&dir);

        let result = AgentLoop::new(AgentConfig::minimal())
            .run("an endless task", &model, &driver, &mut memory, &CannedSummarizer)
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Exhausted);
        assert_eq!(result.steps_taken, 3);
        assert_eq!(result.trajectory.len(), 3);
        assert_eq!(driver.calls(), vec!["wait", "wait", "wait"]);
        // Exhausted runs are still recorded, as failures.
        assert_eq!(memory.episode_count(), 1);
        assert_eq!(
            memory.procedural_summary("https://shop.example"),
            memory_center::NO_APPROACHES
        );
    }

    #[tokio::test]
    async fn executed_actions_enter_the_trajectory() {
        let model = MockModelClient::new();
        model.push_reply("START_URL: https://shop.example"); // planner
        model.push_reply("Action: click(point='(120,340)')");
        model.push_reply("Action: finished(content='bought the fridge')");
        model.push_structured(json!({"success": true}));

        let driver = StubDriver::default();
        let dir = tempfile::tempdir().unwrap();
        let mut memory = memory_in(&dir);

        let result = AgentLoop::new(AgentConfig::minimal())
            .run("buy a fridge", &model, &driver, &mut memory, &CannedSummarizer)
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.steps_taken, 2);
        assert_eq!(result.trajectory.len(), 1);
        assert_eq!(result.trajectory[0].kind, ActionKind::Click);
        assert_eq!(result.url, "https://shop.example");
        assert_eq!(
            driver.calls(),
            vec!["navigate https://shop.example", "click 120,340"]
        );
    }

    #[tokio::test]
    async fn tag_grammar_drives_the_loop_end_to_end() {
        let model = MockModelClient::new();
        model.push_reply("START_URL: https://shop.example"); // planner
        model.push_reply(
            "<reasoning>the search box is at the top</reasoning>\
             <action_type>click</action_type>\
             <action_argument name=\"point\">(120,340)</action_argument>",
        );
        model.push_reply(
            "<reasoning>done</reasoning>\
             <action_type>finished</action_type>\
             <action_argument name=\"content\">ordered the fridge</action_argument>",
        );
        model.push_structured(json!({"success": true}));

        let driver = StubDriver::default();
        let dir = tempfile::tempdir().unwrap();
        let mut memory = memory_in(&dir);

        let config = AgentConfig::minimal().grammar(action_parser::ActionGrammar::Tag);
        let result = AgentLoop::new(config)
            .run("buy a fridge", &model, &driver, &mut memory, &CannedSummarizer)
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.message, "ordered the fridge");
        assert_eq!(result.trajectory.len(), 1);
        assert_eq!(result.trajectory[0].kind, ActionKind::Click);
        assert_eq!(
            driver.calls(),
            vec!["navigate https://shop.example", "click 120,340"]
        );
    }

    #[tokio::test]
    async fn unparseable_reply_costs_an_iteration() {
        let model = MockModelClient::new();
        model.push_reply("no preference"); // planner
        model.push_reply("I'm not sure what to do here."); // does not parse
        model.push_reply("Action: finished(content='giving up')");
        model.push_structured(json!({"success": false}));

        let driver = StubDriver::default();
        let dir = tempfile::tempdir().unwrap();
        let mut memory = memory_in(&dir);

        let result = AgentLoop::new(AgentConfig::minimal())
            .run("a task", &model, &driver, &mut memory, &CannedSummarizer)
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Failure);
        // Two iterations consumed: the failed parse and the terminal.
        assert_eq!(result.steps_taken, 2);
        assert!(driver.calls().is_empty());
    }

    #[tokio::test]
    async fn judge_without_verdict_counts_as_failure() {
        let model = MockModelClient::new();
        model.push_reply("no preference"); // planner
        model.push_reply("Action: finished(content='maybe done')");
        model.push_structured(json!({"reasoning": "no verdict field"}));

        let driver = StubDriver::default();
        let dir = tempfile::tempdir().unwrap();
        let mut memory = memory_in(&dir);

        let result = AgentLoop::new(AgentConfig::minimal())
            .run("a task", &model, &driver, &mut memory, &CannedSummarizer)
            .await
            .unwrap();

        assert_eq!(result.status, RunStatus::Failure);
    }

    #[test]
    fn strip_screenshots_collapses_images_only() {
        let mut messages = vec![
            ChatMessage::system("system"),
            ChatMessage::user_with_image("URL: https://a.example", "data:image/png;base64,AAAA"),
            ChatMessage::assistant("Action: wait()"),
        ];
        strip_screenshots(&mut messages);

        assert!(!messages[1].has_image());
        assert!(messages[1].text().contains("URL: https://a.example"));
        assert_eq!(messages[2].text(), "Action: wait()");
    }
}
