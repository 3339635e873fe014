use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::info;

use action_parser::ActionGrammar;
use agent_core::{AgentConfig, AgentLoop, ModelSummarizer};
use memory_center::MemoryStore;
use webpilot_core_types::{RunResult, RunStatus};

use crate::browser::CdpDriver;
use crate::llm::{OpenAiClient, OpenAiConfig};

use super::default_memory_path;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Task instruction for the agent.
    pub task: String,

    /// Iteration bound before the run is declared exhausted.
    #[arg(long, default_value_t = 25)]
    pub max_iterations: u32,

    /// Memory store location (defaults to the user data directory).
    #[arg(long)]
    pub memory_file: Option<PathBuf>,

    /// Decision grammar the deployed model speaks.
    #[arg(long, value_enum, default_value_t = GrammarArg::Call)]
    pub grammar: GrammarArg,

    /// Model identifier passed to the endpoint.
    #[arg(long, default_value = "openai/gpt-4.1-mini")]
    pub model: String,

    /// Chat-completions API base URL.
    #[arg(long, default_value = "https://openrouter.ai/api/v1")]
    pub api_base: String,

    /// Show the browser window instead of running headless.
    #[arg(long)]
    pub headful: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum GrammarArg {
    Tag,
    Call,
}

impl From<GrammarArg> for ActionGrammar {
    fn from(arg: GrammarArg) -> Self {
        match arg {
            GrammarArg::Tag => ActionGrammar::Tag,
            GrammarArg::Call => ActionGrammar::Call,
        }
    }
}

pub async fn cmd_run(args: &RunArgs) -> Result<i32> {
    let api_key = env::var("OPENROUTER_API_KEY")
        .or_else(|_| env::var("OPENAI_API_KEY"))
        .context("set OPENROUTER_API_KEY or OPENAI_API_KEY to reach the model endpoint")?;

    let memory_path = args
        .memory_file
        .clone()
        .unwrap_or_else(default_memory_path);
    info!(path = %memory_path.display(), "using memory store");
    let mut memory = MemoryStore::open(&memory_path);

    let model = OpenAiClient::new(OpenAiConfig::new(api_key, &args.model, &args.api_base))?;
    let driver = CdpDriver::launch(args.headful).await?;

    let config = AgentConfig::new()
        .max_iterations(args.max_iterations)
        .grammar(args.grammar.into());
    let summarizer = ModelSummarizer::new(&model);

    let outcome = AgentLoop::new(config)
        .run(&args.task, &model, &driver, &mut memory, &summarizer)
        .await;
    driver.close().await;
    let result = outcome?;

    print_result(&result);
    Ok(exit_code(&result))
}

fn print_result(result: &RunResult) {
    let status = match result.status {
        RunStatus::Success => "success",
        RunStatus::Failure => "failure",
        RunStatus::Exhausted => "exhausted",
    };
    println!("Status:  {status}");
    println!("Steps:   {}", result.steps_taken);
    println!("Time:    {:.1}s", result.total_time_ms as f64 / 1000.0);
    if !result.url.is_empty() {
        println!("Site:    {}", result.url);
    }
    println!("Message: {}", result.message);
    if !result.trajectory.is_empty() {
        let kinds: Vec<&str> = result
            .trajectory
            .iter()
            .map(|step| step.kind.as_str())
            .collect();
        println!("Actions: {}", kinds.join(" -> "));
    }
}

fn exit_code(result: &RunResult) -> i32 {
    match result.status {
        RunStatus::Success => 0,
        RunStatus::Failure => 1,
        RunStatus::Exhausted => 2,
    }
}
