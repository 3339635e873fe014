use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use memory_center::MemoryStore;
use webpilot_core_types::MemoryEntry;

use super::default_memory_path;

#[derive(Args, Debug)]
pub struct MemoryArgs {
    #[command(subcommand)]
    pub command: MemoryCommand,
}

#[derive(Subcommand, Debug)]
pub enum MemoryCommand {
    /// Print stored episodes and summaries.
    Show(MemoryShowArgs),
}

#[derive(Args, Debug)]
pub struct MemoryShowArgs {
    /// Memory store location (defaults to the user data directory).
    #[arg(long)]
    pub memory_file: Option<PathBuf>,

    /// Restrict output to one site.
    #[arg(long)]
    pub url: Option<String>,

    /// Maximum episodes to print.
    #[arg(long, default_value_t = 5)]
    pub limit: usize,
}

pub async fn cmd_memory(args: &MemoryArgs) -> Result<i32> {
    match &args.command {
        MemoryCommand::Show(show) => cmd_show(show),
    }
}

fn cmd_show(args: &MemoryShowArgs) -> Result<i32> {
    let path = args
        .memory_file
        .clone()
        .unwrap_or_else(default_memory_path);
    let store = MemoryStore::open(&path);

    println!("Memory store: {}", store.path().display());
    println!("Episodes:     {}", store.episode_count());

    match &args.url {
        Some(url) => {
            println!("\nSite: {url}");
            println!("\nSite summary:\n{}", store.site_summary(url));
            println!("\nSuccessful approaches:\n{}", store.procedural_summary(url));

            let episodes = store.recent_episodes(url, args.limit);
            if !episodes.is_empty() {
                println!("\nRecent episodes:");
                for episode in &episodes {
                    print_episode(episode);
                }
            }
        }
        None => {
            let overview = store.procedural_overview();
            if !overview.is_empty() {
                println!("\nSuccessful approaches by site:\n{overview}");
            }

            let episodes = store.all_episodes();
            if !episodes.is_empty() {
                println!("\nRecent episodes:");
                for episode in episodes.iter().take(args.limit) {
                    print_episode(episode);
                }
            }
        }
    }

    Ok(0)
}

fn print_episode(episode: &MemoryEntry) {
    let outcome = if episode.success { "ok " } else { "FAIL" };
    println!(
        "  [{outcome}] {} | {} | {} actions | {}",
        episode.recorded_at.format("%Y-%m-%d %H:%M"),
        episode.url,
        episode.trajectory.len(),
        episode.task
    );
    for learning in &episode.insights.key_learnings {
        println!("         - {learning}");
    }
}
