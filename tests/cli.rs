//! Argument-surface tests for the webpilot binary.

use clap::Parser;

use webpilot_cli::cli::app::{CliArgs, Command};
use webpilot_cli::cli::run::GrammarArg;

#[test]
fn run_parses_task_and_defaults() {
    let cli = CliArgs::try_parse_from(["webpilot", "run", "find a fridge under $1000"]).unwrap();
    let Command::Run(args) = cli.command else {
        panic!("expected run command");
    };
    assert_eq!(args.task, "find a fridge under $1000");
    assert_eq!(args.max_iterations, 25);
    assert!(args.memory_file.is_none());
    assert!(!args.headful);
    assert!(matches!(args.grammar, GrammarArg::Call));
}

#[test]
fn run_accepts_overrides() {
    let cli = CliArgs::try_parse_from([
        "webpilot",
        "run",
        "a task",
        "--max-iterations",
        "40",
        "--grammar",
        "tag",
        "--memory-file",
        "/tmp/mem.json",
        "--headful",
    ])
    .unwrap();
    let Command::Run(args) = cli.command else {
        panic!("expected run command");
    };
    assert_eq!(args.max_iterations, 40);
    assert!(matches!(args.grammar, GrammarArg::Tag));
    assert_eq!(args.memory_file.as_deref().unwrap().to_str(), Some("/tmp/mem.json"));
    assert!(args.headful);
}

#[test]
fn memory_show_parses_filters() {
    let cli = CliArgs::try_parse_from([
        "webpilot",
        "memory",
        "show",
        "--url",
        "https://a.example",
        "--limit",
        "3",
    ])
    .unwrap();
    let Command::Memory(args) = cli.command else {
        panic!("expected memory command");
    };
    let webpilot_cli::cli::memory::MemoryCommand::Show(show) = args.command;
    assert_eq!(show.url.as_deref(), Some("https://a.example"));
    assert_eq!(show.limit, 3);
}

#[test]
fn run_requires_a_task() {
    assert!(CliArgs::try_parse_from(["webpilot", "run"]).is_err());
}
