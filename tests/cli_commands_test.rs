//! Command handlers driven end to end against a temporary project.

mod common;

use dmaic::cli::commands::{analyze, changes, check, history, init, scan};
use dmaic::cli::{Cli, Commands, Workspace};
use dmaic::domain::models::Config;
use dmaic::infrastructure::config::ConfigLoader;

use clap::Parser;
use common::python_project;

fn parse(args: &[&str]) -> Commands {
    let mut argv = vec!["dmaic"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).expect("arguments should parse").command
}

fn workspace(root: &std::path::Path) -> Workspace {
    Workspace::new(root, Config::default(), root.join(".dmaic/config.yaml"))
}

#[tokio::test]
async fn test_init_then_converge_then_check() {
    let project = python_project(3);
    let workspace = workspace(project.path());

    let Commands::Init(args) = parse(&["init"]) else {
        panic!("expected init");
    };
    init::execute(args, &workspace, true).await.unwrap();
    assert!(project.path().join(".dmaic/config.yaml").is_file());
    assert_eq!(
        ConfigLoader::load_from_file(project.path().join(".dmaic/config.yaml")).unwrap(),
        Config::default()
    );

    let Commands::Check(args) = parse(&["check"]) else {
        panic!("expected check");
    };
    assert!(!check::execute(args, &workspace, true).await.unwrap());

    for _ in 0..3 {
        let Commands::Analyze(args) = parse(&[
            "analyze",
            "--tests",
            "10/10",
            "--metrics",
            "4/4",
            "--knowledge",
            "5/5",
        ]) else {
            panic!("expected analyze");
        };
        analyze::execute(args, &workspace, true).await.unwrap();
    }

    let Commands::Check(args) = parse(&["check"]) else {
        panic!("expected check");
    };
    assert!(check::execute(args, &workspace, true).await.unwrap());

    let Commands::History(args) = parse(&["history", "--limit", "2"]) else {
        panic!("expected history");
    };
    history::execute(args, &workspace, true).await.unwrap();
}

#[tokio::test]
async fn test_scan_and_changes_on_fresh_project() {
    let project = python_project(2);
    let workspace = workspace(project.path());

    let Commands::Scan(args) = parse(&["scan", "--window", "1"]) else {
        panic!("expected scan");
    };
    scan::execute(args, &workspace, true).await.unwrap();
    assert!(project.path().join(".dmaic/hash_history.json").is_file());

    let Commands::Changes(args) = parse(&["changes", "--verbose"]) else {
        panic!("expected changes");
    };
    changes::execute(args, &workspace, true).await.unwrap();
}

#[tokio::test]
async fn test_history_fails_on_corrupt_file() {
    let project = python_project(1);
    common::write_file(project.path(), ".dmaic/convergence_history.json", "{{{");
    let workspace = workspace(project.path());

    let Commands::History(args) = parse(&["history"]) else {
        panic!("expected history");
    };
    assert!(history::execute(args, &workspace, true).await.is_err());
}
