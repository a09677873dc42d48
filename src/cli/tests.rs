//! Unit tests for CLI commands

use crate::cli::{describe_response, inspect_lines, Cli, Commands};
use crate::request::{OperationMapping, RunResponse, RunStatus, DEFAULT_BACKUP_LABEL};
use crate::spec::{load_spec, OperationCatalog};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn test_run_command_builds_request() {
    let cli = Cli::try_parse_from([
        "specforge-gen",
        "run",
        "--mode",
        "migrate",
        "--scope",
        "tags",
        "--tags",
        "Transactions,Settlements",
        "--legacy-spec",
        "legacy.yaml",
        "--target-spec",
        "target.yaml",
        "--dry-run",
    ])
    .unwrap();

    match cli.command {
        Commands::Run(args) => {
            let request = args.to_request();
            assert_eq!(request.mode, "migrate");
            assert_eq!(request.tags, vec!["Transactions", "Settlements"]);
            assert_eq!(request.legacy_spec_path.as_deref(), Some("legacy.yaml"));
            assert_eq!(request.project_root, PathBuf::from("."));
            assert_eq!(request.backup_label, DEFAULT_BACKUP_LABEL);
            assert!(request.dry_run);
            assert!(request.validate().is_ok());
        }
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn test_run_operations_flag() {
    let cli = Cli::try_parse_from([
        "specforge-gen",
        "run",
        "--mode",
        "scaffold",
        "--scope",
        "operations",
        "--operations",
        "processPayment",
        "--operations",
        "getTransaction",
        "--target-spec",
        "target.yaml",
        "--json",
    ])
    .unwrap();

    match cli.command {
        Commands::Run(args) => {
            assert!(args.json);
            assert_eq!(args.to_request().operation_ids, vec!["processPayment", "getTransaction"]);
        }
        _ => panic!("Expected Run command"),
    }
}

#[test]
fn test_all_commands_parse() {
    let commands = vec![
        vec!["specforge-gen", "run", "--mode", "scaffold", "--target-spec", "t.yaml"],
        vec!["specforge-gen", "detect"],
        vec!["specforge-gen", "detect", "--project-root", "svc", "--source-dir", "src"],
        vec!["specforge-gen", "inspect", "--spec", "t.yaml", "--tag", "Transactions"],
    ];

    for args in commands {
        let cli = Cli::try_parse_from(&args);
        assert!(cli.is_ok(), "Failed to parse command: {:?}", args);
    }
}

#[test]
fn test_inspect_lines_filter_by_tag() {
    let catalog = OperationCatalog::new("inspect", load_spec("bundled:target-gateway.yaml").unwrap());
    let all = inspect_lines(&catalog, None);
    let transactions = inspect_lines(&catalog, Some("Transactions"));
    assert_eq!(all.len(), catalog.len());
    assert!(!transactions.is_empty());
    assert!(transactions.len() < all.len());
    assert!(transactions.iter().all(|l| l.contains("Transactions")));
    assert!(transactions[0].starts_with("POST "));
}

#[test]
fn test_describe_response() {
    let mut response = RunResponse::new(RunStatus::Partial, "migrate", "all");
    response.operation_mappings.push(OperationMapping {
        legacy_operation: None,
        target_operation: "listWebhooks".into(),
        tag: "Webhooks".into(),
    });
    response.errors.push("Failed to generate headPing: boom".into());
    let text = describe_response(&response);
    assert!(text.starts_with("migrate run (all scope): PARTIAL SUCCESS\n"));
    assert!(text.contains("  listWebhooks <- N/A"));
    assert!(text.contains("error: Failed to generate headPing: boom"));
}
