//! Unit tests for CLI commands
#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::commands::map_only_to_scope;
use crate::cli::{execute, load_generator_config, Cli, Commands, OnlyPart};
use crate::generator::GenerationScope;
use clap::Parser;
use std::path::Path;

const ORDER_JSON: &str = r#"{
  "source": "order.proto",
  "services": [
    {
      "name": "Order",
      "rpcs": [
        {
          "name": "Create",
          "request": "CreateOrderRequest",
          "reply": "CreateOrderReply",
          "options": [{ "name": "google.api.http", "value": { "post": "/orders", "body": "*" } }]
        }
      ]
    }
  ]
}"#;

#[test]
fn test_generate_command_with_flags() {
    let cli = Cli::try_parse_from([
        "svcgen",
        "generate",
        "--ast",
        "order.json",
        "--out",
        "svc",
        "--module",
        "shop::pb",
        "--only",
        "logic,errors",
        "--dry-run",
        "--prune-stale",
    ])
    .unwrap();

    match cli.command {
        Commands::Generate {
            ast,
            out,
            module,
            only,
            dry_run,
            prune_stale,
            config,
        } => {
            assert_eq!(ast.to_string_lossy(), "order.json");
            assert_eq!(out.to_string_lossy(), "svc");
            assert_eq!(module.as_deref(), Some("shop::pb"));
            assert_eq!(only, Some(vec![OnlyPart::Logic, OnlyPart::Errors]));
            assert!(dry_run);
            assert!(prune_stale);
            assert!(config.is_none());
        }
        _ => panic!("Expected Generate command"),
    }
}

#[test]
fn test_all_commands_parse() {
    let commands = vec![
        vec!["svcgen", "generate", "--ast", "order.json"],
        vec!["svcgen", "check", "--ast", "order.json", "--out", "svc"],
    ];

    for args in commands {
        let cli = Cli::try_parse_from(&args);
        assert!(cli.is_ok(), "Failed to parse command: {:?}", args);
    }
}

#[test]
fn test_ast_is_required() {
    assert!(Cli::try_parse_from(["svcgen", "generate"]).is_err());
    assert!(Cli::try_parse_from(["svcgen", "generate", "--ast", "a.json", "--only", "docs"]).is_err());
}

#[test]
fn test_map_only_to_scope() {
    assert_eq!(map_only_to_scope(None), GenerationScope::all());
    let scope = map_only_to_scope(Some(&[OnlyPart::Routes]));
    assert_eq!(
        scope,
        GenerationScope {
            logic: false,
            routes: true,
            errors: false
        }
    );
}

#[test]
fn test_explicit_config_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let ast = dir.path().join("order.json");
    let err = load_generator_config(Some(&dir.path().join("missing.toml")), &ast, None).unwrap_err();
    assert!(err.to_string().contains("missing.toml"));
}

#[test]
fn test_module_flag_overrides_config() {
    let dir = tempfile::tempdir().unwrap();
    let ast = dir.path().join("order.json");
    std::fs::write(
        dir.path().join("svcgen.toml"),
        "module_name = \"from_file\"\nfirst_error_code = 5000\n",
    )
    .unwrap();

    let config = load_generator_config(None, &ast, None).unwrap();
    assert_eq!(config.module_name, "from_file");
    let config = load_generator_config(None, &ast, Some("crate::proto")).unwrap();
    assert_eq!(config.module_name, "crate::proto");
    assert_eq!(config.first_error_code, 5000);
}

#[test]
fn test_check_fails_until_generated() {
    let dir = tempfile::tempdir().unwrap();
    let ast = dir.path().join("order.json");
    std::fs::write(&ast, ORDER_JSON).unwrap();
    let out = dir.path().join("svc");
    let args = |cmd: &str| -> Cli {
        Cli::try_parse_from([
            "svcgen",
            cmd,
            "--ast",
            ast.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .unwrap()
    };

    assert!(execute(&args("check")).is_err());
    assert!(!out.exists());

    execute(&args("generate")).unwrap();
    assert!(Path::new(&out.join("src/routes.rs")).exists());
    execute(&args("check")).unwrap();
}
