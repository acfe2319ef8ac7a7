use ccprov::cli::{Cli, Command};
use ccprov::registry::ModelRole;
use ccprov::ui::ColorMode;
use clap::Parser;

#[test]
fn parses_use() {
    let cli = Cli::try_parse_from(["ccprov", "use", "glm"]).expect("cli parse should work");
    match cli.command {
        Command::Use { name } => assert_eq!(name, "glm"),
        _ => panic!("expected use command"),
    }
    assert_eq!(cli.color, ColorMode::Auto);
}

#[test]
fn parses_list_alias() {
    let cli = Cli::try_parse_from(["ccprov", "ls"]).expect("cli parse should work");
    assert!(matches!(cli.command, Command::List));
}

#[test]
fn parses_remove_aliases_and_force() {
    for alias in ["remove", "rm", "delete"] {
        let cli = Cli::try_parse_from(["ccprov", alias, "old", "--force"])
            .expect("cli parse should work");
        match cli.command {
            Command::Remove { name, force } => {
                assert_eq!(name, "old");
                assert!(force);
            }
            _ => panic!("expected remove command"),
        }
    }
}

#[test]
fn parses_add_with_models() {
    let cli = Cli::try_parse_from([
        "ccprov",
        "add",
        "kimi",
        "--base-url",
        "https://api.moonshot.cn/anthropic",
        "--api-key",
        "${KIMI_API_KEY}",
        "--timeout-ms",
        "600000",
        "--model",
        "default=kimi-k2",
        "--model",
        "small-fast=kimi-k2-turbo",
        "--no-input",
    ])
    .expect("cli parse should work");
    match cli.command {
        Command::Add(add) => {
            assert_eq!(add.name, "kimi");
            assert_eq!(add.api_key.as_deref(), Some("${KIMI_API_KEY}"));
            assert_eq!(add.timeout_ms, Some(600_000));
            assert_eq!(
                add.models,
                vec![
                    (ModelRole::Default, "kimi-k2".to_string()),
                    (ModelRole::SmallFast, "kimi-k2-turbo".to_string()),
                ]
            );
            assert!(add.no_input);
        }
        _ => panic!("expected add command"),
    }
}

#[test]
fn rejects_unknown_model_role() {
    let result = Cli::try_parse_from(["ccprov", "add", "x", "--model", "gpt=4"]);
    assert!(result.is_err());
}

#[test]
fn rejects_model_without_equals() {
    let result = Cli::try_parse_from(["ccprov", "add", "x", "--model", "opus"]);
    assert!(result.is_err());
}

#[test]
fn parses_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["ccprov", "current", "--color", "never", "-v"])
        .expect("cli parse should work");
    assert_eq!(cli.color, ColorMode::Never);
    assert!(cli.verbose);
}

#[test]
fn parses_show_without_name() {
    let cli = Cli::try_parse_from(["ccprov", "show"]).expect("cli parse should work");
    assert!(matches!(cli.command, Command::Show { name: None }));
}

#[test]
fn requires_subcommand() {
    assert!(Cli::try_parse_from(["ccprov"]).is_err());
}
