//! High-level command orchestration for the CLI.
//!
//! This module contains the handler functions for each CLI command (`list`,
//! `add`, `use`, etc.). It is the coordination layer between:
//! - `crate::ui` for user interaction (output, prompts).
//! - `crate::registry` for the stored profiles.
//! - `crate::switch` and `crate::alias` for applying them to Claude Code.
//! - `crate::links` for the shortcut symlinks.
//!
//! Each function here generally corresponds to a subcommand in `cli.rs`.

use anstyle::AnsiColor;
use anyhow::{Context, Result, anyhow, bail};
use inquire::{Confirm, Text};
use std::convert::Infallible;
use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::alias;
use crate::cli::AddArgs;
use crate::doctor::run_doctor;
use crate::error::CoreError;
use crate::expand::{expand_env, mask_secret};
use crate::links::{self, LinkOutcome, LinkReport};
use crate::paths::Paths;
use crate::registry::{CurrentProfile, ModelRole, Profile, Registry};
use crate::switch::{AppliedProfile, switch_profile};
use crate::ui::Ui;

const DEFAULT_TIMEOUT_MS: u64 = 120_000;
const OFFICIAL_ENDPOINT: &str = "https://api.anthropic.com (official)";

/// Turn a core error into a user-facing one with a hint where a fix is obvious
pub fn with_hint(err: CoreError) -> anyhow::Error {
    let hint = match &err {
        CoreError::ProfileNotFound { .. } => Some("Use 'ccprov list' to see available profiles."),
        CoreError::Parse { .. } => Some("Fix the JSON syntax in that file, e.g. with 'ccprov edit'."),
        CoreError::ExecutableNotFound { .. } => {
            Some("Install Claude Code or add it to your PATH. The profile switch was kept.")
        }
        CoreError::Io { .. } => None,
    };
    match hint {
        Some(hint) => anyhow!("{}\nHint: {}", err, hint),
        None => anyhow::Error::new(err),
    }
}

/// Fail with a hint if the registry hasn't been created yet
fn ensure_initialized(paths: &Paths) -> Result<()> {
    if !paths.registry_exists() {
        bail!(
            "Config file not found at {}.\nHint: Run 'ccprov init' to create one.",
            paths.registry_file.display()
        );
    }
    Ok(())
}

fn load_existing_registry(paths: &Paths) -> Result<Registry> {
    ensure_initialized(paths)?;
    Registry::load(&paths.registry_file).map_err(with_hint)
}

/// Validate profile name
///
/// Only allows alphanumeric characters, underscores, hyphens and dots.
pub fn validate_profile_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Profile name cannot be empty");
    }

    if name.chars().count() > 64 {
        bail!("Profile name cannot be longer than 64 characters");
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        bail!(
            "Invalid profile name '{}'.\n\n Only alphanumeric characters, hyphens (-), underscores (_) and dots (.) are allowed.",
            name
        );
    }

    Ok(())
}

/// Create the registry with default providers
pub fn init(paths: &Paths, ui: &Ui, create_links: bool) -> Result<()> {
    if paths.registry_exists() {
        ui.warn(format!(
            "Configuration already exists at {}",
            paths.registry_file.display()
        ));
        ui.println("Use 'ccprov edit' to modify it or delete the file to reinitialize.");
        return Ok(());
    }

    Registry::with_defaults()
        .save(&paths.registry_file)
        .map_err(with_hint)
        .context("Failed to create config")?;
    ui.ok(format!(
        "Configuration created at {}",
        paths.registry_file.display()
    ));

    if create_links {
        ui.newline();
        ui.println("Creating shortcut commands...");
        if let Err(e) = link(paths, None, ui) {
            ui.warn(format!("Failed to create symlinks: {:#}", e));
            ui.println("You can try again later with: ccprov link");
        }
    }

    ui.newline();
    ui.section("Next steps:");
    ui.println(format!(
        "  1. Add your API keys: {}",
        ui.accent("ccprov edit")
    ));
    ui.println(format!(
        "     or export them: {}",
        ui.accent("export DEEPSEEK_API_KEY=sk-...")
    ));
    ui.println("  2. Launch Claude Code with a provider:");
    for (alias, profile) in alias::ALIASES {
        ui.println(format!("     {:<4} {}", ui.accent(alias), ui.dim(profile)));
    }

    Ok(())
}

/// List all profiles
pub fn list(paths: &Paths, ui: &Ui) -> Result<()> {
    let registry = load_existing_registry(paths)?;

    if registry.profiles.is_empty() {
        ui.warn("No profiles configured.");
        ui.newline();
        ui.println("Create one with:");
        ui.println(format!("  {} add <name>", ui.bold("ccprov")));
        return Ok(());
    }

    let mut table = ui.simple_table();
    table.set_header(vec![
        ui.header_cell(""),
        ui.header_cell("Profile"),
        ui.header_cell("Name"),
        ui.header_cell("Endpoint"),
    ]);

    for (name, profile) in &registry.profiles {
        let is_current = *name == registry.current;
        let endpoint = if profile.base_url.is_empty() {
            ui.colored_cell("(official)", AnsiColor::Cyan)
        } else {
            ui.cell(&profile.base_url)
        };
        table.add_row(vec![
            ui.cell(if is_current { "*" } else { " " }),
            if is_current {
                ui.colored_cell(name, AnsiColor::Green)
            } else {
                ui.cell(name)
            },
            ui.cell(profile.label(name)),
            endpoint,
        ]);
    }

    ui.section("Profiles");
    ui.println(table.to_string());

    if let CurrentProfile::Dangling { name } = registry.current_profile() {
        ui.newline();
        ui.warn(format!("Current profile '{}' not found in config.", name));
    }

    ui.newline();
    ui.println(format!("Use {} to switch profiles.", ui.accent("ccprov use <profile>")));
    Ok(())
}

/// Show the current profile
pub fn current(paths: &Paths, ui: &Ui) -> Result<()> {
    let registry = load_existing_registry(paths)?;

    match registry.current_profile() {
        CurrentProfile::None => {
            ui.println("No profile is currently active.");
            ui.println(format!(
                "Run {} to switch to a profile.",
                ui.accent("ccprov use <profile>")
            ));
        }
        CurrentProfile::Dangling { name } => {
            ui.warn(format!("Current profile '{}' not found in config.", name));
        }
        CurrentProfile::Active { name, profile } => {
            ui.println(format!("{} ({})", ui.accent(name), profile.label(name)));
        }
    }

    Ok(())
}

/// Show detailed information about a profile
pub fn show(paths: &Paths, name: Option<&str>, ui: &Ui) -> Result<()> {
    let registry = load_existing_registry(paths)?;

    let name = match name {
        Some(name) => name,
        None if !registry.current.is_empty() => registry.current.as_str(),
        None => bail!(
            "No profile specified and no current profile set.\nHint: Use 'ccprov show <profile>'."
        ),
    };
    let profile = registry.get(name).map_err(with_hint)?;

    ui.section(format!("Profile: {}", name));
    ui.newline();

    let mut table = ui.simple_table();
    table.add_row(vec![ui.cell("Display name:"), ui.cell(profile.label(name))]);

    let base_url = if profile.base_url.is_empty() {
        ui.colored_cell(OFFICIAL_ENDPOINT, AnsiColor::Cyan)
    } else {
        ui.cell(&profile.base_url)
    };
    table.add_row(vec![ui.cell("Base URL:"), base_url]);
    table.add_row(vec![
        ui.cell("API key:"),
        ui.cell(mask_secret(&expand_env(&profile.api_key))),
    ]);

    let timeout = match profile.timeout() {
        Some(ms) => ui.cell(format!("{}ms", ms)),
        None => ui.cell("(Claude Code default)"),
    };
    table.add_row(vec![ui.cell("Timeout:"), timeout]);

    for role in ModelRole::all() {
        if let Some(model) = profile.model(role) {
            table.add_row(vec![ui.cell(format!("Model ({}):", role)), ui.cell(model)]);
        }
    }

    if registry.current == name {
        table.add_row(vec![
            ui.cell("Status:"),
            ui.colored_cell("current", AnsiColor::Green),
        ]);
    }

    ui.println(table.to_string());
    Ok(())
}

/// Switch to a profile
pub fn use_profile(paths: &Paths, name: &str, ui: &Ui) -> Result<()> {
    ensure_initialized(paths)?;

    let spinner = ui.spinner(format!("Switching to profile '{}'...", name));

    match switch_profile(paths, name) {
        Ok(applied) => {
            ui.spinner_finish_ok(
                &spinner,
                format!("Switched to {} ({})", applied.name, applied.display_name),
            );
            print_applied(&applied, ui);
            Ok(())
        }
        Err(e) => {
            ui.spinner_finish_err(&spinner, format!("Failed to switch to '{}'", name));
            Err(with_hint(e))
        }
    }
}

fn print_applied(applied: &AppliedProfile, ui: &Ui) {
    let resolved = &applied.resolved;
    let mut table = ui.simple_table();

    let base_url = if resolved.is_third_party() {
        ui.cell(&resolved.base_url)
    } else {
        ui.colored_cell(OFFICIAL_ENDPOINT, AnsiColor::Cyan)
    };
    table.add_row(vec![ui.cell("  Base URL:"), base_url]);
    table.add_row(vec![ui.cell("  API key:"), ui.cell(mask_secret(&resolved.api_key))]);
    if let Some(model) = resolved.model(ModelRole::Default) {
        table.add_row(vec![ui.cell("  Model:"), ui.cell(model)]);
    }

    ui.newline();
    ui.println(table.to_string());
}

/// Alias entry point: switch, report, then become Claude Code
pub fn launch_alias(
    paths: &Paths,
    profile: &str,
    args: &[OsString],
    ui: &Ui,
) -> Result<Infallible> {
    ensure_initialized(paths)?;

    alias::dispatch(paths, profile, args, |applied| {
        ui.ok(format!(
            "Switched to {} ({})",
            ui.accent(&applied.name),
            applied.display_name
        ));
        print_applied(applied, ui);
        ui.println("Starting Claude Code...");
        ui.newline();
    })
    .map_err(with_hint)
}

/// Add a new profile from flags, prompting for anything missing
pub fn add(paths: &Paths, args: &AddArgs, ui: &Ui) -> Result<()> {
    validate_profile_name(&args.name)?;

    let mut registry = Registry::load(&paths.registry_file).map_err(with_hint)?;
    if registry.contains(&args.name) {
        bail!(
            "Profile '{}' already exists.\nHint: Use 'ccprov edit' to modify it, or choose a different name.",
            args.name
        );
    }

    let interactive = !args.no_input && std::io::stdin().is_terminal();
    let profile = build_profile(args, interactive)?;

    registry.put(args.name.clone(), profile);
    registry.save(&paths.registry_file).map_err(with_hint)?;

    ui.ok(format!("Profile '{}' added", args.name));
    ui.println(format!(
        "Run {} to start using it.",
        ui.accent(format!("ccprov use {}", args.name))
    ));
    Ok(())
}

fn build_profile(args: &AddArgs, interactive: bool) -> Result<Profile> {
    let prompt = |message: &str, value: &Option<String>, default: &str| -> Result<String> {
        match value {
            Some(v) => Ok(v.trim().to_string()),
            None if interactive => Text::new(message)
                .with_default(default)
                .prompt()
                .map(|s| s.trim().to_string())
                .context("Input cancelled"),
            None => Ok(default.to_string()),
        }
    };

    let display_name = prompt("Display name:", &args.display_name, &args.name)?;
    let base_url = prompt(
        "Base URL (empty for the official API):",
        &args.base_url,
        "",
    )?;
    let api_key = prompt("API key (or ${ENV_VAR} reference):", &args.api_key, "")?;

    let timeout: u64 = match args.timeout_ms {
        Some(t) => t,
        None if interactive => {
            let raw = Text::new("Timeout in ms:")
                .with_default(&DEFAULT_TIMEOUT_MS.to_string())
                .prompt()
                .context("Input cancelled")?;
            raw.trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid timeout: '{}'", raw.trim()))?
        }
        None => DEFAULT_TIMEOUT_MS,
    };
    let timeout_ms = i64::try_from(timeout).context("Timeout is too large")?;

    let models = args
        .models
        .iter()
        .filter(|(_, model)| !model.is_empty())
        .map(|(role, model)| (role.key().to_string(), model.clone()))
        .collect();

    Ok(Profile {
        display_name,
        base_url,
        api_key,
        timeout_ms,
        models,
    })
}

/// Remove a profile
pub fn remove(paths: &Paths, name: &str, ui: &Ui, force: bool) -> Result<()> {
    let mut registry = load_existing_registry(paths)?;
    if !registry.contains(name) {
        return Err(with_hint(CoreError::ProfileNotFound {
            name: name.to_string(),
        }));
    }

    if !force {
        let confirm = Confirm::new(&format!("Are you sure you want to remove profile '{}'?", name))
            .with_default(false)
            .with_help_message("Claude's settings.json is left as it is")
            .prompt()
            .context("Confirmation cancelled")?;

        if !confirm {
            ui.warn("Removal cancelled.");
            return Ok(());
        }
    }

    let removal = registry.remove(name).map_err(with_hint)?;
    registry.save(&paths.registry_file).map_err(with_hint)?;

    if removal.cleared_current {
        ui.note(format!(
            "Profile '{}' was the current profile. No profile is now active.",
            name
        ));
    }
    ui.ok(format!(
        "Removed profile '{}' ({})",
        name,
        removal.profile.label(name)
    ));
    Ok(())
}

/// Open the registry file in the user's editor
pub fn edit(paths: &Paths, ui: &Ui) -> Result<()> {
    if !paths.registry_exists() {
        bail!("Config file not found.\nHint: Run 'ccprov init' first.");
    }

    open_in_editor(&paths.registry_file)?;

    match Registry::load(&paths.registry_file) {
        Ok(registry) => ui.ok(format!(
            "Saved {} ({} profiles)",
            paths.registry_file.display(),
            registry.profiles.len()
        )),
        Err(e) => ui.warn(format!("The config no longer parses: {}", e)),
    }
    Ok(())
}

/// Editor from `$EDITOR`/`$VISUAL`, else the first common one on PATH
fn find_editor() -> Result<String> {
    for var in ["EDITOR", "VISUAL"] {
        if let Ok(editor) = std::env::var(var)
            && !editor.trim().is_empty()
        {
            return Ok(editor);
        }
    }

    ["vim", "nano", "notepad"]
        .into_iter()
        .find(|candidate| which::which(candidate).is_ok())
        .map(str::to_string)
        .context("No editor found.\nHint: Set the $EDITOR environment variable.")
}

fn open_in_editor(path: &Path) -> Result<()> {
    let editor = find_editor()?;

    // $EDITOR may carry arguments, e.g. "code --wait"
    let mut parts = editor.split_whitespace();
    let program = parts.next().context("Empty editor command")?;

    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor))?;

    if !status.success() {
        bail!("Editor exited with non-zero status");
    }
    Ok(())
}

/// Create the shortcut symlinks
pub fn link(paths: &Paths, dir: Option<PathBuf>, ui: &Ui) -> Result<()> {
    let dir = dir.unwrap_or_else(|| paths.link_dir.clone());
    let exe = links::current_exe()?;
    let report = links::create_links(&dir, &exe)?;

    print_link_report(&report, ui);

    let created = report.count(&LinkOutcome::Created);
    let skipped = report.count(&LinkOutcome::AlreadyLinked);
    ui.newline();
    if created > 0 {
        ui.ok(format!("Created {} symlink(s) in {}", created, dir.display()));
    }
    if skipped > 0 {
        ui.println(format!("   Skipped {} existing symlink(s)", skipped));
    }

    if !Paths::is_on_path(&dir) {
        ui.newline();
        ui.note(format!("{} is not in your PATH.", dir.display()));
        ui.println("Add it to your shell config:");
        ui.println(format!(
            "  {}",
            ui.accent(format!("export PATH=\"{}:$PATH\"", dir.display()))
        ));
    }
    Ok(())
}

/// Remove the shortcut symlinks
pub fn unlink(paths: &Paths, dir: Option<PathBuf>, ui: &Ui) -> Result<()> {
    let dir = dir.unwrap_or_else(|| paths.link_dir.clone());
    let exe = links::current_exe()?;
    let report = links::remove_links(&dir, &exe);

    print_link_report(&report, ui);

    let removed = report.count(&LinkOutcome::Removed);
    ui.newline();
    if removed > 0 {
        ui.ok(format!("Removed {} symlink(s) from {}", removed, dir.display()));
    } else if report.count(&LinkOutcome::NotFound) == report.entries.len() {
        ui.println(format!("No symlinks found in {}", dir.display()));
    }
    Ok(())
}

fn print_link_report(report: &LinkReport, ui: &Ui) {
    ui.println(ui.dim(format!("{}:", report.dir.display())));
    for (alias, outcome) in &report.entries {
        let line = match outcome {
            LinkOutcome::Created => format!("{} created", ui.colored(alias, AnsiColor::Green)),
            LinkOutcome::AlreadyLinked => "already exists".to_string(),
            LinkOutcome::Removed => "removed".to_string(),
            LinkOutcome::NotFound => continue,
            LinkOutcome::Skipped(reason) => {
                format!("{} ({}, skipped)", ui.colored("WARNING", AnsiColor::Yellow), reason)
            }
            LinkOutcome::Failed(reason) => {
                format!("{} ({})", ui.colored("ERROR", AnsiColor::Red), reason)
            }
        };
        ui.println(format!("  {:<4} -> {}", alias, line));
    }
}

/// Run diagnostics
pub fn doctor(paths: &Paths, ui: &Ui) -> Result<()> {
    run_doctor(paths, ui);
    Ok(())
}
