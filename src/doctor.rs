//! Diagnostic tool for ccprov.
//!
//! This module implements the `ccprov doctor` command, which checks the system
//! for common issues:
//! - Existence of required directories.
//! - Readability of the registry and Claude's settings.json.
//! - Presence of the `claude` executable and the alias links.
//! - Unresolved `${VAR}` placeholders in the current profile.
//!
//! It reports issues to the user with a pass/fail/warn status.

use anstyle::AnsiColor;
use std::env;

use crate::alias::ALIASES;
use crate::links::{self, LinkStatus};
use crate::paths::Paths;
use crate::registry::{CurrentProfile, Registry};
use crate::settings::{self, ENV_KEY, ResolvedProfile};
use crate::switch::TARGET_BINARY;
use crate::ui::Ui;

/// Run the doctor diagnostics.
///
/// Returns the number of checks that reported issues.
pub fn run_doctor(paths: &Paths, ui: &Ui) -> usize {
    ui.section("ccprov Doctor");
    ui.newline();

    let mut failed = 0;

    // 1. Directories
    failed += check_step(ui, "Directories", || {
        let mut ok = true;
        if paths.base_dir.exists() {
            ui.println(format!(
                "  {} Base directory exists: {}",
                ui.icon_ok(),
                paths.base_dir.display()
            ));
        } else {
            ui.println(format!(
                "  {} Base directory missing: {} (run 'ccprov init')",
                ui.icon_err(),
                paths.base_dir.display()
            ));
            ok = false;
        }

        if paths.claude_dir.exists() {
            ui.println(format!(
                "  {} Claude directory exists: {}",
                ui.icon_ok(),
                paths.claude_dir.display()
            ));
        } else {
            // Created on the first switch
            ui.println(format!(
                "  {} Claude directory missing: {}",
                ui.icon_warn(),
                paths.claude_dir.display()
            ));
        }
        ok
    });

    // 2. Registry
    let mut registry = None;
    failed += check_step(ui, "Config File", || {
        if !paths.registry_exists() {
            ui.println(format!(
                "  {} Config file missing: {}",
                ui.icon_err(),
                paths.registry_file.display()
            ));
            return false;
        }

        match Registry::load(&paths.registry_file) {
            Ok(loaded) => {
                ui.println(format!(
                    "  {} Config file readable ({} profiles)",
                    ui.icon_ok(),
                    loaded.profiles.len()
                ));
                let ok = match loaded.current_profile() {
                    CurrentProfile::None => {
                        ui.println(format!("  {} No current profile set", ui.icon_info()));
                        true
                    }
                    CurrentProfile::Active { name, .. } => {
                        ui.println(format!("  {} Current profile: {}", ui.icon_info(), name));
                        true
                    }
                    CurrentProfile::Dangling { name } => {
                        ui.println(format!(
                            "  {} Current profile '{}' does not exist",
                            ui.icon_err(),
                            name
                        ));
                        false
                    }
                };
                registry = Some(loaded);
                ok
            }
            Err(e) => {
                ui.println(format!("  {} Config file corrupt: {}", ui.icon_err(), e));
                false
            }
        }
    });

    // 3. Claude settings
    failed += check_step(ui, "Claude Settings", || {
        if !paths.claude_settings.exists() {
            ui.println(format!(
                "  {} {} is missing (written on the first switch)",
                ui.icon_warn(),
                paths.claude_settings.display()
            ));
            return true;
        }

        match settings::load(&paths.claude_settings) {
            Ok(doc) => {
                ui.println(format!("  {} settings.json parses", ui.icon_ok()));
                if !doc.get(ENV_KEY).is_none_or(|env| env.is_object()) {
                    ui.println(format!(
                        "  {} \"env\" is not an object and will be replaced on the next switch",
                        ui.icon_warn()
                    ));
                }
                true
            }
            Err(e) => {
                ui.println(format!("  {} settings.json is invalid: {}", ui.icon_err(), e));
                false
            }
        }
    });

    // 4. Claude Code executable
    failed += check_step(ui, "Claude Code", || match which::which(TARGET_BINARY) {
        Ok(path) => {
            ui.println(format!("  {} Found: {}", ui.icon_ok(), path.display()));
            true
        }
        Err(_) => {
            ui.println(format!(
                "  {} '{}' not found in PATH",
                ui.icon_err(),
                TARGET_BINARY
            ));
            false
        }
    });

    // 5. Alias links
    failed += check_step(ui, "Shortcuts", || {
        let exe = match links::current_exe() {
            Ok(exe) => exe,
            Err(e) => {
                ui.println(format!("  {} {:#}", ui.icon_warn(), e));
                return true;
            }
        };

        let mut linked = 0;
        for (alias, profile) in ALIASES {
            let link = links::link_path(&paths.link_dir, alias);
            match LinkStatus::detect(&link, &exe) {
                LinkStatus::Ours => {
                    linked += 1;
                    ui.println(format!("  {} {} -> {}", ui.icon_ok(), alias, profile));
                }
                LinkStatus::Missing => {
                    ui.println(format!("  {} {} not linked", ui.icon_info(), alias));
                }
                LinkStatus::NotSymlink => {
                    ui.println(format!(
                        "  {} {} exists but is not a symlink",
                        ui.icon_warn(),
                        alias
                    ));
                }
                LinkStatus::Elsewhere { target } => {
                    ui.println(format!(
                        "  {} {} points to {}",
                        ui.icon_warn(),
                        alias,
                        target.display()
                    ));
                }
            }
        }

        if linked > 0 && !Paths::is_on_path(&paths.link_dir) {
            ui.println(format!(
                "  {} {} is not in PATH",
                ui.icon_warn(),
                paths.link_dir.display()
            ));
        }
        true
    });

    // 6. Environment
    failed += check_step(ui, "Environment", || {
        match env::var("EDITOR") {
            Ok(e) => ui.println(format!("  {} EDITOR set to: {}", ui.icon_ok(), e)),
            Err(_) => ui.println(format!(
                "  {} EDITOR not set (using system default)",
                ui.icon_info()
            )),
        }

        let Some(registry) = &registry else {
            return true;
        };
        let CurrentProfile::Active { name, profile } = registry.current_profile() else {
            return true;
        };

        let resolved = ResolvedProfile::resolve(profile);
        let unresolved: Vec<&str> = [
            ("base_url", &resolved.base_url),
            ("api_key", &resolved.api_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.contains("${"))
        .map(|(field, _)| field)
        .collect();

        if unresolved.is_empty() {
            ui.println(format!(
                "  {} Placeholders in '{}' resolve",
                ui.icon_ok(),
                name
            ));
        } else {
            ui.println(format!(
                "  {} Unset variables in '{}': {}",
                ui.icon_warn(),
                name,
                unresolved.join(", ")
            ));
        }
        true
    });

    if failed == 0 {
        ui.ok("No issues found");
    } else {
        ui.warn(format!("{} check(s) reported issues", failed));
    }
    failed
}

/// Print a titled check and return 1 if it failed
fn check_step<F>(ui: &Ui, name: &str, check_fn: F) -> usize
where
    F: FnOnce() -> bool,
{
    ui.println(ui.bold(format!("Checking {}...", name)));
    let success = check_fn();
    if !success {
        ui.println(ui.colored("  Issues detected!", AnsiColor::Red));
    }
    ui.newline();
    usize::from(!success)
}
