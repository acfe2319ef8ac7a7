//! Command-line definition.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::registry::ModelRole;
use crate::ui::ColorMode;

#[derive(Debug, Parser)]
#[command(name = "ccprov")]
#[command(about = "Claude Code Provider Switcher - point Claude Code at different API providers")]
#[command(version)]
#[command(after_help = "Shortcuts created by 'ccprov init': ds, glm, mm, ccc")]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// When to use colors: always, auto, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the config file with default providers and the shortcut links
    Init {
        /// Don't create shortcut symlinks
        #[arg(long)]
        no_link: bool,
    },

    /// List all configured profiles
    #[command(visible_alias = "ls")]
    List,

    /// Show the current profile
    Current,

    /// Show profile details (defaults to the current profile)
    Show {
        name: Option<String>,
    },

    /// Switch Claude Code to a profile
    Use {
        name: String,
    },

    /// Add a new profile
    Add(AddArgs),

    /// Remove a profile
    #[command(visible_aliases = ["rm", "delete"])]
    Remove {
        name: String,

        /// Don't ask for confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Open the config file in your editor
    Edit,

    /// Create shortcut symlinks (ds, glm, mm, ccc)
    Link {
        /// Directory for the links (default ~/.local/bin)
        dir: Option<PathBuf>,
    },

    /// Remove shortcut symlinks
    Unlink {
        /// Directory holding the links (default ~/.local/bin)
        dir: Option<PathBuf>,
    },

    /// Run diagnostics on the ccprov setup
    Doctor,

    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct AddArgs {
    /// Name of the profile to create
    pub name: String,

    #[arg(long)]
    pub display_name: Option<String>,

    /// Provider endpoint; empty for the official API
    #[arg(long)]
    pub base_url: Option<String>,

    /// API key, or a ${ENV_VAR} reference
    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Model override as ROLE=MODEL (roles: default, small_fast, opus, sonnet, haiku)
    #[arg(long = "model", value_name = "ROLE=MODEL", value_parser = parse_model_arg)]
    pub models: Vec<(ModelRole, String)>,

    /// Don't prompt for missing fields
    #[arg(long)]
    pub no_input: bool,
}

fn parse_model_arg(s: &str) -> Result<(ModelRole, String), String> {
    let (role, model) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ROLE=MODEL, got '{}'", s))?;
    let role = role.trim().parse::<ModelRole>()?;
    Ok((role, model.trim().to_string()))
}
