use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::{Path, PathBuf};

/// Overrides the ccprov base directory (default `~/.ccprov`)
pub const HOME_ENV: &str = "CCPROV_HOME";
/// Overrides Claude's config directory (default `~/.claude`)
pub const CLAUDE_DIR_ENV: &str = "CLAUDE_CONFIG_DIR";

/// All computed paths used by ccprov
#[derive(Debug, Clone)]
pub struct Paths {
    /// ~/.ccprov
    pub base_dir: PathBuf,
    /// ~/.ccprov/config.json
    pub registry_file: PathBuf,
    /// ~/.ccprov/backups
    pub backups_dir: PathBuf,
    /// ~/.claude
    pub claude_dir: PathBuf,
    /// ~/.claude/settings.json
    pub claude_settings: PathBuf,
    /// ~/.local/bin, where alias links go by default
    pub link_dir: PathBuf,
}

impl Paths {
    pub fn new() -> Result<Self> {
        let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;
        let home = base_dirs.home_dir();

        let base_dir = env_dir(HOME_ENV).unwrap_or_else(|| home.join(".ccprov"));
        let claude_dir = env_dir(CLAUDE_DIR_ENV).unwrap_or_else(|| home.join(".claude"));

        Ok(Self::from_dirs(base_dir, claude_dir, home.join(".local").join("bin")))
    }

    /// Build the layout from explicit roots
    pub fn from_dirs(base_dir: PathBuf, claude_dir: PathBuf, link_dir: PathBuf) -> Self {
        Self {
            registry_file: base_dir.join("config.json"),
            backups_dir: base_dir.join("backups"),
            claude_settings: claude_dir.join("settings.json"),
            base_dir,
            claude_dir,
            link_dir,
        }
    }

    /// Check if the registry file exists
    pub fn registry_exists(&self) -> bool {
        self.registry_file.exists()
    }

    /// Check if a directory is listed in `PATH`
    pub fn is_on_path(dir: &Path) -> bool {
        std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).any(|p| p == dir))
            .unwrap_or(false)
    }
}

fn env_dir(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
