//! Alias symlink management.
//!
//! `ccprov link` creates one symlink per alias (see [`crate::alias::ALIASES`])
//! pointing at the running executable; `ccprov unlink` removes the ones that
//! still point at it.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::alias::ALIASES;

/// State of an alias path on disk
#[derive(Debug, PartialEq, Eq)]
pub enum LinkStatus {
    Missing,
    /// Something that is not a symlink is in the way
    NotSymlink,
    /// Symlink to the given executable
    Ours,
    /// Symlink pointing somewhere else
    Elsewhere { target: PathBuf },
}

impl LinkStatus {
    pub fn detect(link: &Path, exe: &Path) -> Self {
        match fs::symlink_metadata(link) {
            Err(_) => Self::Missing,
            Ok(meta) if !meta.file_type().is_symlink() => Self::NotSymlink,
            Ok(_) => match fs::read_link(link) {
                Ok(target) if target == exe => Self::Ours,
                Ok(target) => Self::Elsewhere { target },
                Err(_) => Self::Elsewhere {
                    target: PathBuf::from("?"),
                },
            },
        }
    }
}

/// Outcome for a single alias
#[derive(Debug, PartialEq, Eq)]
pub enum LinkOutcome {
    Created,
    AlreadyLinked,
    Removed,
    NotFound,
    /// Left alone, with the reason
    Skipped(String),
    Failed(String),
}

/// Per-alias results of a link/unlink run
#[derive(Debug)]
pub struct LinkReport {
    pub dir: PathBuf,
    pub entries: Vec<(&'static str, LinkOutcome)>,
}

impl LinkReport {
    pub fn count(&self, outcome: &LinkOutcome) -> usize {
        self.entries.iter().filter(|(_, o)| o == outcome).count()
    }
}

/// Resolved path of the running executable
pub fn current_exe() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to get executable path")?;
    fs::canonicalize(&exe)
        .with_context(|| format!("Failed to resolve executable path: {}", exe.display()))
}

/// Path of an alias inside `dir`
pub fn link_path(dir: &Path, alias: &str) -> PathBuf {
    if cfg!(windows) {
        dir.join(format!("{alias}.exe"))
    } else {
        dir.join(alias)
    }
}

/// Create a symlink to `exe` for every alias in `dir`.
///
/// Existing entries that aren't already ours are replaced.
pub fn create_links(dir: &Path, exe: &Path) -> Result<LinkReport> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    let mut entries = Vec::new();
    for (alias, _) in ALIASES {
        let link = link_path(dir, alias);
        let outcome = match LinkStatus::detect(&link, exe) {
            LinkStatus::Ours => LinkOutcome::AlreadyLinked,
            LinkStatus::Missing => make_symlink(exe, &link),
            LinkStatus::NotSymlink | LinkStatus::Elsewhere { .. } => match fs::remove_file(&link) {
                Ok(()) => make_symlink(exe, &link),
                Err(e) => LinkOutcome::Failed(format!("failed to remove existing: {e}")),
            },
        };
        debug!(alias, link = %link.display(), ?outcome, "link");
        entries.push((*alias, outcome));
    }

    Ok(LinkReport {
        dir: dir.to_path_buf(),
        entries,
    })
}

/// Remove alias symlinks in `dir` that point at `exe`
pub fn remove_links(dir: &Path, exe: &Path) -> LinkReport {
    let mut entries = Vec::new();
    for (alias, _) in ALIASES {
        let link = link_path(dir, alias);
        let outcome = match LinkStatus::detect(&link, exe) {
            LinkStatus::Missing => LinkOutcome::NotFound,
            LinkStatus::NotSymlink => LinkOutcome::Skipped("not a symlink".to_string()),
            LinkStatus::Elsewhere { target } => {
                LinkOutcome::Skipped(format!("points to {}", target.display()))
            }
            LinkStatus::Ours => match fs::remove_file(&link) {
                Ok(()) => LinkOutcome::Removed,
                Err(e) => LinkOutcome::Failed(e.to_string()),
            },
        };
        debug!(alias, link = %link.display(), ?outcome, "unlink");
        entries.push((*alias, outcome));
    }

    LinkReport {
        dir: dir.to_path_buf(),
        entries,
    }
}

fn make_symlink(target: &Path, link: &Path) -> LinkOutcome {
    #[cfg(unix)]
    let result = std::os::unix::fs::symlink(target, link);

    #[cfg(windows)]
    let result = std::os::windows::fs::symlink_file(target, link);

    match result {
        Ok(()) => LinkOutcome::Created,
        Err(e) if cfg!(windows) => {
            LinkOutcome::Failed(format!("{e} (symlinks may require admin rights on Windows)"))
        }
        Err(e) => LinkOutcome::Failed(e.to_string()),
    }
}
