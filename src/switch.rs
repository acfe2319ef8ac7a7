//! Profile switching logic.
//!
//! Switching is the core operation of `ccprov`:
//! - Look the profile up in the registry.
//! - Resolve `${VAR}` placeholders in its endpoint and key.
//! - Merge it into Claude's settings.json.
//! - Record it as the current profile.
//!
//! [`exec_target`] then optionally replaces this process with Claude Code.

use std::convert::Infallible;
use std::ffi::OsString;
use std::process::Command;
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::paths::Paths;
use crate::registry::Registry;
use crate::settings::{self, ResolvedProfile};

/// Name of the Claude Code executable
pub const TARGET_BINARY: &str = "claude";

/// What a successful switch applied, for display
#[derive(Debug, Clone)]
pub struct AppliedProfile {
    pub name: String,
    pub display_name: String,
    pub resolved: ResolvedProfile,
}

/// Switch to a specific profile.
///
/// Settings are written before the registry, so a failure while saving the
/// registry leaves Claude configured but `current` stale.
pub fn switch_profile(paths: &Paths, name: &str) -> CoreResult<AppliedProfile> {
    let mut registry = Registry::load(&paths.registry_file)?;
    let profile = registry.get(name)?;

    let resolved = ResolvedProfile::resolve(profile);
    let display_name = profile.label(name).to_string();

    settings::apply_profile(paths, &resolved)?;

    registry.set_current(name);
    registry.save(&paths.registry_file)?;

    info!(profile = name, "switched profile");
    Ok(AppliedProfile {
        name: name.to_string(),
        display_name,
        resolved,
    })
}

/// Replace the current process with Claude Code, forwarding `args`.
///
/// Only returns on failure. The caller's profile switch is not undone.
pub fn exec_target(args: &[OsString]) -> CoreResult<Infallible> {
    let binary = which::which(TARGET_BINARY).map_err(|_| CoreError::ExecutableNotFound {
        name: TARGET_BINARY.to_string(),
    })?;
    debug!(binary = %binary.display(), args = args.len(), "launching target");

    let mut command = Command::new(&binary);
    command.args(args);

    replace_process(command, &binary)
}

#[cfg(unix)]
fn replace_process(mut command: Command, binary: &std::path::Path) -> CoreResult<Infallible> {
    use std::os::unix::process::CommandExt;

    // exec only returns on error
    let err = command.arg0(TARGET_BINARY).exec();
    Err(CoreError::io(binary, err))
}

#[cfg(not(unix))]
fn replace_process(mut command: Command, binary: &std::path::Path) -> CoreResult<Infallible> {
    let status = command.status().map_err(|e| CoreError::io(binary, e))?;
    std::process::exit(status.code().unwrap_or(1));
}
