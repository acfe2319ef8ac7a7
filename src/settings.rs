//! Applying a provider profile to Claude Code's `settings.json`.
//!
//! Claude Code reads provider configuration from the `env` object of its
//! settings file. This module rewrites only the variables listed in
//! [`MANAGED_VARS`]; every other top-level key and every other `env` entry is
//! carried through untouched.

use chrono::Utc;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::expand::expand_env;
use crate::paths::Paths;
use crate::registry::{ModelRole, Profile};
use crate::store::{self, Sensitivity};

pub const ENV_KEY: &str = "env";

pub const BASE_URL_VAR: &str = "ANTHROPIC_BASE_URL";
pub const AUTH_TOKEN_VAR: &str = "ANTHROPIC_AUTH_TOKEN";
pub const TIMEOUT_VAR: &str = "API_TIMEOUT_MS";
pub const DISABLE_TRAFFIC_VAR: &str = "CLAUDE_CODE_DISABLE_NONESSENTIAL_TRAFFIC";

/// Every `env` variable this tool may write or delete
pub const MANAGED_VARS: [&str; 9] = [
    BASE_URL_VAR,
    AUTH_TOKEN_VAR,
    TIMEOUT_VAR,
    "ANTHROPIC_MODEL",
    "ANTHROPIC_SMALL_FAST_MODEL",
    "ANTHROPIC_DEFAULT_OPUS_MODEL",
    "ANTHROPIC_DEFAULT_SONNET_MODEL",
    "ANTHROPIC_DEFAULT_HAIKU_MODEL",
    DISABLE_TRAFFIC_VAR,
];

/// Number of settings backups to keep
const MAX_BACKUPS: usize = 10;
const BACKUP_PREFIX: &str = "settings";

/// Claude's settings document. Unknown keys round-trip in their original order.
pub type Settings = Map<String, Value>;

/// `env` variable a model role is written to
pub fn model_var(role: ModelRole) -> &'static str {
    match role {
        ModelRole::Default => "ANTHROPIC_MODEL",
        ModelRole::SmallFast => "ANTHROPIC_SMALL_FAST_MODEL",
        ModelRole::Opus => "ANTHROPIC_DEFAULT_OPUS_MODEL",
        ModelRole::Sonnet => "ANTHROPIC_DEFAULT_SONNET_MODEL",
        ModelRole::Haiku => "ANTHROPIC_DEFAULT_HAIKU_MODEL",
    }
}

/// A profile with `${VAR}` placeholders resolved against the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedProfile {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub models: Vec<(ModelRole, String)>,
}

impl ResolvedProfile {
    pub fn resolve(profile: &Profile) -> Self {
        Self::resolve_with(profile, expand_env)
    }

    pub fn resolve_with<F>(profile: &Profile, expand: F) -> Self
    where
        F: Fn(&str) -> String,
    {
        let models = ModelRole::all()
            .into_iter()
            .filter_map(|role| profile.model(role).map(|m| (role, m.to_string())))
            .collect();

        Self {
            base_url: expand(&profile.base_url),
            api_key: expand(&profile.api_key),
            timeout_ms: profile.timeout().unwrap_or(0),
            models,
        }
    }

    pub fn model(&self, role: ModelRole) -> Option<&str> {
        self.models
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, m)| m.as_str())
    }

    /// A non-empty base URL means a third-party endpoint
    pub fn is_third_party(&self) -> bool {
        !self.base_url.is_empty()
    }
}

/// Read settings.json, or an empty document if it doesn't exist
pub fn load(path: &Path) -> CoreResult<Settings> {
    store::load(path)
}

pub fn save(path: &Path, settings: &Settings) -> CoreResult<()> {
    store::save(path, settings, Sensitivity::Shared)
}

/// Merge `profile` into the settings file at `paths.claude_settings`.
///
/// An existing file is backed up to `paths.backups_dir` first.
pub fn apply_profile(paths: &Paths, profile: &ResolvedProfile) -> CoreResult<()> {
    let mut settings = load(&paths.claude_settings)?;

    if paths.claude_settings.exists() {
        backup_settings(&paths.claude_settings, &paths.backups_dir)?;
    }

    apply_to_settings(&mut settings, profile);
    save(&paths.claude_settings, &settings)?;

    debug!(
        path = %paths.claude_settings.display(),
        third_party = profile.is_third_party(),
        "applied profile to settings"
    );
    Ok(())
}

/// Merge into the `env` object of `settings`, creating it if needed
pub fn apply_to_settings(settings: &mut Settings, profile: &ResolvedProfile) {
    let env = settings
        .entry(ENV_KEY)
        .or_insert_with(|| Value::Object(Map::new()));

    if !env.is_object() {
        debug!(found = %type_name(env), "settings env is not an object, replacing");
        *env = Value::Object(Map::new());
    }

    if let Value::Object(env) = env {
        apply_to_env(env, profile);
    }
}

/// Project the profile onto the `env` variables.
///
/// Empty fields delete their variable. The timeout is only ever set.
pub fn apply_to_env(env: &mut Map<String, Value>, profile: &ResolvedProfile) {
    if profile.is_third_party() {
        set_var(env, BASE_URL_VAR, &profile.base_url);
        set_var(env, DISABLE_TRAFFIC_VAR, "1");
    } else {
        env.shift_remove(BASE_URL_VAR);
        env.shift_remove(DISABLE_TRAFFIC_VAR);
    }

    set_or_erase(env, AUTH_TOKEN_VAR, Some(profile.api_key.as_str()));

    if profile.timeout_ms > 0 {
        set_var(env, TIMEOUT_VAR, &profile.timeout_ms.to_string());
    }

    for role in ModelRole::all() {
        set_or_erase(env, model_var(role), profile.model(role));
    }
}

fn set_var(env: &mut Map<String, Value>, name: &str, value: &str) {
    env.insert(name.to_string(), Value::String(value.to_string()));
}

fn set_or_erase(env: &mut Map<String, Value>, name: &str, value: Option<&str>) {
    match value.filter(|v| !v.is_empty()) {
        Some(v) => set_var(env, name, v),
        None => {
            env.shift_remove(name);
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Copy the current settings file into the backups directory, then rotate
fn backup_settings(path: &Path, backups_dir: &Path) -> CoreResult<()> {
    fs::create_dir_all(backups_dir).map_err(|e| CoreError::io(backups_dir, e))?;

    let backup_path = unique_backup_path(backups_dir);
    fs::copy(path, &backup_path).map_err(|e| CoreError::io(&backup_path, e))?;

    debug!(backup = %backup_path.display(), "backed up settings");
    cleanup_old_backups(backups_dir)
}

/// `settings.<timestamp>.bak`, with a counter if that name is taken.
///
/// Names sort in creation order, which [`cleanup_old_backups`] relies on.
fn unique_backup_path(backups_dir: &Path) -> PathBuf {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S%3f").to_string();
    let mut path = backups_dir.join(format!("{}.{}.bak", BACKUP_PREFIX, timestamp));

    let mut counter = 1;
    while path.exists() {
        path = backups_dir.join(format!("{}.{}_{:02}.bak", BACKUP_PREFIX, timestamp, counter));
        counter += 1;
    }
    path
}

fn cleanup_old_backups(backups_dir: &Path) -> CoreResult<()> {
    let mut backups: Vec<_> = fs::read_dir(backups_dir)
        .map_err(|e| CoreError::io(backups_dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(BACKUP_PREFIX) && n.ends_with(".bak"))
        })
        .collect();

    if backups.len() <= MAX_BACKUPS {
        return Ok(());
    }

    // Timestamped names sort oldest first
    backups.sort_by_key(|b| b.file_name());

    let to_remove = backups.len() - MAX_BACKUPS;
    for entry in backups.iter().take(to_remove) {
        let path = entry.path();
        fs::remove_file(&path).map_err(|e| CoreError::io(&path, e))?;
    }

    Ok(())
}
