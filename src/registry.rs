//! The provider registry stored in `~/.ccprov/config.json`.
//!
//! The registry holds every named provider profile plus the name of the one
//! currently applied to Claude Code. It is loaded whole, mutated in memory and
//! written back whole through [`crate::store`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::store::{self, Sensitivity};

/// Model roles a profile can override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelRole {
    Default,
    SmallFast,
    Opus,
    Sonnet,
    Haiku,
}

impl ModelRole {
    pub fn all() -> [ModelRole; 5] {
        [
            ModelRole::Default,
            ModelRole::SmallFast,
            ModelRole::Opus,
            ModelRole::Sonnet,
            ModelRole::Haiku,
        ]
    }

    /// Key used in the registry's `models` map
    pub fn key(&self) -> &'static str {
        match self {
            ModelRole::Default => "default",
            ModelRole::SmallFast => "small_fast",
            ModelRole::Opus => "opus",
            ModelRole::Sonnet => "sonnet",
            ModelRole::Haiku => "haiku",
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ModelRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "default" => Ok(ModelRole::Default),
            "small_fast" => Ok(ModelRole::SmallFast),
            "opus" => Ok(ModelRole::Opus),
            "sonnet" => Ok(ModelRole::Sonnet),
            "haiku" => Ok(ModelRole::Haiku),
            _ => Err(format!("Unknown model role: {}", s)),
        }
    }
}

/// A single provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub display_name: String,

    /// Empty means Claude Code's built-in endpoint
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Request timeout forwarded to Claude Code; 0 or below leaves it alone
    #[serde(default, skip_serializing_if = "is_unset")]
    pub timeout_ms: i64,

    /// Model role -> model id. Unknown keys are kept but never applied.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub models: BTreeMap<String, String>,
}

fn is_unset(v: &i64) -> bool {
    *v <= 0
}

impl Profile {
    /// Model override for a role, if set and non-empty
    pub fn model(&self, role: ModelRole) -> Option<&str> {
        self.models
            .get(role.key())
            .map(String::as_str)
            .filter(|m| !m.is_empty())
    }

    /// Timeout to apply, if one is set
    pub fn timeout(&self) -> Option<u64> {
        u64::try_from(self.timeout_ms).ok().filter(|t| *t > 0)
    }

    /// Display name, falling back to the registry key
    pub fn label<'a>(&'a self, name: &'a str) -> &'a str {
        if self.display_name.is_empty() {
            name
        } else {
            &self.display_name
        }
    }
}

/// What `current` refers to
#[derive(Debug, PartialEq, Eq)]
pub enum CurrentProfile<'a> {
    /// No profile has been selected
    None,
    /// `current` names an existing profile
    Active { name: &'a str, profile: &'a Profile },
    /// `current` names a profile that no longer exists
    Dangling { name: &'a str },
}

/// Result of [`Registry::remove`]
#[derive(Debug)]
pub struct Removal {
    pub profile: Profile,
    /// The removed profile was current, so `current` is now empty
    pub cleared_current: bool,
}

/// Stored in ~/.ccprov/config.json
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    /// Name of the active profile, empty when none
    #[serde(default)]
    pub current: String,

    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Registry {
    /// Read the registry, returning an empty one if the file doesn't exist
    pub fn load(path: &Path) -> CoreResult<Self> {
        store::load(path)
    }

    /// Atomically write the whole registry
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        store::save(path, self, Sensitivity::Private)
    }

    pub fn get(&self, name: &str) -> CoreResult<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| CoreError::not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// Insert or overwrite a profile
    pub fn put(&mut self, name: impl Into<String>, profile: Profile) {
        self.profiles.insert(name.into(), profile);
    }

    /// Remove a profile, clearing `current` if it pointed at it
    pub fn remove(&mut self, name: &str) -> CoreResult<Removal> {
        let profile = self
            .profiles
            .remove(name)
            .ok_or_else(|| CoreError::not_found(name))?;

        let cleared_current = self.current == name;
        if cleared_current {
            self.current.clear();
        }

        Ok(Removal {
            profile,
            cleared_current,
        })
    }

    /// Record the active profile. Callers validate the name first.
    pub fn set_current(&mut self, name: impl Into<String>) {
        self.current = name.into();
    }

    pub fn current_profile(&self) -> CurrentProfile<'_> {
        if self.current.is_empty() {
            return CurrentProfile::None;
        }
        match self.profiles.get(&self.current) {
            Some(profile) => CurrentProfile::Active {
                name: &self.current,
                profile,
            },
            None => CurrentProfile::Dangling {
                name: &self.current,
            },
        }
    }

    /// Registry written by `ccprov init`
    pub fn with_defaults() -> Self {
        fn models(pairs: &[(ModelRole, &str)]) -> BTreeMap<String, String> {
            pairs
                .iter()
                .map(|(role, id)| (role.key().to_string(), id.to_string()))
                .collect()
        }

        let mut registry = Registry::default();
        registry.put(
            "claude",
            Profile {
                display_name: "Claude".to_string(),
                base_url: "${ANTHROPIC_BASE_URL}".to_string(),
                api_key: "${ANTHROPIC_API_KEY}".to_string(),
                timeout_ms: 120_000,
                models: BTreeMap::new(),
            },
        );
        registry.put(
            "deepseek",
            Profile {
                display_name: "DeepSeek".to_string(),
                base_url: "https://api.deepseek.com/anthropic".to_string(),
                api_key: "${DEEPSEEK_API_KEY}".to_string(),
                timeout_ms: 600_000,
                models: models(&[
                    (ModelRole::Default, "deepseek-chat"),
                    (ModelRole::SmallFast, "deepseek-chat"),
                ]),
            },
        );
        registry.put(
            "glm",
            Profile {
                display_name: "GLM (Zhipu)".to_string(),
                base_url: "https://open.bigmodel.cn/api/anthropic".to_string(),
                api_key: "${GLM_API_KEY}".to_string(),
                timeout_ms: 3_000_000,
                models: models(&[
                    (ModelRole::Opus, "glm-4.6"),
                    (ModelRole::Sonnet, "glm-4.6"),
                    (ModelRole::Haiku, "glm-4.5-air"),
                ]),
            },
        );
        let minimax: Vec<_> = ModelRole::all()
            .into_iter()
            .map(|role| (role, "MiniMax-M2"))
            .collect();
        registry.put(
            "minimax",
            Profile {
                display_name: "MiniMax".to_string(),
                base_url: "https://api.minimaxi.com/anthropic".to_string(),
                api_key: "${MINIMAX_API_KEY}".to_string(),
                timeout_ms: 3_000_000,
                models: models(&minimax),
            },
        );
        registry.set_current("claude");
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn profile(url: &str) -> Profile {
        Profile {
            display_name: "Test".to_string(),
            base_url: url.to_string(),
            api_key: "sk-test".to_string(),
            ..Profile::default()
        }
    }

    #[test]
    fn test_load_nonexistent_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let registry = Registry::load(&temp_dir.path().join("config.json")).unwrap();
        assert!(registry.current.is_empty());
        assert!(registry.profiles.is_empty());
    }

    #[test]
    fn test_put_get_and_overwrite() {
        let mut registry = Registry::default();
        registry.put("work", profile("https://a"));
        registry.put("work", profile("https://b"));

        assert_eq!(registry.get("work").unwrap().base_url, "https://b");
        assert!(matches!(
            registry.get("missing"),
            Err(CoreError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn test_remove_current_clears_it() {
        let mut registry = Registry::default();
        registry.put("work", profile(""));
        registry.put("home", profile(""));
        registry.set_current("work");

        let removal = registry.remove("home").unwrap();
        assert!(!removal.cleared_current);
        assert_eq!(registry.current, "work");

        let removal = registry.remove("work").unwrap();
        assert!(removal.cleared_current);
        assert_eq!(removal.profile, profile(""));
        assert!(registry.current.is_empty());

        assert!(matches!(
            registry.remove("work"),
            Err(CoreError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn test_current_profile_states() {
        let mut registry = Registry::default();
        assert_eq!(registry.current_profile(), CurrentProfile::None);

        registry.put("work", profile(""));
        registry.set_current("work");
        assert!(matches!(
            registry.current_profile(),
            CurrentProfile::Active { name: "work", .. }
        ));

        registry.set_current("ghost");
        assert_eq!(
            registry.current_profile(),
            CurrentProfile::Dangling { name: "ghost" }
        );
    }

    #[test]
    fn test_dangling_current_survives_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"current": "ghost", "profiles": {}}"#).unwrap();

        let registry = Registry::load(&path).unwrap();
        assert_eq!(registry.current, "ghost");
        assert_eq!(
            registry.current_profile(),
            CurrentProfile::Dangling { name: "ghost" }
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        let registry = Registry::with_defaults();
        registry.save(&path).unwrap();
        let loaded = Registry::load(&path).unwrap();

        assert_eq!(loaded, registry);
        assert_eq!(loaded.current, "claude");
        assert_eq!(
            loaded.profiles.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["claude", "deepseek", "glm", "minimax"]
        );
    }

    #[test]
    fn test_profile_serialization_omits_empty_fields() {
        let json = serde_json::to_value(profile("")).unwrap();
        assert!(json.get("timeout_ms").is_none());
        assert!(json.get("models").is_none());
        assert_eq!(json["api_key"], "sk-test");
    }

    #[test]
    fn test_hand_edited_registry_with_trailing_commas() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
  "current": "glm",
  "profiles": {
    "glm": {
      "display_name": "GLM, Inc}",
      "base_url": "https://open.bigmodel.cn/api/anthropic",
      "api_key": "${GLM_API_KEY}",
      "models": { "opus": "glm-4.6", },
    },
  },
}"#,
        )
        .unwrap();

        let registry = Registry::load(&path).unwrap();
        let glm = registry.get("glm").unwrap();
        assert_eq!(glm.display_name, "GLM, Inc}");
        assert_eq!(glm.model(ModelRole::Opus), Some("glm-4.6"));
        assert_eq!(glm.timeout_ms, 0);
    }

    #[test]
    fn test_negative_timeout_is_treated_as_unset() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"profiles": {"slow": {"base_url": "https://x", "timeout_ms": -1}}}"#,
        )
        .unwrap();

        let registry = Registry::load(&path).unwrap();
        let slow = registry.get("slow").unwrap();
        assert_eq!(slow.timeout_ms, -1);
        assert_eq!(slow.timeout(), None);

        let json = serde_json::to_value(slow).unwrap();
        assert!(json.get("timeout_ms").is_none());
    }

    #[test]
    fn test_model_lookup_ignores_empty_values() {
        let mut p = profile("");
        p.models.insert("sonnet".to_string(), String::new());
        assert_eq!(p.model(ModelRole::Sonnet), None);
        assert_eq!(p.model(ModelRole::Haiku), None);
    }

    #[test]
    fn test_model_role_from_str() {
        assert_eq!("small-fast".parse::<ModelRole>(), Ok(ModelRole::SmallFast));
        assert_eq!("OPUS".parse::<ModelRole>(), Ok(ModelRole::Opus));
        assert!("gpt".parse::<ModelRole>().is_err());
    }

    #[test]
    fn test_label_falls_back_to_name() {
        let p = Profile::default();
        assert_eq!(p.label("work"), "work");
    }
}
