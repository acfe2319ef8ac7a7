//! Alias invocations: `ds`, `glm`, `mm` and `ccc`.
//!
//! Each alias is a symlink to the `ccprov` executable. When the program is
//! started under one of these names it switches to the bound profile and then
//! becomes Claude Code, instead of parsing its own command line.

use std::convert::Infallible;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use tracing::debug;

use crate::error::CoreResult;
use crate::paths::Paths;
use crate::switch::{AppliedProfile, exec_target, switch_profile};

/// Invocation name -> profile name
pub const ALIASES: &[(&str, &str)] = &[
    ("ccc", "claude"),
    ("ds", "deepseek"),
    ("glm", "glm"),
    ("mm", "minimax"),
];

/// Profile bound to an alias name
pub fn profile_for(alias: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|(name, _)| *name == alias)
        .map(|(_, profile)| *profile)
}

/// Resolve the program's own `argv[0]` to a profile name.
///
/// Only the file name is considered, with a trailing `.exe` ignored.
pub fn resolve(argv0: &OsStr) -> Option<&'static str> {
    let file_name = Path::new(argv0).file_name()?.to_str()?;
    let stem = file_name.strip_suffix(".exe").unwrap_or(file_name);
    profile_for(stem)
}

/// Switch to `profile`, then replace this process with Claude Code.
///
/// `on_switched` runs between the two steps so the caller can report the
/// switch. A launch failure is returned with the switch already committed.
pub fn dispatch<F>(
    paths: &Paths,
    profile: &str,
    args: &[OsString],
    on_switched: F,
) -> CoreResult<Infallible>
where
    F: FnOnce(&AppliedProfile),
{
    debug!(profile, "alias dispatch");
    let applied = switch_profile(paths, profile)?;
    on_switched(&applied);
    exec_target(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::registry::{Profile, Registry};
    use crate::test_utils::setup_test_paths;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_known_aliases() {
        assert_eq!(resolve(OsStr::new("ds")), Some("deepseek"));
        assert_eq!(resolve(OsStr::new("/home/u/.local/bin/glm")), Some("glm"));
        assert_eq!(resolve(OsStr::new("mm.exe")), Some("minimax"));
        assert_eq!(resolve(OsStr::new("ccc")), Some("claude"));
    }

    #[test]
    fn test_resolve_declines_other_names() {
        assert_eq!(resolve(OsStr::new("ccprov")), None);
        assert_eq!(resolve(OsStr::new("/usr/bin/cc")), None);
        assert_eq!(resolve(OsStr::new("")), None);
        assert_eq!(resolve(OsStr::new("DS")), None);
    }

    #[test]
    fn test_alias_names_are_unique() {
        for (i, (name, _)) in ALIASES.iter().enumerate() {
            assert!(ALIASES[i + 1..].iter().all(|(other, _)| other != name));
        }
    }

    #[test]
    fn test_dispatch_unknown_profile_does_not_launch() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let mut called = false;

        let result = dispatch(&paths, "deepseek", &[], |_| called = true);

        assert!(matches!(result, Err(CoreError::ProfileNotFound { .. })));
        assert!(!called);
    }

    #[test]
    #[serial]
    fn test_dispatch_commits_switch_when_launch_fails() {
        let temp_dir = TempDir::new().unwrap();
        let paths = setup_test_paths(&temp_dir);
        let mut registry = Registry::default();
        registry.put(
            "deepseek",
            Profile {
                base_url: "https://api.deepseek.com/anthropic".to_string(),
                api_key: "sk-ds".to_string(),
                ..Profile::default()
            },
        );
        registry.save(&paths.registry_file).unwrap();

        let original = std::env::var_os("PATH");
        unsafe { std::env::set_var("PATH", temp_dir.path()) };
        let mut switched_to = None;
        let result = dispatch(&paths, "deepseek", &[OsString::from("--help")], |applied| {
            switched_to = Some(applied.name.clone())
        });
        if let Some(path) = original {
            unsafe { std::env::set_var("PATH", path) };
        }

        assert!(matches!(result, Err(CoreError::ExecutableNotFound { .. })));
        assert_eq!(switched_to.as_deref(), Some("deepseek"));
        let registry = Registry::load(&paths.registry_file).unwrap();
        assert_eq!(registry.current, "deepseek");
        assert!(paths.claude_settings.exists());
    }
}
