//! Atomic load/save of JSON documents.
//!
//! Both the provider registry and Claude's `settings.json` go through this
//! module. Saves never truncate the destination in place: content is written
//! to a sibling temp file, flushed, then renamed over the target, so readers
//! see either the old document or the new one.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::repair::strip_trailing_commas;

/// How protective the on-disk permissions of a document should be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    /// Contains secrets: directory 0700, file 0600
    Private,
    /// Owned by another tool: directory 0755, file 0644
    Shared,
}

impl Sensitivity {
    #[cfg(unix)]
    fn dir_mode(self) -> u32 {
        match self {
            Self::Private => 0o700,
            Self::Shared => 0o755,
        }
    }

    #[cfg(unix)]
    fn file_mode(self) -> u32 {
        match self {
            Self::Private => 0o600,
            Self::Shared => 0o644,
        }
    }
}

/// Read a document, returning `T::default()` if the file does not exist.
///
/// Trailing commas are repaired before parsing. An empty file is treated the
/// same as a missing one.
pub fn load<T>(path: &Path) -> CoreResult<T>
where
    T: DeserializeOwned + Default,
{
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "document missing, using default");
            return Ok(T::default());
        }
        Err(e) => return Err(CoreError::io(path, e)),
    };

    let content = String::from_utf8(bytes).map_err(|e| CoreError::parse(path, e))?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    if content.trim().is_empty() {
        return Ok(T::default());
    }

    let repaired = strip_trailing_commas(content);
    serde_json::from_str(&repaired).map_err(|e| CoreError::parse(path, e))
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
///
/// An existing file keeps its permission bits. New files get the mode for
/// `sensitivity`.
pub fn save<T>(path: &Path, value: &T, sensitivity: Sensitivity) -> CoreResult<()>
where
    T: Serialize + ?Sized,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent, sensitivity)?;
    }

    let mut content = serde_json::to_string_pretty(value)
        .map_err(|e| CoreError::io(path, std::io::Error::other(e)))?;
    content.push('\n');

    let temp_path = temp_path_for(path);
    if let Err(e) = write_temp(&temp_path, content.as_bytes(), file_mode(path, sensitivity)) {
        let _ = fs::remove_file(&temp_path);
        return Err(CoreError::io(&temp_path, e));
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(CoreError::io(path, e));
    }

    debug!(path = %path.display(), bytes = content.len(), "document saved");
    Ok(())
}

/// Sibling temp file used during [`save`]: `settings.json` -> `settings.json.tmp`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn ensure_dir(dir: &Path, sensitivity: Sensitivity) -> CoreResult<()> {
    if dir.is_dir() {
        return Ok(());
    }

    fs::create_dir_all(dir).map_err(|e| CoreError::io(dir, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(sensitivity.dir_mode()))
            .map_err(|e| CoreError::io(dir, e))?;
    }
    #[cfg(not(unix))]
    let _ = sensitivity;

    Ok(())
}

/// Permission bits for the replacement file: the destination's own, if any
#[cfg(unix)]
fn file_mode(path: &Path, sensitivity: Sensitivity) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o777)
        .unwrap_or_else(|_| sensitivity.file_mode());
    Some(mode)
}

#[cfg(not(unix))]
fn file_mode(_path: &Path, _sensitivity: Sensitivity) -> Option<u32> {
    None
}

fn write_temp(temp_path: &Path, bytes: &[u8], mode: Option<u32>) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.create(true).truncate(true).write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if let Some(mode) = mode {
            options.mode(mode);
        }
    }

    let mut file = options.open(temp_path)?;

    // The umask applies to the create mode, so set the bits explicitly
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            file.set_permissions(fs::Permissions::from_mode(mode))?;
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Doc {
        #[serde(default)]
        name: String,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    }

    fn sample() -> Doc {
        Doc {
            name: "work".to_string(),
            tags: BTreeMap::from([("k".to_string(), "v".to_string())]),
        }
    }

    #[test]
    fn test_load_missing_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let doc: Doc = load(&temp_dir.path().join("nope.json")).unwrap();
        assert_eq!(doc, Doc::default());
    }

    #[test]
    fn test_load_empty_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.json");
        fs::write(&path, "  \n").unwrap();
        let doc: Doc = load(&path).unwrap();
        assert_eq!(doc, Doc::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/doc.json");

        save(&path, &sample(), Sensitivity::Shared).unwrap();
        let loaded: Doc = load(&path).unwrap();

        assert_eq!(loaded, sample());
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_load_repairs_trailing_commas() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");
        fs::write(&path, "\u{feff}{\"name\": \"x\", \"tags\": {\"a\": \"b\",},}").unwrap();

        let doc: Doc = load(&path).unwrap();
        assert_eq!(doc.name, "x");
        assert_eq!(doc.tags.get("a").map(String::as_str), Some("b"));
    }

    #[test]
    fn test_load_malformed_is_parse_error_with_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load::<Doc>(&path).unwrap_err();
        match err {
            CoreError::Parse { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_temp_write_leaves_original_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");
        fs::write(&path, "{\"name\": \"original\"}").unwrap();

        // A directory in the temp file's place makes the write step fail.
        fs::create_dir(temp_path_for(&path)).unwrap();

        let err = save(&path, &sample(), Sensitivity::Shared).unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"name\": \"original\"}");
    }

    #[cfg(unix)]
    #[test]
    fn test_private_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("private");
        let path = dir.join("config.json");
        save(&path, &sample(), Sensitivity::Private).unwrap();

        let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        let dir_mode = fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        assert_eq!(dir_mode, 0o700);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_keeps_existing_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        save(&path, &sample(), Sensitivity::Shared).unwrap();

        let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_new_file_uses_sensitivity_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        save(&path, &sample(), Sensitivity::Shared).unwrap();

        let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o644);
    }

    #[test]
    fn test_load_invalid_utf8_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("latin1.json");
        fs::write(&path, b"{\"name\": \"caf\xe9\"}").unwrap();

        let err = load::<Doc>(&path).unwrap_err();
        match err {
            CoreError::Parse { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let path = Path::new("/home/u/.claude/settings.json");
        assert_eq!(
            temp_path_for(path),
            PathBuf::from("/home/u/.claude/settings.json.tmp")
        );
    }
}
