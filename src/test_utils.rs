//! Test utilities shared across test modules
//!
//! This module provides common helper functions for testing, avoiding duplication
//! across multiple test suites.

use crate::paths::Paths;
use tempfile::TempDir;

/// Create a Paths struct for testing using a temporary directory
///
/// This mirrors the real ~/.ccprov/, ~/.claude/ and ~/.local/bin layout
/// inside the temp directory.
pub fn setup_test_paths(temp_dir: &TempDir) -> Paths {
    Paths::from_dirs(
        temp_dir.path().join(".ccprov"),
        temp_dir.path().join(".claude"),
        temp_dir.path().join("bin"),
    )
}
