// Cache path utilities.
// Constructs filesystem paths for cached resources and persisted session state.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Get the base cache directory (~/.cache/homeroom on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "homeroom").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Path to a cached resource file for the given key.
pub fn resource_path(dir: &std::path::Path, key: &str) -> PathBuf {
    dir.join(format!("{}.json", sanitize_name(key)))
}

/// Path to the persisted session (auth) record.
pub fn session_path(dir: &std::path::Path) -> PathBuf {
    dir.join("session.json")
}

/// Path to the done/snooze marks file.
pub fn marks_path(dir: &std::path::Path) -> PathBuf {
    dir.join("marks.json")
}

/// Sanitize a key for use in filesystem paths.
/// Replaces problematic characters with underscores.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}
