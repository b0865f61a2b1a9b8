// Session lifecycle.
// A session is created on successful profile verification, persisted
// opaquely, and destroyed on explicit disconnect. The token is never
// logged; Debug output redacts it.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheStore, COURSES_KEY, TODO_KEY, paths};
use crate::canvas::{CanvasClient, Profile};
use crate::error::{HomeroomError, Result};

/// Verified credential plus the profile it was verified against.
#[derive(Clone, Serialize, Deserialize)]
pub struct Session {
    pub base_url: String,
    pub token: String,
    pub profile: Profile,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("profile", &self.profile)
            .finish()
    }
}

impl Session {
    /// Verify a credential against the LMS and create a session from it.
    /// No session exists unless the profile call succeeds.
    pub async fn connect(
        relay_url: &str,
        raw_base_url: &str,
        token: &str,
    ) -> Result<(Self, CanvasClient)> {
        let base_url = normalize_base_url(raw_base_url)?;
        let token = token.trim();
        if token.is_empty() {
            return Err(HomeroomError::Validation("token must not be empty".into()));
        }

        let client = CanvasClient::new(relay_url, &base_url, token)?;
        let profile = client.get_profile().await?;
        tracing::info!(%base_url, user = profile.display_name(), "session verified");

        let session = Self {
            base_url,
            token: token.to_string(),
            profile,
        };
        Ok((session, client))
    }

    /// Rebuild a client for a persisted session.
    pub fn client(&self, relay_url: &str) -> Result<CanvasClient> {
        CanvasClient::new(relay_url, &self.base_url, &self.token)
    }

    /// Persist the session record. Best-effort, like the cache.
    pub fn save(&self, dir: &Path) {
        if let Err(err) = write_json(&paths::session_path(dir), self) {
            tracing::debug!(%err, "session write failed, skipping");
        }
    }

    /// Load a previously persisted session, if any.
    pub fn load(dir: &Path) -> Option<Self> {
        let contents = fs::read_to_string(paths::session_path(dir)).ok()?;
        serde_json::from_str(&contents).ok()
    }
}

/// Destroy the session and the cached resources tied to it.
/// Done/snooze marks are a local study record and survive disconnect.
pub fn disconnect(dir: &Path, cache: &CacheStore) {
    let path = paths::session_path(dir);
    if path.exists() {
        let _ = fs::remove_file(path);
    }
    cache.delete(COURSES_KEY);
    cache.delete(TODO_KEY);
}

/// Normalize a user-entered base URL: prepend https:// when the scheme is
/// missing, trim trailing slashes, and reject anything unparseable.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(HomeroomError::Validation("base URL must not be empty".into()));
    }

    let lower = trimmed.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let normalized = with_scheme.trim_end_matches('/').to_string();

    reqwest::Url::parse(&normalized)
        .map_err(|_| HomeroomError::Validation(format!("not a valid URL: {normalized}")))?;
    Ok(normalized)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;

    // Write atomically via temp file
    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_session() -> Session {
        Session {
            base_url: "https://school.instructure.com".to_string(),
            token: "sekrit".to_string(),
            profile: Profile {
                id: Some(1),
                name: Some("Sam".to_string()),
                primary_email: None,
                avatar_url: None,
            },
        }
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("school.instructure.com").unwrap(),
            "https://school.instructure.com"
        );
        assert_eq!(
            normalize_base_url("https://school.instructure.com///").unwrap(),
            "https://school.instructure.com"
        );
        assert!(matches!(
            normalize_base_url("   "),
            Err(HomeroomError::Validation(_))
        ));
        assert!(matches!(
            normalize_base_url("https://not a host"),
            Err(HomeroomError::Validation(_))
        ));
    }

    #[test]
    fn test_save_load_disconnect() {
        let temp = TempDir::new().unwrap();
        let cache = CacheStore::new(temp.path());

        assert!(Session::load(temp.path()).is_none());

        sample_session().save(temp.path());
        let loaded = Session::load(temp.path()).unwrap();
        assert_eq!(loaded.base_url, "https://school.instructure.com");
        assert_eq!(loaded.token, "sekrit");

        disconnect(temp.path(), &cache);
        assert!(Session::load(temp.path()).is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let formatted = format!("{:?}", sample_session());
        assert!(!formatted.contains("sekrit"));
        assert!(formatted.contains("<redacted>"));
    }
}
