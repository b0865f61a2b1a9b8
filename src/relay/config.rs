// Relay configuration.
// Read from the environment, with defaults matching the hosted setup.

/// Pattern a target base URL must match exactly: an https host under the
/// trusted LMS domain.
pub const DEFAULT_BASE_PATTERN: &str = r"^https://[a-z0-9.-]+\.instructure\.com$";

/// Upstream path prefix the relay will forward.
pub const API_PREFIX: &str = "api/v1/";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address the relay listens on.
    pub bind_addr: String,
    /// Case-insensitive regex the `base` query parameter must match.
    pub base_pattern: String,
    /// Required prefix for the `path` query parameter.
    pub api_prefix: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            base_pattern: DEFAULT_BASE_PATTERN.to_string(),
            api_prefix: API_PREFIX.to_string(),
        }
    }
}

impl RelayConfig {
    /// Build a config from `RELAY_ADDR` and `RELAY_BASE_PATTERN`,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("RELAY_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(pattern) = std::env::var("RELAY_BASE_PATTERN") {
            config.base_pattern = pattern;
        }
        config
    }
}
