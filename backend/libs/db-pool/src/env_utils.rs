//! Environment variable parsing utilities
//!
//! Helpers used by configuration loaders so that a missing variable falls
//! back to a default while a present but malformed one is reported.

use std::str::FromStr;

/// Parse an environment variable with a default fallback.
///
/// Malformed values also fall back to the default.
pub fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse an environment variable, returning `None` if missing or invalid
pub fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Parse a required environment variable
pub fn parse_env_required<T: FromStr>(key: &str) -> Result<T, String> {
    std::env::var(key)
        .map_err(|_| format!("Environment variable {} not found", key))?
        .parse()
        .map_err(|_| format!("Failed to parse environment variable {}", key))
}

/// Parse an optional environment variable strictly.
///
/// Missing or blank → `default`; present but unparsable → error.
pub fn parse_env_or_default<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| format!("Invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}
