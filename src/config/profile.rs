//! Runtime profile selection.

use serde::Serialize;

/// Monitor-specific profile variable, checked first.
pub const MONITOR_ENV_VAR: &str = "MONITOR_ENV";

/// Generic environment-name variable, checked second.
pub const APP_ENV_VAR: &str = "APP_ENV";

/// Profile used when neither variable is set.
pub const DEFAULT_PROFILE: &str = "production";

/// Named configuration variant selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Production,
    Development,
}

impl Profile {
    /// Parse a raw profile string.
    ///
    /// Matching is case-insensitive but otherwise exact. Any value other than
    /// `development` selects [`Profile::Production`], padded input included.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("development") {
            Profile::Development
        } else {
            Profile::Production
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Production => "production",
            Profile::Development => "development",
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read the raw profile string using `lookup` for variable access.
///
/// `MONITOR_ENV` wins over `APP_ENV`; unset or empty variables are skipped.
pub fn profile_source<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    [MONITOR_ENV_VAR, APP_ENV_VAR]
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
}

/// Read the raw profile string from the process environment.
pub fn profile_source_from_env() -> String {
    profile_source(|name| std::env::var(name).ok())
}

// =============================================================================
// Tests
// =============================================================================
