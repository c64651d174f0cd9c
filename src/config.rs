//! Application configuration.
//!
//! Centralizes all configuration constants used throughout the application.
//! Deployment settings are read from the bundled `assets/config.toml`
//! (loaded at compile time using `include_str!`) into [`AppConfig`].

use serde::Deserialize;

use crate::core::error::ConfigError;

// =============================================================================
// Application Metadata
// =============================================================================

/// Application name displayed in the header.
pub const APP_NAME: &str = "Cloud Workspace";

/// Bundled deployment configuration.
pub const BUNDLED_CONFIG: &str = include_str!("../assets/config.toml");

// =============================================================================
// Network Configuration
// =============================================================================

/// Fetch request timeout in milliseconds.
pub const FETCH_TIMEOUT_MS: i32 = 30_000;

/// Default REST API prefix.
pub const DEFAULT_API_PATH: &str = "/restapi";

// =============================================================================
// Authentication
// =============================================================================

/// Delay between health-check polls while the login window is open.
pub const AUTH_POLL_INTERVAL_MS: u32 = 1_000;

/// Give up waiting for the login window after this long.
pub const AUTH_TIMEOUT_MS: u32 = 60_000;

// =============================================================================
// Listing
// =============================================================================

/// Number of entries requested per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 40;

// =============================================================================
// Credentials
// =============================================================================

/// Default lifetime of an issued access token.
pub const DEFAULT_TOKEN_DURATION_DAYS: u32 = 30;

/// Default number of days an archived object stays restored.
pub const DEFAULT_RESTORE_DAYS: u32 = 7;

// =============================================================================
// UI Configuration
// =============================================================================

/// Icon theme selection.
///
/// Available themes:
/// - `Bootstrap` - Familiar, slightly bolder (default)
/// - `Lucide` - Minimal, thin strokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(dead_code)]
pub enum IconTheme {
    #[default]
    Bootstrap,
    Lucide,
}

/// Current icon theme used throughout the application.
pub const ICON_THEME: IconTheme = IconTheme::Bootstrap;

// =============================================================================
// Deployment Configuration
// =============================================================================

/// How stored page markers survive folder navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageHistoryPolicy {
    /// Returning to an ancestor forgets the pages of deeper folders.
    #[default]
    Truncate,
    /// Every visited folder keeps its pages until the storage changes.
    Preserve,
}

/// How archive state gates download and edit of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveGatePolicy {
    /// Archived objects are readable only while restored.
    #[default]
    RequireRestore,
    /// Archive state is shown as a badge but does not restrict actions.
    LabelOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Prefix of every REST call.
    pub api_path: String,
    /// Relative path returning the bearer token for the session.
    pub token_path: Option<String>,
    /// Page opened in a popup when the session expired.
    pub login_path: String,
    /// Relative path polled while the popup is open.
    pub health_check_path: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            api_path: DEFAULT_API_PATH.to_string(),
            token_path: Some("route/token".to_string()),
            login_path: "/restapi/saml/login".to_string(),
            health_check_path: "app/info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub poll_interval_ms: u32,
    pub timeout_ms: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: AUTH_POLL_INTERVAL_MS,
            timeout_ms: AUTH_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListingSettings {
    pub page_size: usize,
    /// Remember page markers per folder.
    pub keep_pages_history: bool,
    pub page_history_policy: PageHistoryPolicy,
    pub archive_gate: ArchiveGatePolicy,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            keep_pages_history: true,
            page_history_policy: PageHistoryPolicy::default(),
            archive_gate: ArchiveGatePolicy::default(),
        }
    }
}

/// Templates of the generated CLI commands.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CliSettings {
    pub configure_template: String,
    pub pip_install_template: String,
    pub launch_command: String,
    /// Path of the CLI package on the console host.
    pub pipe_cli_path: String,
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            configure_template:
                "pipe configure --auth-token {user.jwt.token} --api {API} --timezone local --proxy pac"
                    .to_string(),
            pip_install_template: "pip install --trusted-host {HOST} {PIPE_CLI_URL}".to_string(),
            launch_command: "pipe".to_string(),
            pipe_cli_path: "/pipe-cli/pipe-cli.tar.gz".to_string(),
        }
    }
}

/// Deployment configuration of the console.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiSettings,
    pub auth: AuthSettings,
    pub listing: ListingSettings,
    pub cli: CliSettings,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            auth: AuthSettings::default(),
            listing: ListingSettings::default(),
            cli: CliSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Configuration bundled with the build.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_toml(BUNDLED_CONFIG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_config_parses() {
        let config = AppConfig::bundled().unwrap();
        assert_eq!(config.api.api_path, DEFAULT_API_PATH);
        assert!(config.listing.page_size > 0);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            log_level = "debug"

            [listing]
            page_history_policy = "preserve"
            archive_gate = "label-only"
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(
            config.listing.page_history_policy,
            PageHistoryPolicy::Preserve
        );
        assert_eq!(config.listing.archive_gate, ArchiveGatePolicy::LabelOnly);
        assert_eq!(config.listing.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.auth, AuthSettings::default());
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let err = AppConfig::from_toml("[listing]\npage_history_policy = \"sometimes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
