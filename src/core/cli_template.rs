//! CLI setup commands built from configurable templates.
//!
//! Templates contain `{name}` placeholders such as `{user.jwt.token}`,
//! `{API}` or `{LAUNCH_COMMAND}`. Known placeholders are substituted,
//! unknown ones are kept verbatim so a misconfigured template stays
//! readable.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use regex::{Captures, Regex};
use serde::Deserialize;

use crate::config::CliSettings;

static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_.\-]+)\}").ok());

pub const TOKEN_PLACEHOLDER: &str = "user.jwt.token";
pub const API_PLACEHOLDER: &str = "API";
pub const HOST_PLACEHOLDER: &str = "HOST";
pub const PIPE_CLI_URL_PLACEHOLDER: &str = "PIPE_CLI_URL";
pub const LAUNCH_COMMAND_PLACEHOLDER: &str = "LAUNCH_COMMAND";

/// Replace every known `{name}` in `template`.
pub fn render(template: &str, values: &BTreeMap<&str, String>) -> String {
    let Some(regex) = PLACEHOLDER.as_ref() else {
        return template.to_string();
    };
    regex
        .replace_all(template, |caps: &Captures<'_>| {
            values
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Values available to the CLI templates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CliContext {
    /// Access token, `None` until one was generated.
    pub token: Option<String>,
    /// Absolute REST API URL.
    pub api_url: String,
    /// Download URL of the CLI package.
    pub pipe_cli_url: String,
}

impl CliContext {
    fn values<'a>(&self, settings: &'a CliSettings) -> BTreeMap<&'a str, String> {
        let mut values = BTreeMap::new();
        if let Some(token) = &self.token {
            values.insert(TOKEN_PLACEHOLDER, token.clone());
        }
        values.insert(API_PLACEHOLDER, self.api_url.clone());
        values.insert(HOST_PLACEHOLDER, host_of(&self.pipe_cli_url).to_string());
        values.insert(PIPE_CLI_URL_PLACEHOLDER, self.pipe_cli_url.clone());
        values.insert(LAUNCH_COMMAND_PLACEHOLDER, settings.launch_command.clone());
        values
    }

    /// `pipe configure ...` with the token and API URL filled in.
    pub fn configure_command(&self, settings: &CliSettings) -> String {
        render(&settings.configure_template, &self.values(settings))
    }

    /// `pip install ...` for the CLI package.
    pub fn pip_install_command(&self, settings: &CliSettings) -> String {
        render(&settings.pip_install_template, &self.values(settings))
    }
}

/// Host part of a URL (`https://host:8080/path` gives `host`).
pub fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let authority = authority.rsplit('@').next().unwrap_or(authority);
    authority.split(':').next().unwrap_or(authority)
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Expiration (`exp` claim, seconds since the epoch) of a JWT.
pub fn jwt_expiration(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice::<Claims>(&bytes).ok()?.exp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_placeholders_are_kept() {
        let values = BTreeMap::from([("API", "https://x/restapi/".to_string())]);
        assert_eq!(
            render("cmd --api {API} --other {UNKNOWN} {", &values),
            "cmd --api https://x/restapi/ --other {UNKNOWN} {"
        );
    }

    #[test]
    fn test_configure_command() {
        let context = CliContext {
            token: Some("abc.def.ghi".to_string()),
            api_url: "https://cloud.example.com/restapi/".to_string(),
            pipe_cli_url: "https://cloud.example.com:8443/pipe-cli.tar.gz".to_string(),
        };
        let settings = CliSettings::default();
        assert_eq!(
            context.configure_command(&settings),
            "pipe configure --auth-token abc.def.ghi --api https://cloud.example.com/restapi/ \
             --timezone local --proxy pac"
        );
        assert_eq!(
            context.pip_install_command(&settings),
            "pip install --trusted-host cloud.example.com \
             https://cloud.example.com:8443/pipe-cli.tar.gz"
        );
    }

    #[test]
    fn test_missing_token_stays_visible() {
        let command = CliContext::default().configure_command(&CliSettings::default());
        assert!(command.contains("{user.jwt.token}"));
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://user@host.io:80/a?b"), "host.io");
        assert_eq!(host_of("host.io/path"), "host.io");
        assert_eq!(host_of(""), "");
    }

    #[test]
    fn test_jwt_expiration() {
        let claims = URL_SAFE_NO_PAD.encode(br#"{"sub":"alice","exp":1700000000}"#);
        let token = format!("eyJhbGciOiJIUzI1NiJ9.{claims}.signature");
        assert_eq!(jwt_expiration(&token), Some(1_700_000_000));
        assert_eq!(jwt_expiration("not-a-token"), None);
        assert_eq!(jwt_expiration("a.%%%.c"), None);
    }
}
