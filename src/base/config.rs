//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use super::types::{Res, Void};

/// Default Koji hub endpoint.
fn default_koji_hub_url() -> String {
    "https://brewhub.engineering.redhat.com/brewhub".to_string()
}

/// Default CA bundle used to trust the Koji hub.
fn default_koji_server_ca() -> String {
    "/etc/pki/brew/legacy.crt".to_string()
}

/// What the rpm listing does when the build system lookup fails.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LookupFailurePolicy {
    /// Let the error escape the handler; the user only sees the acknowledgement.
    Silent,
    /// Tell the user the lookup failed.
    #[default]
    Report,
}

/// Configuration for the art-bot application.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared configuration values.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Configuration values, behind `Config`.
#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// Slack app token used for socket mode (`SLACK_APP_TOKEN`).
    pub slack_app_token: String,
    /// Slack bot token used for API calls (`SLACK_BOT_TOKEN`).
    pub slack_bot_token: String,
    /// Koji hub XML-RPC endpoint (`KOJI_HUB_URL`).
    #[serde(default = "default_koji_hub_url")]
    pub koji_hub_url: String,
    /// PEM file with the CA that signs the hub certificate (`KOJI_SERVER_CA`).
    /// An empty value means the system roots alone are trusted.
    #[serde(default = "default_koji_server_ca")]
    pub koji_server_ca: String,
    /// Behavior when a build lookup fails (`LOOKUP_FAILURE_POLICY`): `silent` or `report`.
    #[serde(default)]
    pub lookup_failure_policy: LookupFailurePolicy,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            slack_app_token: String::new(),
            slack_bot_token: String::new(),
            koji_hub_url: default_koji_hub_url(),
            koji_server_ca: default_koji_server_ca(),
            lookup_failure_policy: LookupFailurePolicy::default(),
        }
    }
}

impl Config {
    /// Load the configuration from the environment and an optional TOML file.
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("ART_BOT"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Checks values that deserialize fine but cannot work at runtime.
    pub fn validate(&self) -> Void {
        if self.slack_app_token.trim().is_empty() {
            return Err(anyhow::anyhow!("Slack app token must not be empty."));
        }

        if self.slack_bot_token.trim().is_empty() {
            return Err(anyhow::anyhow!("Slack bot token must not be empty."));
        }

        if !self.koji_hub_url.starts_with("https://") && !self.koji_hub_url.starts_with("http://") {
            return Err(anyhow::anyhow!("Koji hub URL must be an http(s) URL."));
        }

        Ok(())
    }

    /// The CA file to trust for the hub, if one is configured.
    pub fn koji_server_ca_path(&self) -> Option<&std::path::Path> {
        let path = self.koji_server_ca.trim();
        (!path.is_empty()).then(|| std::path::Path::new(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(inner: ConfigInner) -> Config {
        Config { inner: Arc::new(inner) }
    }

    fn valid_inner() -> ConfigInner {
        ConfigInner {
            slack_app_token: "xapp-test".to_string(),
            slack_bot_token: "xoxb-test".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = config(valid_inner());

        assert!(config.validate().is_ok());
        assert_eq!(config.koji_hub_url, "https://brewhub.engineering.redhat.com/brewhub");
        assert_eq!(config.koji_server_ca_path(), Some(std::path::Path::new("/etc/pki/brew/legacy.crt")));
        assert_eq!(config.lookup_failure_policy, LookupFailurePolicy::Report);
    }

    #[test]
    fn test_missing_tokens_rejected() {
        let missing_app = config(ConfigInner {
            slack_app_token: " ".to_string(),
            ..valid_inner()
        });
        assert!(missing_app.validate().is_err());

        let missing_bot = config(ConfigInner {
            slack_bot_token: String::new(),
            ..valid_inner()
        });
        assert!(missing_bot.validate().is_err());
    }

    #[test]
    fn test_bad_hub_url_rejected() {
        let config = config(ConfigInner {
            koji_hub_url: "brewhub".to_string(),
            ..valid_inner()
        });

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_ca_disables_custom_trust() {
        let config = config(ConfigInner {
            koji_server_ca: "".to_string(),
            ..valid_inner()
        });

        assert_eq!(config.koji_server_ca_path(), None);
    }

    #[test]
    fn test_policy_deserializes_lowercase() {
        let policy: LookupFailurePolicy = serde_json::from_str("\"silent\"").unwrap();
        assert_eq!(policy, LookupFailurePolicy::Silent);

        let policy: LookupFailurePolicy = serde_json::from_str("\"report\"").unwrap();
        assert_eq!(policy, LookupFailurePolicy::Report);
    }
}
