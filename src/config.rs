//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot name for identification in logs.
    pub name: String,
    /// Session idle timeout (sessions are pruned after this duration).
    pub session_idle_timeout: Duration,
    /// How often the idle-session sweep runs.
    pub prune_interval: Duration,
    /// Conversational language understanding settings, if any.
    pub clu: Option<CluConfig>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "booking-bot".to_string(),
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            prune_interval: Duration::from_secs(600),        // 10 minutes
            clu: None,
        }
    }
}

impl BotConfig {
    /// Load configuration from the environment.
    ///
    /// Unset variables fall back to defaults. A half-configured CLU block is
    /// an error rather than a silent downgrade.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            name: non_empty_var(&lookup, "BOOKING_BOT_NAME").unwrap_or(defaults.name),
            session_idle_timeout: env_secs(&lookup, "BOOKING_BOT_SESSION_IDLE_SECS")?
                .unwrap_or(defaults.session_idle_timeout),
            prune_interval: env_secs(&lookup, "BOOKING_BOT_PRUNE_INTERVAL_SECS")?
                .unwrap_or(defaults.prune_interval),
            clu: CluConfig::from_lookup(&lookup)?,
        })
    }
}

/// Settings for the conversation-analysis endpoint.
#[derive(Debug, Clone)]
pub struct CluConfig {
    pub api_key: SecretString,
    /// Host name only, e.g. `my-language.cognitiveservices.azure.com`.
    pub host_name: String,
    pub project_name: String,
    pub deployment_name: String,
}

impl CluConfig {
    /// Read CLU settings. Returns `Ok(None)` when no key is set at all.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = non_empty_var(&lookup, "CLU_API_KEY") else {
            return Ok(None);
        };
        Ok(Some(Self {
            api_key: SecretString::from(api_key),
            host_name: required_var(&lookup, "CLU_API_HOST_NAME")?,
            project_name: required_var(&lookup, "CLU_PROJECT_NAME")?,
            deployment_name: required_var(&lookup, "CLU_DEPLOYMENT_NAME")?,
        }))
    }
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn non_empty_var(lookup: Lookup<'_>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_var(lookup: Lookup<'_>, key: &str) -> Result<String, ConfigError> {
    non_empty_var(lookup, key).ok_or_else(|| ConfigError::MissingRequired {
        key: key.to_string(),
        hint: "CLU_API_KEY is set, so every CLU_* setting must be provided".to_string(),
    })
}

/// A whole number of seconds, at least one.
fn env_secs(lookup: Lookup<'_>, key: &str) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = non_empty_var(lookup, key) else {
        return Ok(None);
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".to_string(),
        }),
        Ok(secs) => Ok(Some(Duration::from_secs(secs))),
        Err(e) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?} is not a number of seconds: {e}"),
        }),
    }
}
