//! Configuration types.
//!
//! Read once at startup from the environment. The NLU connection settings
//! live next to their client in `intent::luis::LuisConfig`.

use std::time::Duration;

use crate::error::ConfigError;
use crate::pipeline::{DispatchPolicy, MessageFilter};

/// Channel the bot listens in when `RESPONDER_CHANNEL` is unset.
pub const DEFAULT_CHANNEL: &str = "bot-training";

/// Responder configuration.
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    /// Exact (case-sensitive) name of the channel to listen in.
    pub channel_name: String,
    /// Command prefix. Setting it turns prefix gating on.
    pub prefix: Option<String>,
    /// Threshold table used to pick replies.
    pub policy: DispatchPolicy,
    /// Upper bound on one classification call.
    pub classify_timeout: Duration,
    /// How long shutdown waits for in-flight messages before aborting them.
    pub shutdown_grace: Duration,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            channel_name: DEFAULT_CHANNEL.to_string(),
            prefix: None,
            policy: DispatchPolicy::default_rules(),
            classify_timeout: Duration::from_secs(10),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl ResponderConfig {
    /// Build config from `RESPONDER_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let channel_name = non_empty("RESPONDER_CHANNEL").unwrap_or(defaults.channel_name);
        let prefix = non_empty("RESPONDER_PREFIX").map(|p| p.trim().to_string());

        let policy = match non_empty("RESPONDER_RULES") {
            Some(raw) => DispatchPolicy::from_json(&raw)?,
            None => defaults.policy,
        };

        let classify_timeout = match non_empty("RESPONDER_CLASSIFY_TIMEOUT_SECS") {
            Some(raw) => parse_secs("RESPONDER_CLASSIFY_TIMEOUT_SECS", &raw)?,
            None => defaults.classify_timeout,
        };
        let shutdown_grace = match non_empty("RESPONDER_SHUTDOWN_GRACE_SECS") {
            Some(raw) => parse_secs("RESPONDER_SHUTDOWN_GRACE_SECS", &raw)?,
            None => defaults.shutdown_grace,
        };

        Ok(Self {
            channel_name,
            prefix,
            policy,
            classify_timeout,
            shutdown_grace,
        })
    }

    /// Message filter for this configuration.
    pub fn message_filter(&self) -> MessageFilter {
        let filter = MessageFilter::new(&self.channel_name);
        match self.prefix {
            Some(ref prefix) => filter.with_prefix(prefix),
            None => filter,
        }
    }
}

/// Parse a whole number of seconds; zero is rejected.
pub(crate) fn parse_secs(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_env_uses_defaults() {
        let config = ResponderConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.channel_name, "bot-training");
        assert!(config.prefix.is_none());
        assert_eq!(config.policy.rules().len(), 2);
        assert_eq!(config.classify_timeout, Duration::from_secs(10));
        assert!(!config.message_filter().is_prefix_gated());
    }

    #[test]
    fn prefix_enables_gating() {
        let config =
            ResponderConfig::from_lookup(lookup_from(&[("RESPONDER_PREFIX", " !bot ")])).unwrap();
        assert_eq!(config.prefix.as_deref(), Some("!bot"));
        let filter = config.message_filter();
        assert!(filter.is_prefix_gated());
        assert_eq!(filter.prefix(), Some("!bot"));
    }

    #[test]
    fn blank_prefix_is_ignored() {
        let config =
            ResponderConfig::from_lookup(lookup_from(&[("RESPONDER_PREFIX", "   ")])).unwrap();
        assert!(config.prefix.is_none());
    }

    #[test]
    fn channel_override() {
        let config =
            ResponderConfig::from_lookup(lookup_from(&[("RESPONDER_CHANNEL", "general")]))
                .unwrap();
        assert_eq!(config.message_filter().channel_name(), "general");
    }

    #[test]
    fn rules_from_json() {
        let config = ResponderConfig::from_lookup(lookup_from(&[(
            "RESPONDER_RULES",
            r#"[{"category":"Thanks","min_confidence":0.6,"reply":"Any time"}]"#,
        )]))
        .unwrap();
        assert_eq!(config.policy.rules().len(), 1);
        assert_eq!(config.policy.rules()[0].category, "Thanks");
    }

    #[test]
    fn invalid_rules_fail() {
        let err = ResponderConfig::from_lookup(lookup_from(&[(
            "RESPONDER_RULES",
            r#"[{"category":"Thanks","min_confidence":2.0,"reply":"Any time"}]"#,
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn timeouts_parse() {
        let config = ResponderConfig::from_lookup(lookup_from(&[
            ("RESPONDER_CLASSIFY_TIMEOUT_SECS", "3"),
            ("RESPONDER_SHUTDOWN_GRACE_SECS", "1"),
        ]))
        .unwrap();
        assert_eq!(config.classify_timeout, Duration::from_secs(3));
        assert_eq!(config.shutdown_grace, Duration::from_secs(1));
    }

    #[test]
    fn zero_or_garbage_timeout_fails() {
        for raw in ["0", "ten", "-1"] {
            let err = ResponderConfig::from_lookup(lookup_from(&[(
                "RESPONDER_CLASSIFY_TIMEOUT_SECS",
                raw,
            )]))
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }), "raw = {raw}");
        }
    }
}
