//! Dispatch policy: maps a classified intent to a canned reply.
//!
//! Rules are checked in their configured order and the first rule whose
//! category matches (case-insensitive) with `confidence >= min_confidence`
//! wins. Categories without a rule are never answered.

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::intent::Intent;

/// One `(category, threshold, reply)` entry of the threshold table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DispatchRule {
    pub category: String,
    pub min_confidence: f32,
    pub reply: String,
}

impl DispatchRule {
    pub fn new(category: impl Into<String>, min_confidence: f32, reply: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            min_confidence,
            reply: reply.into(),
        }
    }

    fn matches(&self, intent: &Intent) -> bool {
        intent.is_category(&self.category) && intent.confidence() >= self.min_confidence
    }
}

/// The reply chosen for an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Category of the rule that matched.
    pub category: String,
    pub text: String,
}

/// Ordered threshold table.
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    rules: Vec<DispatchRule>,
}

impl DispatchPolicy {
    /// Build a policy, validating every rule.
    ///
    /// Thresholds must be finite and within `[0, 1]`; a category may appear
    /// only once.
    pub fn new(rules: Vec<DispatchRule>) -> Result<Self, ConfigError> {
        for (i, rule) in rules.iter().enumerate() {
            if rule.category.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: format!("rules[{i}].category"),
                    message: "category must not be empty".into(),
                });
            }
            if !rule.min_confidence.is_finite() || !(0.0..=1.0).contains(&rule.min_confidence) {
                return Err(ConfigError::InvalidValue {
                    key: format!("rules[{i}].min_confidence"),
                    message: format!("{} is outside [0, 1]", rule.min_confidence),
                });
            }
            let duplicate = rules[..i]
                .iter()
                .any(|earlier| earlier.category.to_lowercase() == rule.category.to_lowercase());
            if duplicate {
                return Err(ConfigError::InvalidValue {
                    key: format!("rules[{i}].category"),
                    message: format!("duplicate category '{}'", rule.category),
                });
            }
        }
        Ok(Self { rules })
    }

    /// The table the bot shipped with: greet back, explain on help.
    pub fn default_rules() -> Self {
        Self {
            rules: vec![
                DispatchRule::new("Hello", 0.9, "Hello"),
                DispatchRule::new("Help", 0.8, "I only respond to 'hello' with 'hello'"),
            ],
        }
    }

    /// Parse a JSON array of rules, e.g.
    /// `[{"category":"Hello","min_confidence":0.9,"reply":"Hello"}]`.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let rules: Vec<DispatchRule> = serde_json::from_str(raw)
            .map_err(|e| ConfigError::ParseError(format!("dispatch rules: {e}")))?;
        Self::new(rules)
    }

    pub fn rules(&self) -> &[DispatchRule] {
        &self.rules
    }

    /// Pick the reply for `intent`, or `None` to stay silent.
    pub fn decide(&self, intent: &Intent) -> Option<Reply> {
        let rule = self.rules.iter().find(|rule| rule.matches(intent));
        match rule {
            Some(rule) => Some(Reply {
                category: rule.category.clone(),
                text: rule.reply.clone(),
            }),
            None => {
                debug!(
                    label = %intent.label(),
                    confidence = intent.confidence(),
                    "No dispatch rule matched"
                );
                None
            }
        }
    }
}
