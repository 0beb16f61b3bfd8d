//! LUIS classifier: calls the v3 prediction endpoint over HTTP.
//!
//! Request:
//! `GET {endpoint}/luis/prediction/v3.0/apps/{app_id}/slots/production/predict?query={text}`
//! with the `Ocp-Apim-Subscription-Key` header.
//!
//! The intent is the response's `prediction.topIntent`, scored by looking the
//! label up in `prediction.intents`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::parse_secs;
use crate::error::{ClassificationError, ConfigError};
use crate::intent::{Intent, IntentClassifier};

const PROVIDER: &str = "luis";

/// Header carrying the prediction key.
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Default HTTP timeout for a prediction call.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ── Configuration ───────────────────────────────────────────────────

/// LUIS connection settings, built from environment variables.
#[derive(Debug, Clone)]
pub struct LuisConfig {
    pub app_id: String,
    pub prediction_key: SecretString,
    /// Base URL of the prediction resource, e.g. `https://westus.api.cognitive.microsoft.com/`.
    pub endpoint: String,
    pub timeout: Duration,
}

impl LuisConfig {
    /// Build config from `LUIS_APP_ID`, `LUIS_PREDICTION_KEY`, `LUIS_ENDPOINT`
    /// and the optional `LUIS_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let app_id = required("LUIS_APP_ID")?;
        let prediction_key = SecretString::from(required("LUIS_PREDICTION_KEY")?);
        let endpoint = required("LUIS_ENDPOINT")?;

        let timeout = match lookup("LUIS_TIMEOUT_SECS").filter(|v| !v.trim().is_empty()) {
            Some(raw) => parse_secs("LUIS_TIMEOUT_SECS", &raw)?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            app_id,
            prediction_key,
            endpoint,
            timeout,
        })
    }
}

// ── Wire format ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PredictionResponse {
    #[serde(default)]
    query: Option<String>,
    prediction: Prediction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    top_intent: String,
    #[serde(default)]
    intents: HashMap<String, IntentScore>,
}

#[derive(Debug, Deserialize)]
struct IntentScore {
    score: f32,
}

impl PredictionResponse {
    fn into_intent(self) -> Result<Intent, ClassificationError> {
        let Prediction {
            top_intent,
            intents,
        } = self.prediction;
        let score = intents
            .get(&top_intent)
            .map(|s| s.score)
            .ok_or_else(|| ClassificationError::MissingScore {
                label: top_intent.clone(),
            })?;
        Ok(Intent::new(top_intent, score))
    }
}

/// Parse a prediction body into an intent.
fn parse_prediction(body: &str) -> Result<Intent, ClassificationError> {
    let response: PredictionResponse =
        serde_json::from_str(body).map_err(|e| ClassificationError::MalformedResponse {
            provider: PROVIDER.into(),
            reason: e.to_string(),
        })?;
    if let Some(ref query) = response.query {
        tracing::trace!(query = %query, "LUIS echoed query");
    }
    response.into_intent()
}

// ── Classifier ──────────────────────────────────────────────────────

/// Intent classifier backed by a LUIS application's production slot.
pub struct LuisClassifier {
    config: LuisConfig,
    client: reqwest::Client,
}

impl LuisClassifier {
    pub fn new(config: LuisConfig) -> Result<Self, ClassificationError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClassificationError::Request {
                provider: PROVIDER.into(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { config, client })
    }

    fn predict_url(&self) -> String {
        format!(
            "{}/luis/prediction/v3.0/apps/{}/slots/production/predict",
            self.config.endpoint.trim_end_matches('/'),
            self.config.app_id
        )
    }

    fn map_request_error(&self, e: reqwest::Error) -> ClassificationError {
        if e.is_timeout() {
            ClassificationError::Timeout(self.config.timeout)
        } else {
            ClassificationError::Request {
                provider: PROVIDER.into(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl IntentClassifier for LuisClassifier {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn classify(&self, text: &str) -> Result<Intent, ClassificationError> {
        if text.trim().is_empty() {
            return Err(ClassificationError::EmptyQuery);
        }

        let resp = self
            .client
            .get(self.predict_url())
            .header(SUBSCRIPTION_KEY_HEADER, self.config.prediction_key.expose_secret())
            .query(&[("query", text)])
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_request_error(e))?;

        if !status.is_success() {
            return Err(ClassificationError::Status {
                provider: PROVIDER.into(),
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(body = %body, "LUIS prediction response");
        parse_prediction(&body)
    }
}
