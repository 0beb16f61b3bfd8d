//! Intent model and the classifier abstraction.
//!
//! Classifier backends:
//! - **LUIS**: the v3 prediction endpoint (`luis::LuisClassifier`)
//!
//! The pipeline only depends on `IntentClassifier`, so a local or fake
//! backend can replace the remote one without touching filtering or policy.

pub mod luis;

pub use luis::{LuisClassifier, LuisConfig};

use std::fmt;

use async_trait::async_trait;

use crate::error::ClassificationError;

/// A classification result: the top label and the classifier's certainty.
///
/// Immutable once built. Category checks go through [`Intent::is_category`]
/// so callers never compare raw label strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    label: String,
    confidence: f32,
}

impl Intent {
    /// Build an intent. Confidence is clamped into `[0, 1]`; NaN becomes 0.
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            label: label.into(),
            confidence,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Case-insensitive comparison of the label against a category name.
    pub fn is_category(&self, name: &str) -> bool {
        self.label.to_lowercase() == name.to_lowercase()
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2})", self.label, self.confidence)
    }
}

/// Converts free text into an [`Intent`].
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Classify a piece of text. May suspend on network I/O.
    async fn classify(&self, text: &str) -> Result<Intent, ClassificationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_category_ignores_case() {
        let intent = Intent::new("Hello", 0.95);
        assert!(intent.is_category("hello"));
        assert!(intent.is_category("HELLO"));
        assert!(intent.is_category("Hello"));
        assert!(!intent.is_category("Help"));
    }

    #[test]
    fn is_category_is_not_a_prefix_match() {
        let intent = Intent::new("Help", 0.9);
        assert!(!intent.is_category("Hel"));
        assert!(!intent.is_category("Helpful"));
    }

    #[test]
    fn confidence_clamped_into_unit_range() {
        assert_eq!(Intent::new("x", 1.7).confidence(), 1.0);
        assert_eq!(Intent::new("x", -0.2).confidence(), 0.0);
        assert_eq!(Intent::new("x", f32::NAN).confidence(), 0.0);
        assert!((Intent::new("x", 0.42).confidence() - 0.42).abs() < f32::EPSILON);
    }

    #[test]
    fn display_shows_label_and_score() {
        assert_eq!(Intent::new("Hello", 0.95).to_string(), "Hello (0.95)");
    }
}
