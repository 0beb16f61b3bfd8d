//! Message processor: one pass of a message through filter, classifier and
//! dispatch policy.
//!
//! Flow:
//! 1. `MessageFilter` (no network) → may end the pass as `Ignored`
//! 2. `IntentClassifier` under a timeout → may end as `ClassificationFailed`
//! 3. `DispatchPolicy` → `NoMatch` or `Reply`
//!
//! The processor never sends anything and never returns an error: every
//! failure becomes a terminal `PipelineOutcome` so one bad message cannot
//! affect the next.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::channels::IncomingMessage;
use crate::error::ClassificationError;
use crate::intent::{Intent, IntentClassifier};
use crate::pipeline::filter::{FilterDecision, MessageFilter};
use crate::pipeline::policy::DispatchPolicy;
use crate::pipeline::types::PipelineOutcome;

/// Default upper bound on a single classification call.
pub const DEFAULT_CLASSIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs inbound messages through the intent pipeline.
pub struct MessageProcessor {
    filter: MessageFilter,
    classifier: Arc<dyn IntentClassifier>,
    policy: DispatchPolicy,
    classify_timeout: Duration,
}

impl MessageProcessor {
    pub fn new(
        filter: MessageFilter,
        classifier: Arc<dyn IntentClassifier>,
        policy: DispatchPolicy,
    ) -> Self {
        Self {
            filter,
            classifier,
            policy,
            classify_timeout: DEFAULT_CLASSIFY_TIMEOUT,
        }
    }

    pub fn with_classify_timeout(mut self, timeout: Duration) -> Self {
        self.classify_timeout = timeout;
        self
    }

    pub fn filter(&self) -> &MessageFilter {
        &self.filter
    }

    /// Process a single inbound message.
    pub async fn process(&self, message: &IncomingMessage) -> PipelineOutcome {
        // Step 1: eligibility
        let decision = self.filter.should_process(
            &message.channel_name,
            message.author_is_bot,
            &message.content,
        );
        let text = match decision {
            FilterDecision::Eligible { text } => text,
            FilterDecision::Rejected(reason) => {
                debug!(
                    id = %message.id,
                    channel = %message.channel_name,
                    reason = reason.label(),
                    "Message not eligible for classification"
                );
                return PipelineOutcome::Ignored(reason);
            }
        };

        // Step 2: classification
        let intent = match self.classify(&text).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(
                    id = %message.id,
                    classifier = self.classifier.name(),
                    error = %e,
                    "Classification failed, not replying"
                );
                return PipelineOutcome::ClassificationFailed(e);
            }
        };

        debug!(
            id = %message.id,
            label = %intent.label(),
            confidence = intent.confidence(),
            "Message classified"
        );

        // Step 3: dispatch decision
        match self.policy.decide(&intent) {
            Some(reply) => {
                info!(
                    id = %message.id,
                    label = %intent.label(),
                    confidence = intent.confidence(),
                    category = %reply.category,
                    "Dispatching reply"
                );
                PipelineOutcome::Reply { intent, reply }
            }
            None => PipelineOutcome::NoMatch(intent),
        }
    }

    async fn classify(&self, text: &str) -> Result<Intent, ClassificationError> {
        match tokio::time::timeout(self.classify_timeout, self.classifier.classify(text)).await {
            Ok(result) => result,
            Err(_) => Err(ClassificationError::Timeout(self.classify_timeout)),
        }
    }
}
