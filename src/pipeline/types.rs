//! Shared types for the message pipeline.

use crate::error::ClassificationError;
use crate::intent::Intent;
use crate::pipeline::filter::RejectReason;
use crate::pipeline::policy::Reply;

/// Terminal state of one traversal of the pipeline.
///
/// Only `Reply` has a side effect (the responder sends `reply.text`); every
/// other outcome ends the traversal silently.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Filtered out before classification.
    Ignored(RejectReason),
    /// The classifier failed or timed out.
    ClassificationFailed(ClassificationError),
    /// Classified, but no rule matched.
    NoMatch(Intent),
    /// A rule matched; send `reply`.
    Reply { intent: Intent, reply: Reply },
}

impl PipelineOutcome {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ignored(_) => "ignored",
            Self::ClassificationFailed(_) => "classification_failed",
            Self::NoMatch(_) => "no_match",
            Self::Reply { .. } => "reply",
        }
    }

    /// Reply text to send, if any.
    pub fn reply_text(&self) -> Option<&str> {
        match self {
            Self::Reply { reply, .. } => Some(&reply.text),
            _ => None,
        }
    }

    /// The classified intent, when classification succeeded.
    pub fn intent(&self) -> Option<&Intent> {
        match self {
            Self::NoMatch(intent) | Self::Reply { intent, .. } => Some(intent),
            _ => None,
        }
    }
}
