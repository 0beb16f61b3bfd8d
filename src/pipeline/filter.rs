//! Eligibility filter that runs before any classification call.
//!
//! Rules, in order (first failure wins):
//! - message posted outside the configured channel → reject
//! - message authored by a bot account → reject
//! - prefix gating on and the prefix is missing → reject
//!
//! Only eligible messages reach the classifier, so most channel traffic
//! never costs an NLU request.

use tracing::debug;

/// Why a message was not classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    WrongChannel,
    BotAuthor,
    MissingPrefix,
    EmptyContent,
}

impl RejectReason {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::WrongChannel => "wrong_channel",
            Self::BotAuthor => "bot_author",
            Self::MissingPrefix => "missing_prefix",
            Self::EmptyContent => "empty_content",
        }
    }
}

/// Result of running a message through the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// Classify `text`.
    Eligible { text: String },
    Rejected(RejectReason),
}

impl FilterDecision {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible { .. })
    }

    /// Text to send to the classifier, if eligible.
    pub fn effective_text(&self) -> Option<&str> {
        match self {
            Self::Eligible { text } => Some(text),
            Self::Rejected(_) => None,
        }
    }
}

/// Decides whether a message should be classified and what text to classify.
#[derive(Debug, Clone)]
pub struct MessageFilter {
    channel_name: String,
    /// Command prefix. `Some` turns prefix gating on.
    prefix: Option<String>,
}

impl MessageFilter {
    /// Accept every human message posted in `channel_name`.
    pub fn new(channel_name: impl Into<String>) -> Self {
        Self {
            channel_name: channel_name.into(),
            prefix: None,
        }
    }

    /// Require messages to start with `prefix` (case-insensitive).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn is_prefix_gated(&self) -> bool {
        self.prefix.is_some()
    }

    /// Evaluate a message event.
    pub fn should_process(
        &self,
        channel_name: &str,
        author_is_bot: bool,
        content: &str,
    ) -> FilterDecision {
        if channel_name != self.channel_name {
            return FilterDecision::Rejected(RejectReason::WrongChannel);
        }

        // Never classify our own or another bot's messages.
        if author_is_bot {
            return FilterDecision::Rejected(RejectReason::BotAuthor);
        }

        let text = match self.prefix.as_deref() {
            Some(prefix) => match strip_command_prefix(content, prefix) {
                Some(rest) => rest,
                None => {
                    debug!(prefix = %prefix, "Message lacks command prefix");
                    return FilterDecision::Rejected(RejectReason::MissingPrefix);
                }
            },
            None => content,
        };

        if text.trim().is_empty() {
            return FilterDecision::Rejected(RejectReason::EmptyContent);
        }

        FilterDecision::Eligible {
            text: text.to_string(),
        }
    }
}

/// Strip `prefix` from the start of `content`, matching case-insensitively.
///
/// A prefix ending in an alphanumeric character must be followed by
/// whitespace or the end of the text, so `"!bottle"` does not match `"!bot"`.
/// Symbol prefixes such as `"!"` match directly (`"!hello"` yields `"hello"`).
/// Whitespace after the prefix is removed.
fn strip_command_prefix<'a>(content: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = content.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }

    let rest = chars.next().map_or("", |(i, _)| &content[i..]);
    let needs_boundary = prefix.chars().last().is_some_and(char::is_alphanumeric);
    if needs_boundary && !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim_start())
}
