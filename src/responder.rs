//! Responder: subscribes to a channel and answers classified messages.
//!
//! Each inbound message is handled by its own task, so a slow NLU call for
//! one message never delays another. Replies can therefore go out in a
//! different order than the messages arrived.
//!
//! The channel subscription is acquired in [`Responder::run`] and released
//! (`Channel::shutdown`) on every way out of the listen loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse};
use crate::error::Error;
use crate::pipeline::{MessageProcessor, PipelineOutcome};

/// How a single message's traversal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    Ignored,
    ClassificationFailed,
    NoMatch,
    Replied,
    SendFailed,
}

/// Counters for one `run`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResponderStats {
    pub received: usize,
    pub ignored: usize,
    pub classification_failed: usize,
    pub no_match: usize,
    pub replied: usize,
    pub send_failed: usize,
    /// Traversals cut off at shutdown or lost to a panic.
    pub aborted: usize,
}

impl ResponderStats {
    fn record(&mut self, traversal: Traversal) {
        match traversal {
            Traversal::Ignored => self.ignored += 1,
            Traversal::ClassificationFailed => self.classification_failed += 1,
            Traversal::NoMatch => self.no_match += 1,
            Traversal::Replied => self.replied += 1,
            Traversal::SendFailed => self.send_failed += 1,
        }
    }
}

/// Connects a channel to the message pipeline.
pub struct Responder {
    processor: Arc<MessageProcessor>,
    channel: Arc<dyn Channel>,
    shutdown_grace: Duration,
}

impl Responder {
    pub fn new(processor: MessageProcessor, channel: Arc<dyn Channel>) -> Self {
        Self {
            processor: Arc::new(processor),
            channel,
            shutdown_grace: Duration::from_secs(5),
        }
    }

    /// How long to wait for in-flight messages once shutdown starts.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Listen until `shutdown` resolves or the channel's stream ends.
    pub async fn run<F>(&self, shutdown: F) -> Result<ResponderStats, Error>
    where
        F: Future<Output = ()> + Send,
    {
        let stream = self.channel.start().await?;
        info!(
            transport = self.channel.name(),
            channel = %self.processor.filter().channel_name(),
            prefix = self.processor.filter().prefix().unwrap_or(""),
            "Responder listening"
        );

        let stats = self.listen(stream, shutdown).await;

        self.channel.shutdown().await?;
        info!(
            received = stats.received,
            replied = stats.replied,
            "Responder stopped"
        );
        Ok(stats)
    }

    async fn listen<F>(&self, mut stream: MessageStream, shutdown: F) -> ResponderStats
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);
        let mut tasks: JoinSet<Traversal> = JoinSet::new();
        let mut stats = ResponderStats::default();

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting messages");
                    break;
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    record_join(&mut stats, joined);
                }
                msg = stream.next() => {
                    match msg {
                        Some(message) => {
                            stats.received += 1;
                            let processor = Arc::clone(&self.processor);
                            let channel = Arc::clone(&self.channel);
                            tasks.spawn(handle_message(processor, channel, message));
                        }
                        None => {
                            info!("Channel stream ended");
                            break;
                        }
                    }
                }
            }
        }

        self.drain(&mut tasks, &mut stats).await;
        stats
    }

    /// Let in-flight traversals finish within the grace period, abort the rest.
    async fn drain(&self, tasks: &mut JoinSet<Traversal>, stats: &mut ResponderStats) {
        if tasks.is_empty() {
            return;
        }
        debug!(in_flight = tasks.len(), "Waiting for in-flight messages");

        let finished = tokio::time::timeout(self.shutdown_grace, async {
            while let Some(joined) = tasks.join_next().await {
                record_join(stats, joined);
            }
        })
        .await;

        if finished.is_err() {
            warn!(
                remaining = tasks.len(),
                grace = ?self.shutdown_grace,
                "Grace period elapsed, abandoning in-flight messages"
            );
            tasks.abort_all();
            while let Some(joined) = tasks.join_next().await {
                record_join(stats, joined);
            }
        }
    }
}

fn record_join(stats: &mut ResponderStats, joined: Result<Traversal, tokio::task::JoinError>) {
    match joined {
        Ok(traversal) => stats.record(traversal),
        Err(e) => {
            if e.is_panic() {
                error!(error = %e, "Message task panicked");
            }
            stats.aborted += 1;
        }
    }
}

/// One traversal: process, then send the reply if there is one.
async fn handle_message(
    processor: Arc<MessageProcessor>,
    channel: Arc<dyn Channel>,
    message: IncomingMessage,
) -> Traversal {
    let outcome = processor.process(&message).await;
    debug!(
        id = %message.id,
        outcome = outcome.label(),
        intent = ?outcome.intent().map(ToString::to_string),
        "Traversal finished"
    );

    let reply = match outcome {
        PipelineOutcome::Ignored(_) => return Traversal::Ignored,
        PipelineOutcome::ClassificationFailed(_) => return Traversal::ClassificationFailed,
        PipelineOutcome::NoMatch(_) => return Traversal::NoMatch,
        PipelineOutcome::Reply { reply, .. } => reply,
    };

    match channel
        .respond(&message, OutgoingResponse::text(reply.text))
        .await
    {
        Ok(()) => {
            info!(id = %message.id, category = %reply.category, "Reply sent");
            Traversal::Replied
        }
        Err(e) => {
            warn!(id = %message.id, error = %e, "Failed to send reply");
            Traversal::SendFailed
        }
    }
}
