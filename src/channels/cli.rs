//! CLI channel: stdin/stdout stand-in for a chat channel, for local runs.
//!
//! Every non-empty stdin line becomes a message from a human author posted in
//! the configured channel. Replies are printed to stdout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse};
use crate::error::ChannelError;

const LOCAL_AUTHOR: &str = "local-user";

/// A CLI channel that reads from stdin and writes to stdout.
pub struct CliChannel {
    channel_name: String,
    closed: Arc<AtomicBool>,
    /// Stdin has a single reader; set while a subscription is live.
    subscribed: AtomicBool,
}

impl CliChannel {
    /// Messages read from stdin are reported as posted in `channel_name`.
    pub fn new(channel_name: impl Into<String>) -> Self {
        Self {
            channel_name: channel_name.into(),
            closed: Arc::new(AtomicBool::new(false)),
            subscribed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        if self.subscribed.swap(true, Ordering::SeqCst) {
            return Err(ChannelError::StartupFailed {
                name: "cli".into(),
                reason: "stdin is already subscribed".into(),
            });
        }

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let channel_name = self.channel_name.clone();
        let closed = Arc::clone(&self.closed);
        closed.store(false, Ordering::SeqCst);

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if closed.load(Ordering::SeqCst) {
                            break;
                        }
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let msg = IncomingMessage::new(&channel_name, LOCAL_AUTHOR, line);
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        _msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChannelError::SendFailed {
                name: "cli".into(),
                reason: "channel is shut down".into(),
            });
        }
        println!("\n{}\n", response.content);
        eprint!("> ");
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        self.closed.store(true, Ordering::SeqCst);
        self.subscribed.store(false, Ordering::SeqCst);
        tracing::info!("CLI channel shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_channel_name() {
        assert_eq!(CliChannel::new("bot-training").name(), "cli");
    }

    #[tokio::test]
    async fn respond_after_shutdown_fails() {
        let ch = CliChannel::new("bot-training");
        ch.shutdown().await.unwrap();
        let msg = IncomingMessage::new("bot-training", "alice", "Hello");
        let result = ch.respond(&msg, OutgoingResponse::text("Hello")).await;
        assert!(matches!(result, Err(ChannelError::SendFailed { .. })));
    }

    #[tokio::test]
    async fn second_subscription_is_refused() {
        let ch = CliChannel::new("bot-training");
        ch.subscribed.store(true, Ordering::SeqCst);
        let result = ch.start().await;
        assert!(matches!(result, Err(ChannelError::StartupFailed { .. })));

        ch.shutdown().await.unwrap();
        assert!(!ch.subscribed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn health_check_defaults_ok() {
        assert!(CliChannel::new("x").health_check().await.is_ok());
    }
}
