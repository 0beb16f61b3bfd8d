use std::sync::Arc;

use intent_responder::channels::{Channel, CliChannel};
use intent_responder::config::ResponderConfig;
use intent_responder::error::Result;
use intent_responder::intent::{IntentClassifier, LuisClassifier, LuisConfig};
use intent_responder::pipeline::MessageProcessor;
use intent_responder::responder::Responder;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ResponderConfig::from_env()?;
    let luis_config = LuisConfig::from_env().inspect_err(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export LUIS_APP_ID=... LUIS_PREDICTION_KEY=... LUIS_ENDPOINT=https://...");
    })?;

    eprintln!("🤖 Intent Responder v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Channel: #{}", config.channel_name);
    eprintln!(
        "   Prefix: {}",
        config.prefix.as_deref().unwrap_or("(none, every message is classified)")
    );
    eprintln!("   LUIS app: {} @ {}", luis_config.app_id, luis_config.endpoint);
    for rule in config.policy.rules() {
        eprintln!(
            "   Rule: {} >= {:.2} → {:?}",
            rule.category, rule.min_confidence, rule.reply
        );
    }
    eprintln!("   Type a message and press Enter. Ctrl+C to exit.\n");

    let classifier: Arc<dyn IntentClassifier> = Arc::new(LuisClassifier::new(luis_config)?);
    let processor = MessageProcessor::new(config.message_filter(), classifier, config.policy.clone())
        .with_classify_timeout(config.classify_timeout);

    let channel: Arc<dyn Channel> = Arc::new(CliChannel::new(config.channel_name.clone()));
    if let Err(e) = channel.health_check().await {
        tracing::warn!(error = %e, "Channel health check failed");
    }

    let responder = Responder::new(processor, channel).with_shutdown_grace(config.shutdown_grace);

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Ctrl+C received, shutting down..."),
            Err(e) => {
                // No signal handler: run until stdin closes instead.
                tracing::warn!(error = %e, "Could not listen for Ctrl+C");
                futures::future::pending::<()>().await;
            }
        }
    };

    let stats = responder.run(shutdown).await?;
    tracing::info!(
        received = stats.received,
        replied = stats.replied,
        no_match = stats.no_match,
        classification_failed = stats.classification_failed,
        "Bye"
    );

    Ok(())
}
