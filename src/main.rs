use std::sync::Arc;

use anyhow::Context;

use booking_bot::bot::BookingBot;
use booking_bot::channels::CliChannel;
use booking_bot::config::BotConfig;
use booking_bot::dialogs::DialogSet;
use booking_bot::nlu::{CluRecognizer, IntentRecognizer};
use booking_bot::timex::{TemporalResolver, TimexResolver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().context("Failed to load configuration")?;

    eprintln!("Booking Bot v{}", env!("CARGO_PKG_VERSION"));
    match &config.clu {
        Some(clu) => eprintln!(
            "   CLU: {} / {} @ {}",
            clu.project_name, clu.deployment_name, clu.host_name
        ),
        None => eprintln!("   CLU: not configured"),
    }
    eprintln!("   Type a message and press Enter. Ctrl+C to exit.\n");

    let temporal: Arc<dyn TemporalResolver> = Arc::new(TimexResolver::new());
    let recognizer: Arc<dyn IntentRecognizer> = Arc::new(CluRecognizer::new(config.clu.clone()));
    let dialogs = DialogSet::booking_bot(recognizer, temporal).context("Invalid dialog wiring")?;

    let bot = BookingBot::new(config, dialogs);
    bot.run(Arc::new(CliChannel::new())).await?;

    Ok(())
}
