mod commands;
mod gateway;

use campus_channels::telegram::TelegramChannel;
use campus_core::{config, traits::Provider};
use campus_data::{
    activities::ActivitiesClient, qr::StyledQr, schedule::ScheduleStore, weather::WeatherClient,
};
use campus_providers::openai::OpenAiProvider;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "campus", version, about = "Campus — school assistant bot")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot.
    Start,
    /// Check configuration, datasets, and provider availability.
    Status,
    /// Send a one-shot query to the AI provider.
    Ask {
        /// The question to ask.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
}

/// Console logging plus a daily-rotating log file under the data dir.
fn init_tracing(cfg: &config::Config) -> tracing_appender::non_blocking::WorkerGuard {
    let log_dir = format!("{}/logs", config::shellexpand(&cfg.campus.data_dir));
    let file_appender = tracing_appender::rolling::daily(log_dir, "campus.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cfg.campus.log_level.clone()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    match cli.command {
        Commands::Start => {
            let _log_guard = init_tracing(&cfg);

            let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::from_config(&cfg.provider));
            if provider.requires_api_key() && cfg.provider.api_key.is_empty() {
                tracing::warn!("no AI API key configured; /ask and mentions will fail");
            }

            let mut channels: HashMap<String, Arc<dyn campus_core::traits::Channel>> =
                HashMap::new();
            if let Some(ref tg) = cfg.channel.telegram {
                if tg.enabled {
                    if tg.bot_token.is_empty() {
                        anyhow::bail!(
                            "Telegram is enabled but bot_token is empty. \
                             Set it in config.toml or the TELEGRAM_BOT_TOKEN env var."
                        );
                    }
                    channels.insert(
                        "telegram".to_string(),
                        Arc::new(TelegramChannel::new(tg.clone())),
                    );
                }
            }
            if channels.is_empty() {
                anyhow::bail!("No channels enabled. Enable [channel.telegram] in config.toml.");
            }

            let schedule = Arc::new(ScheduleStore::load(&cfg.schedule)?);
            let activities = Arc::new(ActivitiesClient::new(&cfg.activities));
            let weather = Arc::new(WeatherClient::new(&cfg.weather));

            println!("Campus — starting bot...");
            let gw = Arc::new(gateway::Gateway::new(
                provider,
                channels,
                schedule,
                activities,
                Arc::new(StyledQr),
                weather,
                cfg.auth.clone(),
                cfg.provider.models.clone(),
            ));
            gw.run().await?;
        }
        Commands::Status => {
            println!("Campus — Status Check\n");
            println!("Config: {}", cli.config);
            println!("Provider: {} @ {}", cfg.provider.model, cfg.provider.base_url);

            let provider = OpenAiProvider::from_config(&cfg.provider);
            println!(
                "  endpoint: {}",
                if provider.is_available().await {
                    "available"
                } else {
                    "not reachable"
                }
            );

            match ScheduleStore::load(&cfg.schedule) {
                Ok(store) => {
                    use campus_core::traits::ScheduleSource;
                    println!("  schedule: {} classes loaded", store.classes().len());
                }
                Err(e) => println!("  schedule: {e}"),
            }

            match cfg.channel.telegram {
                Some(ref tg) if tg.enabled && !tg.bot_token.is_empty() => {
                    println!("  telegram: configured")
                }
                Some(ref tg) if tg.enabled => println!("  telegram: enabled but missing bot_token"),
                Some(_) => println!("  telegram: disabled"),
                None => println!("  telegram: not configured"),
            }
        }
        Commands::Ask { message } => {
            if message.is_empty() {
                anyhow::bail!("no question provided. Usage: campus ask <question>");
            }
            let prompt = message.join(" ");
            let provider = OpenAiProvider::from_config(&cfg.provider);
            let answer = provider.complete(&prompt, None).await?;
            println!("{answer}");
        }
    }

    Ok(())
}
