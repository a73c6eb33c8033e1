use anyhow::Result;
use chrono::Local;
use clap::Parser;
use kandinsky_bot::app::App;
use kandinsky_bot::chat::{ChatId, ConsoleTransport, IncomingMessage};
use kandinsky_bot::models::{Config, ProviderKind};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "kandinsky-bot")]
#[command(about = "Talk to the image generation bot from the terminal")]
struct CliArgs {
    /// Image provider: kandinsky or yandex-art (overrides IMAGE_PROVIDER).
    #[arg(long, value_parser = parse_provider_arg)]
    provider: Option<ProviderKind>,

    /// Directory for delivered images.
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 1)]
    chat_id: ChatId,
}

fn parse_provider_arg(input: &str) -> std::result::Result<ProviderKind, String> {
    input.parse().map_err(|e: kandinsky_bot::Error| e.to_string())
}

fn default_output_dir() -> PathBuf {
    let date = Local::now().format("%Y-%m-%d").to_string();
    PathBuf::from("output").join(format!("{}_{}", date, Uuid::new_v4()))
}

async fn run(args: CliArgs) -> Result<()> {
    let config = Config::from_env_with_provider(args.provider)?;
    let transport = ConsoleTransport::new(args.output_dir.unwrap_or_else(default_output_dir))?;
    let app = App::from_config(config, Box::new(transport));

    info!("Reading messages for chat {} from stdin", args.chat_id);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
        };
        let Some(text) = line else {
            info!("End of input");
            break;
        };

        let message = IncomingMessage::new(args.chat_id, text);
        tokio::select! {
            result = app.handle_message(&message) => result?,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, abandoning the current request");
                break;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kandinsky_bot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting kandinsky-bot");

    let args = CliArgs::parse();

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Bot stopped: {}", e);
            std::process::exit(1);
        }
    }
}
