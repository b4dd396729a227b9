use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use promptpipe::config::Config;
use promptpipe::llm::AnthropicClient;
use promptpipe::pipeline::Pipeline;
use promptpipe::publish::{MediaHost, ThreadsPublisher};
use promptpipe::server::{AppState, build_app};
use promptpipe::session::SessionStore;
use promptpipe::tokens;

#[derive(Parser)]
#[command(
    name = "promptpipe",
    version,
    about = "Chat relay that answers prompts with Claude and mirrors the replies to Threads"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "promptpipe.yaml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the chat server (the default).
    Serve,
    /// Obtain or refresh Threads access tokens.
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Exchange an authorization code for short- and long-lived tokens.
    Exchange {
        #[arg(long)]
        app_id: String,
        #[arg(long)]
        app_secret: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        redirect_uri: String,
    },
    /// Refresh an unexpired long-lived token.
    Refresh {
        #[arg(long)]
        access_token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&cli.config).await,
        Command::Token { action } => match action {
            TokenAction::Exchange {
                app_id,
                app_secret,
                code,
                redirect_uri,
            } => {
                let bundle = tokens::exchange(&app_id, &app_secret, &code, &redirect_uri).await?;
                println!("{}", serde_json::to_string_pretty(&bundle)?);
                Ok(())
            }
            TokenAction::Refresh { access_token } => {
                let token = tokens::refresh(&access_token).await?;
                println!("{}", serde_json::to_string_pretty(&token)?);
                Ok(())
            }
        },
    }
}

async fn serve(config_path: &str) -> Result<()> {
    let config = Config::load(config_path)
        .await
        .context("loading configuration")?;

    let Ok(anthropic_key) = std::env::var("ANTHROPIC_API_KEY") else {
        bail!("ANTHROPIC_API_KEY is not set");
    };
    let access_token = std::env::var("THREADS_ACCESS_TOKEN").unwrap_or_default();

    let media = config.threads.media_host.as_ref().map(|media_config| {
        let token = std::env::var("THREADS_MEDIA_TOKEN").unwrap_or_default();
        if token.is_empty() {
            warn!("THREADS_MEDIA_TOKEN is not set; media uploads will be rejected");
        }
        MediaHost::new(media_config, token)
    });
    if media.is_none() {
        info!("no media host configured; image posts to Threads are disabled");
    }

    let completions = AnthropicClient::new(anthropic_key, &config.anthropic);
    let publisher = ThreadsPublisher::new(&config.threads, access_token, media)
        .connect()
        .await;
    if !publisher.is_logged_in() {
        warn!("not logged in to Threads; replies will not be mirrored");
    }

    let pipeline = Pipeline::new(
        Arc::new(completions),
        Arc::new(publisher),
        SessionStore::new(),
    );
    let app = build_app(AppState { pipeline }, config.server.request_timeout_seconds);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
