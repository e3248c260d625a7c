mod config;
mod config_watcher;
mod converters;
mod error;
mod llm_client;
mod logging;
mod models;
mod provider_check;
mod request_id;
mod router;
mod state;

use clap::Parser;
use config::Config;
use state::AppState;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{Level, info, warn};

#[derive(Parser, Debug)]
#[command(name = "startmind-relay")]
#[command(about = "Relays chat conversations to a Gemini generateContent endpoint")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    ip: String,

    #[arg(short, long, env = "PORT", default_value = "3001")]
    port: u16,

    /// Optional YAML config file; watched for changes
    #[arg(short, long)]
    config: Option<String>,

    /// trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Also write logs to this file (size-capped)
    #[arg(long)]
    log_file: Option<String>,

    /// socks and http proxy, example: socks5://192.168.0.2:10080
    #[arg(long)]
    proxy: Option<String>,

    /// Ping the provider once and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must be loaded before clap reads PORT
    let dotenv = dotenvy::dotenv();
    let args = Args::parse();

    let log_level = Level::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using INFO level.", args.log_level);
        Level::INFO
    });
    logging::init_logging(log_level, args.log_file.as_deref());

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let config = Config::load(args.config.as_deref())?;
    match &args.config {
        Some(path) => info!("Configuration loaded successfully from: {}", path),
        None => info!("No config file given, using defaults and environment"),
    }
    if config.provider.api_key().is_none() {
        warn!("{} is not set; generation requests will fail", config::API_KEY_ENV);
    }

    let client_builder = reqwest::Client::builder();
    let client_builder = if let Some(proxy) = &args.proxy {
        client_builder.proxy(reqwest::Proxy::all(proxy)?)
    } else {
        client_builder
    };
    let http_client = Arc::new(client_builder.build()?);
    let llm_client = Arc::new(llm_client::LlmClient::new(http_client));

    if args.check {
        return provider_check::perform_provider_check(&config.provider, &llm_client).await;
    }

    let shared_config = Arc::new(RwLock::new(config));

    if let Some(config_path) = args.config.clone() {
        if let Err(e) = config_watcher::spawn_config_watcher(
            config_path,
            shared_config.clone(),
            |key| std::env::var(key).ok(),
        ) {
            warn!("Config file watcher error: {}", e);
        }
    }

    let app = router::build_router(AppState::new(shared_config, llm_client));

    let bind_address = format!("{}:{}", args.ip, args.port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server started on http://{}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
