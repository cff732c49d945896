//! smish-guard command line
//!
//! # Usage
//!
//! ```bash
//! # Run the console with the network listener enabled
//! smish-guard run --config config.toml
//!
//! # Send a message to a running instance
//! smish-guard send --addr 127.0.0.1:5050 --sender +15550100 "Your account is locked"
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use smish_guard::classifier::Classifier;
use smish_guard::config::{Config, LoggingConfig};
use smish_guard::console::Console;
use smish_guard::listener::MessageClient;
use smish_guard::runtime::Runtime;
use smish_guard::store::LogStore;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "smish-guard")]
#[command(about = "Classify SMS messages as legit, spam or smishing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the operator console and the network listener
    Run {
        /// TOML configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,

        /// Do not start the network listener
        #[arg(long)]
        no_network: bool,
    },
    /// Send one message to a running listener
    Send {
        /// Listener address
        #[arg(short, long, default_value = "127.0.0.1:5050")]
        addr: String,
        /// Sender shown in the log
        #[arg(short, long)]
        sender: Option<String>,
        /// Message text
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, no_network } => {
            let config = Config::load(Some(config.as_path())).context("Failed to load configuration")?;
            init_logging(&config.logging)?;
            run(config, !no_network).await
        }
        Commands::Send { addr, sender, text } => {
            init_logging(&Config::default().logging)?;
            MessageClient::new(addr.as_str())
                .send(sender.as_deref(), &text)
                .await
                .with_context(|| format!("Failed to send message to {}", addr))
        }
    }
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // stdout belongs to the console
    match logging.format.as_str() {
        "json" => tracing::subscriber::set_global_default(builder.json().finish()),
        _ => tracing::subscriber::set_global_default(builder.pretty().finish()),
    }
    .context("Failed to set tracing subscriber")
}

async fn run(config: Config, network: bool) -> anyhow::Result<()> {
    info!("Starting smish-guard");
    info!("  Listening on: {}", config.listener.listen_addr);
    info!("  Model: {}", config.model.model_path);
    info!("  Vectorizer: {}", config.model.vectorizer_path);
    info!("  Combined log: {}", config.export.combined_log_path);

    let classifier = Classifier::load(&config.model);
    let (runtime, handle, events) = Runtime::spawn(&config, classifier, LogStore::new());

    if network {
        // failures are reported to the operator through the event stream
        if let Err(e) = handle.start_network().await {
            error!("Network listener unavailable: {}", e);
        }
    }

    let console = Console::new(
        handle,
        events,
        PathBuf::from(&config.export.combined_log_path),
    );
    let result = console.run().await;

    if let Err(e) = runtime.await {
        error!("Runtime task failed: {}", e);
    }

    info!("smish-guard stopped");
    result.map_err(Into::into)
}
