use std::path::PathBuf;

use anyhow::Result;
use chatsync_infrastructure::ConfigService;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "chatsync")]
#[command(about = "chatsync CLI - drive the chat synchronization store", long_about = None)]
struct Cli {
    /// Path to config.toml (takes precedence over CHATSYNC_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Id of the signed-in user
    #[arg(long = "as", global = true, default_value = "me")]
    self_id: String,

    /// Print snapshots as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List contacts in recency order
    Contacts {
        /// Comma-separated ids of users currently online
        #[arg(long, value_delimiter = ',')]
        online: Vec<String>,
        /// Only show online contacts
        #[arg(long)]
        online_only: bool,
    },
    /// Show the conversation with a user
    History { user_id: String },
    /// Send a message to a user
    Send {
        user_id: String,
        text: String,
        /// Image attachment URL
        #[arg(long)]
        image: Option<String>,
    },
    /// Read realtime frames from stdin and print each resulting snapshot
    Watch {
        /// Open this conversation before reading frames
        #[arg(long)]
        select: Option<String>,
    },
    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConfigService::new(cli.config.clone()).load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let output = commands::Output { json: cli.json };
    match cli.command {
        Commands::Contacts {
            online,
            online_only,
        } => commands::contacts::run(&config, &cli.self_id, online, online_only, output).await?,
        Commands::History { user_id } => {
            commands::history::run(&config, &cli.self_id, &user_id, output).await?
        }
        Commands::Send {
            user_id,
            text,
            image,
        } => commands::send::run(&config, &cli.self_id, &user_id, text, image, output).await?,
        Commands::Watch { select } => {
            commands::watch::run(&config, &cli.self_id, select.as_deref(), output).await?
        }
        Commands::Config => commands::show_config(&config)?,
    }

    Ok(())
}
