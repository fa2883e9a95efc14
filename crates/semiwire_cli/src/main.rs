use std::net::SocketAddr;

use clap::Parser;
use tracing::info;

use semiwire_core::{QueryPolicy, Result};
use semiwire_storage::create_store;
use semiwire_web::{create_app, AppState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Storage backend to query.
    #[arg(long, default_value = "postgres")]
    storage: String,
    /// Only serve articles whose metadata generation has completed.
    #[arg(long)]
    metadata_only: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the article query API.
    Serve {
        #[arg(long, default_value = "0.0.0.0:3000")]
        listen: SocketAddr,
    },
    /// Probe the configured backend and exit.
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let policy = QueryPolicy {
        require_metadata: cli.metadata_only,
    };
    let store = create_store(cli.storage.as_str(), policy)?;

    match cli.command {
        Commands::Serve { listen } => {
            info!("💾 Checking storage connection...");
            store.ping().await?;
            info!("✨ Storage initialized successfully (using {})", cli.storage);

            let app = create_app(AppState {
                store: store.clone(),
            })
            .await;

            let listener = tokio::net::TcpListener::bind(listen).await?;
            info!("🌐 Serving articles on {}", listen);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            store.close().await;
            info!("Storage connections closed");
        }
        Commands::Check => {
            store.ping().await?;
            info!("✨ Storage backend is reachable (using {})", cli.storage);
            store.close().await;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
