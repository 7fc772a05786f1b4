//! GradeVault - grade-management backend
//!
//! Single binary exposing the generic table-oriented RPC surface:
//! - select/selectList/insert/update/delete over operation descriptors
//! - field-level encryption for sensitive columns
//! - JWT authentication with role-gated operations
//! - append-only audit logging

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

use clap::{Parser, Subcommand};
use tracing::info;
use anyhow::Result;

mod config;
mod server;

use server::VaultServer;

#[derive(Parser)]
#[command(name = "gradevault")]
#[command(author, version, about = "GradeVault - grade-management backend", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the GradeVault server
    Server {
        /// Configuration file path
        #[arg(short, long, default_value = "/etc/gradevault/gradevault.toml")]
        config: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gradevault=info".parse()?),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server { config } => {
            info!("Starting GradeVault server...");

            let config = config::load(&config).await?;
            let server = VaultServer::new(config).await?;

            // Handle shutdown gracefully
            let shutdown = async {
                tokio::signal::ctrl_c().await.ok();
                info!("Shutdown signal received");
            };

            tokio::select! {
                result = server.run() => result?,
                _ = shutdown => {
                    server.shutdown().await?;
                }
            }
        }

        Commands::Version => {
            println!("GradeVault version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
