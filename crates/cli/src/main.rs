//! Sweet Delights CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sd-cli migrate
//!
//! # Seed the catalog with starter products
//! sd-cli seed
//!
//! # Grant or revoke admin rights
//! sd-cli admin grant -e owner@sweet-delights.ru
//! sd-cli admin revoke -e owner@sweet-delights.ru
//!
//! # Expire overdue gift certificates (run from cron)
//! sd-cli certificates expire
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sd-cli")]
#[command(author, version, about = "Sweet Delights CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog with starter products
    Seed,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Gift certificate housekeeping
    Certificates {
        #[command(subcommand)]
        action: CertificateAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Grant admin rights to an existing user
    Grant {
        /// User's email address
        #[arg(short, long)]
        email: String,
    },
    /// Revoke admin rights
    Revoke {
        /// User's email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum CertificateAction {
    /// Mark every past-expiry certificate expired
    Expire,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sd_cli=info,sweet_delights_storefront=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Seed => commands::seed::run().await,
        Commands::Admin {
            action: AdminAction::Grant { email },
        } => commands::admin::set_admin(&email, true).await,
        Commands::Admin {
            action: AdminAction::Revoke { email },
        } => commands::admin::set_admin(&email, false).await,
        Commands::Certificates {
            action: CertificateAction::Expire,
        } => commands::certificates::expire().await,
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
