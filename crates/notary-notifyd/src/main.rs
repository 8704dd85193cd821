/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! notary-notifyd - runs the notification delivery engine against a SQLite
//! database until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use notary_notify::{
    generate_signing_keypair, AttestationSigner, Database, HttpDeliveryClient,
    NotificationProcessor, QueueScheduler, DAL,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod settings;

use settings::Settings;

/// Delivers signed case outcomes to registered callbacks
#[derive(Parser)]
#[command(name = "notary-notifyd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the delivery engine until interrupted
    Run(RunArgs),
    /// Print a fresh Ed25519 key pair as base64
    GenerateKey,
}

#[derive(Args)]
struct RunArgs {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database URL (can also be set via DATABASE_URL environment variable)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Base64 Ed25519 public key
    #[arg(long, env = "NOTARY_ED25519_PUBLIC_KEY")]
    public_key: String,

    /// Base64 Ed25519 secret key (32-byte seed or 64-byte key pair)
    #[arg(long, env = "NOTARY_ED25519_SECRET_KEY", hide_env_values = true)]
    secret_key: String,

    /// Milliseconds between processing passes
    #[arg(long, env = "NOTARY_PROCESSING_INTERVAL_MS")]
    processing_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json_logs);

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::GenerateKey => {
            let keypair = generate_signing_keypair();
            println!("NOTARY_ED25519_PUBLIC_KEY={}", keypair.public_key_base64());
            println!("NOTARY_ED25519_SECRET_KEY={}", keypair.private_key_base64());
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let config = settings
        .notifier_config(args.processing_interval_ms)
        .context("Invalid engine configuration")?;

    let database_url = args
        .database_url
        .or(settings.database_url)
        .context("Database URL is required. Set --database-url, DATABASE_URL, or database_url in the settings file")?;

    let signer = AttestationSigner::from_base64(&args.public_key, &args.secret_key)
        .context("Invalid Ed25519 key pair")?;
    info!(key_fingerprint = %signer.fingerprint(), "Attestation key loaded");

    let database = Database::new(&database_url).context("Failed to open database")?;
    database
        .run_migrations()
        .await
        .context("Failed to run database migrations")?;

    let deliverer =
        HttpDeliveryClient::from_config(&config).context("Failed to build delivery client")?;
    let processor = NotificationProcessor::new(
        Arc::new(DAL::new(database)),
        Arc::new(deliverer),
        Arc::new(signer),
        &config,
    );

    let scheduler = QueueScheduler::new(Arc::new(processor), &config);
    scheduler.start();
    // Flush whatever is already due instead of waiting a full interval.
    scheduler.schedule_processing();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received, waiting for in-flight deliveries");
    scheduler.shutdown().await;

    Ok(())
}
