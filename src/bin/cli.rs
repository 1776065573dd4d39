// src/bin/cli.rs

//! pricewatch CLI
//!
//! Runs the scheduled jobs on demand for local development and testing.
//! Configuration comes from the environment (see `config` module); point
//! `STORAGE_URL` at a `file://` root for local runs.

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;

use pricewatch::config::AppConfig;
use pricewatch::error::Result;
use pricewatch::jobs::{FuelPriceJob, TopupOfferJob};
use pricewatch::notify::TelegramNotifier;
use pricewatch::scrape::fuel::FuelPriceScraper;
use pricewatch::scrape::number::scrape_first_number;
use pricewatch::scrape::offer::OfferScraper;
use pricewatch::storage;
use pricewatch::utils::create_client;

#[derive(Parser, Debug)]
#[command(
    name = "pricewatch",
    version,
    about = "Scheduled scrape-compare-notify jobs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the fuel-card price and record it on change
    Fuel,
    /// Check for an active top-up offer and post it once per day
    Topup,
    /// Extract the first number from a page and print it as JSON
    ScrapeNumber {
        #[arg(long)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let client = create_client()?;

    match cli.command {
        Command::Fuel => {
            let store = storage::from_target(&config.storage).await?;
            let scraper = FuelPriceScraper::new(client, config.fuel()?.clone());
            let outcome = FuelPriceJob::new(store.as_ref(), &scraper)
                .run(Utc::now())
                .await?;
            info!("Fuel job finished: {}", outcome.label());
        }
        Command::Topup => {
            let store = storage::from_target(&config.storage).await?;
            let notifier = TelegramNotifier::new(client.clone(), config.telegram()?);
            let scraper = OfferScraper::new(client);
            let outcome = TopupOfferJob::new(store.as_ref(), &notifier, &scraper)
                .run(Utc::now())
                .await?;
            info!("Topup job finished: {}", outcome.label());
        }
        Command::ScrapeNumber { url } => {
            let number = scrape_first_number(&client, &url, config.browser.as_ref()).await?;
            println!("{}", serde_json::json!({ "number": number }));
        }
    }

    Ok(())
}
