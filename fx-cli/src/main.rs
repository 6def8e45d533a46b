//! FX CLI
//!
//! Command-line interface for the FX gateway API.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use fx_client::FxClient;

#[derive(Parser)]
#[command(name = "fx")]
#[command(author, version, about = "FX gateway CLI client", long_about = None)]
struct Cli {
    /// Base URL of the FX gateway
    #[arg(long, env = "FX_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Client identity sent as X-Client-Id
    #[arg(long, env = "FX_CLIENT_ID")]
    client_id: Option<String>,

    /// Rate provider (server default when omitted)
    #[arg(long, env = "FX_PROVIDER")]
    provider: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Latest rates for a base currency
    Latest {
        /// Base currency, e.g. USD
        base: String,
    },
    /// Convert an amount between currencies
    Convert {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: Decimal,
    },
    /// Daily rates over a date range
    Historical {
        /// Base currency
        #[arg(long)]
        from: String,
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last day (YYYY-MM-DD), today when omitted
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Check whether a currency code is supported
    Supported { code: String },
    /// List registered providers
    Providers,
    /// Check API health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut client = FxClient::new(&cli.api_url);
    if let Some(id) = cli.client_id {
        client = client.with_client_id(id);
    }
    if let Some(provider) = cli.provider {
        client = client.with_provider(provider);
    }

    match cli.command {
        Commands::Health => {
            let health = client.health().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
            if !health.is_healthy() {
                std::process::exit(1);
            }
        }

        Commands::Latest { base } => {
            let snapshot = client.latest(&base).await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }

        Commands::Convert { from, to, amount } => {
            let result = client.convert(&from, &to, amount).await?;
            println!(
                "{} {} = {} {} (rate {})",
                result.amount, result.from, result.converted_amount, result.to, result.rate
            );
        }

        Commands::Historical {
            from,
            start,
            end,
            page,
            page_size,
        } => {
            let page = client
                .historical(&from, start, end, page, page_size)
                .await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }

        Commands::Supported { code } => {
            let response = client.is_supported(&code).await?;
            if response.supported {
                println!("✓ {} is supported", response.code);
            } else {
                println!("✗ {} is not supported", response.code);
            }
        }

        Commands::Providers => {
            let providers = client.providers().await?;
            for name in &providers.providers {
                let marker = if *name == providers.default { " (default)" } else { "" };
                println!("{}{}", name, marker);
            }
        }
    }

    Ok(())
}
