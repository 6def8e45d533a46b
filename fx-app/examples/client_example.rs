//! Client example exercising every endpoint against an in-process server.
//!
//! Uses the offline `fixed` provider, so no network access is needed.
//! Run with: cargo run -p fx-app --example client_example

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{Days, Utc};
use exchange_rates::{CircuitBreaker, FIXED, FixedRateProvider, ProviderFactory};
use fx_client::FxClient;
use fx_hex::{RateService, inbound::HttpServer};
use rust_decimal::Decimal;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;

    println!("🚀 Starting server on {addr}...");

    let breaker = Arc::new(CircuitBreaker::default());
    let factory = ProviderFactory::new(FIXED).with_provider(Arc::new(FixedRateProvider::default()));
    let server = HttpServer::new(RateService::new(Arc::new(factory)), breaker);
    let router = server.router();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router.into_make_service()).await {
            eprintln!("server error: {e}");
        }
    });

    let client = FxClient::new(format!("http://{addr}")).with_client_id("example");

    let health = client.health().await?;
    println!("✅ Server health: {}", health.status);

    let providers = client.providers().await?;
    println!("✅ Providers: {:?} (default {})", providers.providers, providers.default);

    let latest = client.latest("usd").await?;
    println!("✅ Latest {} rates as of {}:", latest.base(), latest.date());
    for (code, rate) in latest.rates() {
        println!("   {code}: {rate}");
    }

    let conversion = client.convert("EUR", "INR", Decimal::new(25000, 2)).await?;
    println!(
        "✅ {} {} = {} {}",
        conversion.amount, conversion.from, conversion.converted_amount, conversion.to
    );

    let today = Utc::now().date_naive();
    let start = today.checked_sub_days(Days::new(13)).unwrap_or(today);
    let page = client.historical("GBP", start, None, Some(2), Some(5)).await?;
    println!(
        "✅ Historical page {}/{} ({} days total)",
        page.page, page.total_pages, page.total_items
    );

    for code in ["CHF", "TRY", "EURO"] {
        let supported = client.is_supported(code).await?;
        println!("   {} supported: {}", supported.code, supported.supported);
    }

    match client.convert("USD", "PLN", Decimal::ONE).await {
        Err(e) => println!("✅ Excluded currency rejected: {e}"),
        Ok(_) => anyhow::bail!("PLN should be rejected"),
    }

    println!("\n🎉 Example completed successfully!");
    Ok(())
}
