//! Diagnostic tool - Check configuration and provider reachability
//!
//! Run with: cargo run --bin diagnose [chain]

use color_eyre::eyre::Result;
use console::style;
use std::env;
use std::time::Instant;

use curve_tracker::providers::{Scope, Source};
use curve_tracker::{Chain, Config, HttpProviderClient, ProviderClient};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("curve_tracker=warn".parse()?),
        )
        .init();

    println!("🔍 CURVE TRACKER DIAGNOSTIC CHECK\n");

    let config = Config::load(None)?;
    config.print_summary();

    if let Err(e) = config.validate() {
        println!("\n  {} {}", style("❌ Invalid configuration:").red(), e);
        return Ok(());
    }

    let chain = env::args().nth(1).map(Chain::new).unwrap_or_else(|| config.default_chain());
    let client = HttpProviderClient::new(&config)?;

    println!("\n═══════════════════════════════════════════════════");
    println!("           PROVIDERS ({})", chain.title());
    println!("═══════════════════════════════════════════════════\n");

    if chain.chain_id().is_none() {
        println!("  ⚠️  No chain id for '{}': Yearn and StakeDAO will be skipped\n", chain);
    }

    let mut failures = 0;
    for source in Source::ALL {
        let scope = Scope::new(&chain, source);
        let Some(url) = client.endpoint(&scope) else {
            println!("  {:<22} {}", source.to_string(), style("- no endpoint").dim());
            continue;
        };

        let started = Instant::now();
        let response = client.fetch(&scope).await;
        let elapsed = started.elapsed().as_millis();

        if response.is_empty() {
            failures += 1;
            println!("  {:<22} {} ({} ms)", source.to_string(), style("❌ empty").red(), elapsed);
        } else {
            println!(
                "  {:<22} {} {} entries ({} ms)",
                source.to_string(),
                style("✅").green(),
                response.len(),
                elapsed
            );
        }
        println!("    └─ {}\n", url);
    }

    println!("═══════════════════════════════════════════════════");
    println!("                     STATUS                         ");
    println!("═══════════════════════════════════════════════════\n");

    if failures == 0 {
        println!("  {}", style("All providers responded").green().bold());
    } else {
        println!(
            "  {}",
            style(format!("{} listing(s) came back empty - see warnings above", failures))
                .yellow()
                .bold()
        );
    }

    Ok(())
}
