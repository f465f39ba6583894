//! Curve Tracker - TVL, APY and rewards for Curve pools
//!
//! Run with: cargo run -- --pool 3pool --yearn
//!
//! With no `--pool`/`--pools`, tracks 3pool, steth and frxeth on Ethereum.

use clap::Parser;
use color_eyre::eyre::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use curve_tracker::pipeline::load_batch_file;
use curve_tracker::report::{render_json, render_table, CsvExporter};
use curve_tracker::{Chain, Config, ExportMode, HttpProviderClient, Pipeline, PoolRequest, SecondaryFlags};

#[derive(Parser, Debug)]
#[command(name = "curve-tracker", version, about = "Track TVL, APY and rewards of Curve pools")]
struct Args {
    /// Chain for --pool and for batch entries without one
    #[arg(short, long)]
    chain: Option<String>,

    /// Pool address or name (repeatable)
    #[arg(short, long)]
    pool: Vec<String>,

    /// JSON batch file: [{"chain"?, "pool", "yearn"?, "stakedao"?}]
    #[arg(short = 'P', long)]
    pools: Option<PathBuf>,

    /// Include Yearn vault data
    #[arg(long)]
    yearn: bool,

    /// Include StakeDAO strategy data
    #[arg(long)]
    stakedao: bool,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Export CSV sheets into this directory
    #[arg(long)]
    export: Option<PathBuf>,

    #[arg(long, value_enum)]
    export_mode: Option<ExportMode>,

    /// Requests resolved concurrently
    #[arg(long)]
    concurrency: Option<usize>,

    /// Print records as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn print_banner() {
    println!();
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!("{}", style(" 📈 CURVE TRACKER - Pool TVL, APY & Rewards").cyan().bold());
    println!("{}", style("    Curve | Yearn | StakeDAO").cyan());
    println!(
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    );
    println!();
}

fn init_tracing(verbose: bool) -> Result<()> {
    let directive = if verbose { "curve_tracker=debug" } else { "curve_tracker=info" };

    // stderr keeps --json output clean
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();
    Ok(())
}

fn apply_cli_overrides(config: &mut Config, args: &Args) {
    if let Some(chain) = &args.chain {
        config.default_chain = chain.clone();
    }
    if args.yearn {
        config.enable_yearn = true;
    }
    if args.stakedao {
        config.enable_stakedao = true;
    }
    if let Some(n) = args.concurrency {
        config.batch_concurrency = n;
    }
    if let Some(dir) = &args.export {
        config.export_dir = Some(dir.clone());
    }
    if let Some(mode) = args.export_mode {
        config.export_mode = mode;
    }
}

/// Batch file entries first, then every --pool; defaults when neither is given
fn build_requests(args: &Args, chain: &Chain, flags: SecondaryFlags) -> Result<Vec<PoolRequest>> {
    let mut requests = match &args.pools {
        Some(path) => load_batch_file(path, chain, flags)?,
        None => Vec::new(),
    };
    requests.extend(args.pool.iter().map(|id| PoolRequest::new(chain.clone(), id.as_str(), flags)));

    if requests.is_empty() && args.pools.is_none() {
        requests = PoolRequest::defaults(flags);
    }
    Ok(requests)
}

fn spinner(hidden: bool, message: String) -> Result<ProgressBar> {
    if hidden {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    Ok(pb)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    color_eyre::install()?;
    init_tracing(args.verbose)?;

    let mut config = Config::load(args.config.as_deref())?;
    apply_cli_overrides(&mut config, &args);
    config.validate()?;

    if !args.json {
        print_banner();
        if args.verbose {
            config.print_summary();
            println!();
        }
    }

    let chain = config.default_chain();
    let flags = SecondaryFlags {
        yearn: config.enable_yearn,
        stakedao: config.enable_stakedao,
    };
    let requests = build_requests(&args, &chain, flags)?;
    debug!("{} request(s), concurrency {}", requests.len(), config.batch_concurrency);

    let client = Arc::new(HttpProviderClient::new(&config)?);
    let pipeline = Pipeline::new(client, config.batch_concurrency);

    let started = Instant::now();
    let pb = spinner(args.json, format!("Tracking {} pool(s)...", requests.len()))?;
    let records = pipeline.resolve_many(&requests).await;
    pb.finish_and_clear();

    if args.json {
        println!("{}", render_json(&records)?);
    } else {
        println!("{}", render_table(&records));
    }

    if let Some(dir) = &config.export_dir {
        let written = CsvExporter::new(dir, config.export_mode).export(&records)?;
        if !args.json {
            for path in &written {
                println!("  {} {}", style("✓ Exported").green(), path.display());
            }
        }
    }

    info!(
        "{}/{} pools resolved in {:.1}s ({} API calls)",
        records.len(),
        requests.len(),
        started.elapsed().as_secs_f64(),
        pipeline.cache().network_fetches()
    );

    Ok(())
}
