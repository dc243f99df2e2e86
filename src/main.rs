use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use fairstock::analysis::fair_price;
use fairstock::analysis::screener::{
    GrahamScreener, LynchScreener, MarksScreener, QualityScreener, SrimScreener,
};
use fairstock::api::filings_client::FilingsApiClient;
use fairstock::api::price_client::PriceApiClient;
use fairstock::api::{EndOfDayPriceProvider, FilingsProvider};
use fairstock::config::Config;
use fairstock::database::snapshot_file::JsonSnapshotStore;
use fairstock::database::store::StockStore;
use fairstock::database::{connect, SnapshotSource};
use fairstock::models::fair_price::{OutlierReason, PerHealth};
use fairstock::models::screening::ScreenCandidate;

#[derive(Parser)]
#[command(name = "fairstock", about = "Korean stock fair-value aggregation and screening")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the fair-price aggregate for one company
    Fairprice {
        /// 6-digit ticker, e.g. 005930
        ticker: String,
        /// Read from the static JSON snapshot directory instead of the store
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a screening strategy over the full universe
    Screen {
        strategy: Strategy,
        /// Maximum candidates to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Look up a close price from the securities-price API
    Price {
        /// 6-digit ticker, e.g. 005930
        ticker: String,
        /// Fetch the year-end close for this year instead of the latest
        #[arg(long)]
        year: Option<i32>,
    },
    /// Fetch annual financial-statement line items from the filings API
    Filings {
        /// Filings-registry corporation code (8 digits)
        corp_code: String,
        /// Business year, e.g. 2025
        year: i32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    Graham,
    Lynch,
    Srim,
    Quality,
    Marks,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Fairprice {
            ticker,
            snapshot_dir,
            json,
        } => run_fairprice(&config, &ticker, snapshot_dir, json).await,
        Commands::Screen { strategy, limit } => run_screen(&config, strategy, limit).await,
        Commands::Price { ticker, year } => run_price(&config, &ticker, year).await,
        Commands::Filings { corp_code, year } => run_filings(&config, &corp_code, year).await,
    }
}

async fn run_fairprice(
    config: &Config,
    ticker: &str,
    snapshot_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let source: Box<dyn SnapshotSource> =
        match snapshot_dir.or_else(|| config.snapshot_dir.clone()) {
            Some(dir) => Box::new(JsonSnapshotStore::new(dir)),
            None => {
                let pool = connect(&config.database_url).await?;
                Box::new(StockStore::new(pool))
            }
        };

    // Both lookups are independent; the engine needs them both.
    let snapshot = source.fetch_snapshot(ticker).await?;
    let price = source.fetch_latest_price(ticker).await?;
    let (Some(snapshot), Some(price)) = (snapshot, price) else {
        println!("No data found for {ticker}.");
        return Ok(());
    };

    let results = fair_price::calculate(&snapshot, &price);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("{} ({})", results.company_name, results.ticker);
    println!(
        "  fair-price range: {:.0} / {:.0} / {:.0}",
        results.low_range, results.mid_range, results.high_range
    );
    match results.price_ratio {
        Some(ratio) => println!(
            "  current price {:.0} ({:.0}% of mid range)",
            results.current_price,
            ratio * 100.0
        ),
        None => println!(
            "  current price {:.0} (ratio unavailable: no mid range)",
            results.current_price
        ),
    }
    println!(
        "  trust {:.1}/10, risk {:.2}",
        results.trust_score, results.risk_score
    );
    match results.per_health {
        PerHealth::Negative => println!("  caveat: company currently posting losses"),
        PerHealth::ExtremeHigh => println!("  caveat: PER very high, overvaluation risk"),
        PerHealth::Normal => {}
    }
    for item in &results.models.all {
        let flag = match item.reason {
            Some(OutlierReason::NegativeOrZero) => "  [flagged: negative_or_zero]",
            Some(OutlierReason::ValueRange) => "  [flagged: value_range]",
            None => "",
        };
        println!("  {:<18} {:>12.0}{}", item.name, item.value, flag);
    }
    for item in &results.models.srim_scenarios {
        println!("  {:<18} {:>12.0}  [reference only]", item.name, item.value);
    }
    if results.outliers.has_outliers {
        println!(
            "  {} model(s) excluded from the reliable set (median {:.0})",
            results.outliers.outliers.len(),
            results.outliers.median
        );
    }
    Ok(())
}

async fn run_screen(config: &Config, strategy: Strategy, limit: usize) -> Result<()> {
    let pool = connect(&config.database_url).await?;
    let store = StockStore::new(pool);

    let mut candidates = match strategy {
        Strategy::Graham => GrahamScreener::new(store).run().await?,
        Strategy::Lynch => LynchScreener::new(store).run().await?,
        Strategy::Srim => SrimScreener::new(store).run().await?,
        Strategy::Quality => QualityScreener::new(store).run().await?,
        Strategy::Marks => MarksScreener::new(store).run().await?,
    };

    if candidates.is_empty() {
        println!("No stocks match current criteria.");
        return Ok(());
    }

    candidates.truncate(limit);
    print_candidates(&candidates);
    Ok(())
}

async fn run_price(config: &Config, ticker: &str, year: Option<i32>) -> Result<()> {
    let client = PriceApiClient::new(config.price_api_base.as_str(), config.price_api_key.as_str())?;
    let close = match year {
        Some(year) => client.year_end_close(ticker, year).await?,
        None => client.latest_close(ticker).await?,
    };
    match close {
        Some(price) => println!("{ticker}: {price:.0}"),
        None => println!("No close price found for {ticker}."),
    }
    Ok(())
}

async fn run_filings(config: &Config, corp_code: &str, year: i32) -> Result<()> {
    let client = FilingsApiClient::new(
        config.filings_api_base.as_str(),
        config.filings_api_key.as_str(),
    )?;
    let items = client.annual_line_items(corp_code, year).await?;
    if items.is_empty() {
        println!("No filings found for {corp_code} in {year}.");
        return Ok(());
    }
    for item in items {
        println!(
            "{:<40} {:>18.0} {:>18.0} {:>18.0}  {}",
            item.account_id, item.current, item.prior, item.prior_prior, item.account_name
        );
    }
    Ok(())
}

fn print_candidates(candidates: &[ScreenCandidate]) {
    for c in candidates {
        println!(
            "{:>3}. {} ({}) price {:.0}, intrinsic {:.0}, margin {:.0}%",
            c.rank,
            c.company_name,
            c.ticker,
            c.current_price,
            c.intrinsic_value,
            c.margin_of_safety * 100.0
        );
        println!("     {}", c.reasoning);
    }
}
