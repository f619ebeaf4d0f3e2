use anyhow::Result;
use clap::Parser;

use homefinder::{Config, Listing, SearchClient, SearchQuery};

#[derive(Parser, Debug)]
#[command(name = "homefinder")]
#[command(about = "Scrapes realtor.com search results into structured JSON", long_about = None)]
struct Args {
    /// Location to search, e.g. "Scottsdale_AZ"
    location: String,

    #[arg(long)]
    min_price: Option<u64>,

    #[arg(long)]
    max_price: Option<u64>,

    /// Property types, e.g. "single-family-home,condo"
    #[arg(long, value_delimiter = ',')]
    property_types: Vec<String>,

    #[arg(long)]
    min_beds: Option<u64>,

    #[arg(long)]
    max_beds: Option<u64>,

    #[arg(long)]
    min_baths: Option<u64>,

    #[arg(long)]
    max_baths: Option<u64>,

    /// Listing status filter, e.g. "recently_sold"
    #[arg(long)]
    show: Option<String>,

    /// Maximum number of result pages to fetch
    #[arg(long, default_value_t = 1)]
    pages: u32,

    /// Skip per-listing detail pages
    #[arg(long)]
    no_details: bool,

    /// Write results to a file instead of stdout
    #[arg(long)]
    output: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;
    if args.no_details {
        config.deep_fetch = false;
    }

    init_tracing(&config);

    let query = SearchQuery {
        price_min: args.min_price,
        price_max: args.max_price,
        property_types: args.property_types,
        beds_min: args.min_beds,
        beds_max: args.max_beds,
        baths_min: args.min_baths,
        baths_max: args.max_baths,
        listing_status: args.show,
    };

    let client = SearchClient::new(&config)?;
    let mut results = client.find(&args.location, &query).await?;

    let mut collected: Vec<Listing> = Vec::new();
    let mut fetched_pages = 0;

    loop {
        for failure in &results.page().failures {
            tracing::warn!("Dropped listing {}: {}", failure.url, failure.error);
        }
        collected.extend(results.page().listings.iter().cloned());
        fetched_pages += 1;

        if fetched_pages >= args.pages || !results.has_next_page() {
            break;
        }
        results.next_page().await?;
    }

    tracing::info!(
        "Collected {} listings across {} pages ({} total results reported)",
        collected.len(),
        fetched_pages,
        results.page().total_count
    );

    let json = serde_json::to_string_pretty(&collected)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!("Results written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn init_tracing(config: &Config) {
    // RUST_LOG wins over the configured level, same as any other tracing
    // consumer would expect.
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
        return;
    }

    let level = match config.tracing_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        other => {
            eprintln!("Invalid tracing level '{}', using 'info'", other);
            tracing::Level::INFO
        }
    };

    tracing_subscriber::fmt().with_max_level(level).init();
}
