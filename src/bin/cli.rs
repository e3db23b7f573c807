//! Card Crawler CLI
//!
//! Local execution entry point for the scrape and image download jobs.

use std::path::PathBuf;

use card_crawler::{
    error::Result,
    models::Config,
    pipeline::{self, ScrapeMode},
};
use clap::{Parser, Subcommand};

/// Card Crawler - credit card listing scraper
#[derive(Parser, Debug)]
#[command(
    name = "card-crawler",
    version,
    about = "Credit card listing scraper and image downloader"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape listing pages and merge them into the card store
    Scrape {
        /// Comma-separated page numbers (e.g. 47,48); all pages if omitted
        pages: Option<String>,
    },

    /// Download card and brand images referenced by the card store
    Images {
        /// Card store to read (default: {data_dir}/credit_cards_all.json)
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Validate configuration and selectors
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Scrape { pages } => {
            let mode = match ScrapeMode::from_arg(pages.as_deref()) {
                Ok(mode) => mode,
                Err(e) => {
                    log::error!("{}", e);
                    log::error!("Example: card-crawler scrape 47,48");
                    return Err(e);
                }
            };
            config.validate()?;
            pipeline::run_scraper(&config, &mode).await?;
        }

        Command::Images { store } => {
            let store = store
                .unwrap_or_else(|| ScrapeMode::FullRange.store_path(&config.paths.data_dir));
            log::info!("Reading card store {}", store.display());
            pipeline::run_image_download(&config, &store).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK (source, selectors, labels, delays)");
            log::info!("Listing page 1: {}", config.source.page_url(1)?);
        }
    }

    log::info!("Done!");

    Ok(())
}
