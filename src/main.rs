use clap::{Parser, Subcommand};
use tracing::{error, info};

use ct_scraper::classify::load_taxonomies;
use ct_scraper::config::Config;
use ct_scraper::logging;
use ct_scraper::pipeline::PipelineDriver;
use ct_scraper::registry::RegistryClient;

#[derive(Parser)]
#[command(name = "ct_scraper")]
#[command(about = "ClinicalTrials.gov clinical trial data scraper")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, clean, and export the current registry snapshot. An
    /// external scheduler owns the monthly cadence.
    Run {
        /// Path to the configuration file
        #[arg(long, default_value = "config.toml")]
        config: String,
        /// Override the maximum number of records to download
        #[arg(long)]
        max_records: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            max_records,
        } => {
            let mut config = Config::load_or_default(&config)?;
            if let Some(max_records) = max_records {
                config.registry.max_records = max_records;
            }

            let taxonomies = load_taxonomies(&config.paths.keywords_dir)?;
            info!("Loaded {} keyword taxonomies", taxonomies.len());

            let fetcher = Box::new(RegistryClient::new(config.registry.clone()));
            let driver = PipelineDriver::new(fetcher, taxonomies, config);

            println!("🔄 Refreshing clinical trial data...");
            match driver.run().await {
                Ok(summary) => {
                    println!("\n📊 Pipeline Results:");
                    println!("   Pages fetched: {}", summary.pages_fetched);
                    println!("   Records extracted: {}", summary.records_extracted);
                    println!("   Records after sponsor filter: {}", summary.records_filtered);
                    println!(
                        "   Output files: {}, {}",
                        summary.all_sponsors_file.display(),
                        summary.sponsor_filtered_file.display()
                    );
                    println!("✅ Run completed successfully");
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    println!("❌ Pipeline failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}
