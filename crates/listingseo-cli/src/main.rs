mod analysis;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use listingseo_core::{AnalysisStore, Marketplace};
use listingseo_engine::EngineServices;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "listingseo-cli")]
#[command(about = "Listing SEO analysis command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Run the analysis workflow for one analysis and print its final status.
    /// Also takes over an analysis left `scanning` by an interrupted run
    Process {
        /// Analysis id
        id: Uuid,
    },
    /// Print the aggregated report for one analysis as JSON
    Report {
        /// Analysis id
        id: Uuid,
    },
    /// Analyze a product fully offline against an in-memory store
    Analyze {
        /// Product name
        #[arg(long)]
        name: String,
        /// Target marketplace (amazon, flipkart, meesho)
        #[arg(long, default_value = "amazon")]
        marketplace: Marketplace,
        /// Optional product description
        #[arg(long)]
        description: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Migrate) => {
            let config = listingseo_core::load_app_config()?;
            let pool = connect(&config).await?;
            let applied = listingseo_db::run_migrations(&pool).await?;
            println!("migrations applied ({applied} total)");
        }
        Some(Commands::Process { id }) => {
            let config = listingseo_core::load_app_config()?;
            let store = pg_store(&config).await?;
            let engine = EngineServices::from_config(&config)?;
            let status = analysis::run_process(store, &engine, id).await?;
            println!("{id}: {status}");
        }
        Some(Commands::Report { id }) => {
            let config = listingseo_core::load_app_config()?;
            let store = pg_store(&config).await?;
            let engine = EngineServices::from_config(&config)?;
            let report = analysis::run_report(store.as_ref(), &engine, id).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some(Commands::Analyze {
            name,
            marketplace,
            description,
        }) => {
            let report =
                analysis::run_analyze_offline(&name, marketplace, description.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        None => println!("listingseo-cli: run with --help for available commands"),
    }

    Ok(())
}

async fn connect(config: &listingseo_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = listingseo_db::PoolConfig::from_app_config(config);
    Ok(listingseo_db::connect_pool(&config.database_url, pool_config).await?)
}

async fn pg_store(config: &listingseo_core::AppConfig) -> anyhow::Result<Arc<dyn AnalysisStore>> {
    let pool = connect(config).await?;
    Ok(Arc::new(listingseo_db::PgStore::new(pool)))
}

#[cfg(test)]
mod tests;
