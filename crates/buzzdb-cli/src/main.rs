mod classify;
mod pg;
mod scrape;
mod stats;
mod triage;

use clap::{Parser, Subcommand};

use buzzdb_core::Platform;

use scrape::CompanySelection;
use triage::TriageCommands;

#[derive(Debug, Parser)]
#[command(name = "buzzdb")]
#[command(about = "Social listening: scrape, classify, and triage company mentions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape posts from a platform into the raw post store
    Scrape {
        #[command(subcommand)]
        platform: ScrapeCommands,
    },
    /// Classify unclassified raw posts via the hosted classifier
    Classify {
        /// Restrict to one platform (twitter, linkedin)
        #[arg(long)]
        platform: Option<String>,

        /// Restrict to one company slug
        #[arg(long)]
        company: Option<String>,

        #[arg(long, default_value_t = 100)]
        limit: i64,
    },
    /// Show ingestion/classification/workflow aggregates (read-only)
    Stats {
        #[arg(long)]
        platform: Option<String>,

        #[arg(long)]
        company: Option<String>,
    },
    /// Workflow operations on classified posts
    Triage {
        #[command(subcommand)]
        command: TriageCommands,
    },
    /// List the configured company registry
    Companies,
}

#[derive(Debug, Subcommand)]
enum ScrapeCommands {
    /// Windowed, checkpointed search ingestion with conversation enrichment
    Twitter {
        /// Override the search query (defaults to each company's primary keyword)
        #[arg(long)]
        query: Option<String>,

        /// Companies to scrape (slugs); defaults to the primary company
        #[arg(long)]
        companies: Option<Vec<String>>,

        /// Scrape every configured company
        #[arg(long)]
        all: bool,

        /// Override the bounded number of window iterations
        #[arg(long)]
        max_runs: Option<u32>,

        /// Re-walk from the epoch, bypassing checkpoint and dedup prechecks
        #[arg(long)]
        full_refresh: bool,
    },
    /// Keyword-sweep ingestion (LinkedIn has no absolute timestamps to window on)
    Linkedin {
        /// Companies to scrape (slugs); defaults to the primary company
        #[arg(long)]
        companies: Option<Vec<String>>,

        /// Scrape every configured company
        #[arg(long)]
        all: bool,

        /// Posts to fetch per company
        #[arg(long, default_value_t = 50)]
        count: usize,
    },
}

fn selection(companies: Option<Vec<String>>, all: bool) -> CompanySelection {
    if all {
        CompanySelection::All
    } else if let Some(names) = companies {
        CompanySelection::Named(names)
    } else {
        CompanySelection::Primary
    }
}

fn parse_platform(raw: Option<&str>) -> anyhow::Result<Option<Platform>> {
    raw.map(|p| {
        p.parse::<Platform>()
            .map_err(|e| anyhow::anyhow!("--platform: {e}"))
    })
    .transpose()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = buzzdb_core::load_app_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    let companies = buzzdb_core::load_companies(&config.companies_path)?;

    if let Commands::Companies = cli.command {
        println!("{:<12} {:<20} {:<10} keywords", "name", "display", "role");
        for company in &companies.companies {
            let role = if company.is_primary { "primary" } else { "competitor" };
            println!(
                "{:<12} {:<20} {:<10} {}",
                company.name,
                company.display_name,
                role,
                company.keywords.join(", ")
            );
        }
        return Ok(());
    }

    let pool = buzzdb_db::connect_pool_from_config(&config).await?;
    let applied = buzzdb_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied pending migrations");
    }

    match cli.command {
        Commands::Scrape { platform } => match platform {
            ScrapeCommands::Twitter {
                query,
                companies: names,
                all,
                max_runs,
                full_refresh,
            } => {
                scrape::run_scrape_twitter(
                    &pool,
                    &config,
                    &companies,
                    &selection(names, all),
                    query.as_deref(),
                    max_runs,
                    full_refresh,
                )
                .await?;
            }
            ScrapeCommands::Linkedin {
                companies: names,
                all,
                count,
            } => {
                scrape::run_scrape_linkedin(
                    &pool,
                    &config,
                    &companies,
                    &selection(names, all),
                    count,
                )
                .await?;
            }
        },
        Commands::Classify {
            platform,
            company,
            limit,
        } => {
            let platform = parse_platform(platform.as_deref())?;
            classify::run_classify(&pool, &config, &companies, platform, company, limit).await?;
        }
        Commands::Stats { platform, company } => {
            stats::run_stats(&pool, platform.as_deref(), company.as_deref()).await?;
        }
        Commands::Triage { command } => {
            triage::run_triage(&pool, command).await?;
        }
        Commands::Companies => unreachable!("handled before pool setup"),
    }

    Ok(())
}
