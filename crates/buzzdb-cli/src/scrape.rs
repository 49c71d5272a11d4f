//! Scrape command handlers.
//!
//! Per-company failures are logged and skipped rather than propagated, so a
//! single bad company does not abort the full sweep. Missing credentials
//! are fatal before any pipeline state is touched.

use std::time::Duration;

use sqlx::PgPool;

use buzzdb_core::{AppConfig, CompaniesFile, CompanyConfig};
use buzzdb_pipeline::{sweep_ingest, IngestConfig, IngestPipeline, RunOutcome};
use buzzdb_scraper::{
    AdapterStateFile, FileTokenStore, LinkedinClient, LinkedinConfig, TwitterClient, TwitterConfig,
};

use crate::pg::PgStores;

/// Which configured companies a scrape run targets.
pub enum CompanySelection {
    Primary,
    All,
    Named(Vec<String>),
}

/// Resolves a selection against the registry, erroring on unknown names.
pub fn select_companies<'a>(
    companies: &'a CompaniesFile,
    selection: &CompanySelection,
) -> anyhow::Result<Vec<&'a CompanyConfig>> {
    match selection {
        CompanySelection::Primary => Ok(vec![companies.primary()]),
        CompanySelection::All => Ok(companies.companies.iter().collect()),
        CompanySelection::Named(names) => names
            .iter()
            .map(|name| {
                companies
                    .find(name)
                    .ok_or_else(|| anyhow::anyhow!("unknown company '{name}'; run `buzzdb companies` to list the registry"))
            })
            .collect(),
    }
}

fn twitter_client_config(config: &AppConfig) -> anyhow::Result<TwitterConfig> {
    let auth_token = config.twitter_auth_token.clone().ok_or_else(|| {
        anyhow::anyhow!("BUZZDB_TWITTER_AUTH_TOKEN is not set; Twitter scraping needs it")
    })?;
    let csrf_token = config.twitter_csrf_token.clone().ok_or_else(|| {
        anyhow::anyhow!("BUZZDB_TWITTER_CSRF_TOKEN is not set; Twitter scraping needs it")
    })?;

    Ok(TwitterConfig {
        auth_token,
        csrf_token,
        bearer_token: config.twitter_bearer_token.clone(),
        transaction_seed: config.twitter_transaction_id.clone(),
        user_agent: config.scraper_user_agent.clone(),
        request_timeout_secs: config.scraper_request_timeout_secs,
        inter_request_delay_ms: config.scraper_inter_request_delay_ms,
        max_retries: config.scraper_max_retries,
        retry_backoff_base_ms: config.scraper_retry_backoff_base_ms,
    })
}

/// Windowed, checkpointed Twitter ingestion for the selected companies.
///
/// Each company's primary keyword is its own `(source, query)` checkpoint
/// stream, so companies resume independently.
///
/// # Errors
///
/// Returns an error for missing credentials or an unknown company name.
/// Per-company pipeline failures are logged and skipped.
pub async fn run_scrape_twitter(
    pool: &PgPool,
    config: &AppConfig,
    companies: &CompaniesFile,
    selection: &CompanySelection,
    query_override: Option<&str>,
    max_runs: Option<u32>,
    full_refresh: bool,
) -> anyhow::Result<()> {
    let client_config = twitter_client_config(config)?;
    let targets = select_companies(companies, selection)?;
    let stores = PgStores::new(pool);

    for company in targets {
        let query = query_override.unwrap_or_else(|| company.primary_keyword());
        tracing::info!(company = %company.name, query, "scraping twitter");

        let token_store = FileTokenStore::new(&config.twitter_tx_state_path);
        let client = match TwitterClient::new(client_config.clone(), token_store) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(company = %company.name, error = %e, "could not build twitter client");
                continue;
            }
        };

        let ingest_config = IngestConfig {
            search_query: query.to_owned(),
            company: company.name.clone(),
            window_minutes: config.scraper_window_minutes,
            max_runs: max_runs.unwrap_or(config.scraper_max_runs),
            interval: Duration::from_secs(config.scraper_interval_secs),
            item_delay: Duration::from_millis(config.scraper_item_delay_ms),
            page_limit: config.scraper_page_limit,
            epoch_start: config.scraper_start_date,
            full_refresh,
            fetch_conversations: true,
        };

        let mut pipeline = IngestPipeline::new(client, &stores, &stores, &stores, ingest_config);
        let reports = pipeline.run().await;

        for report in reports {
            match report.result {
                Ok(RunOutcome::UpToDate) => {
                    println!("[{}] run {}: up to date", company.name, report.run);
                }
                Ok(RunOutcome::Completed(stats)) => {
                    println!(
                        "[{}] run {}: found {}, saved {}, skipped {}, conversations {} (+{} skipped), errors {}",
                        company.name,
                        report.run,
                        stats.found,
                        stats.saved,
                        stats.skipped,
                        stats.conversations_saved,
                        stats.conversations_skipped,
                        stats.errors,
                    );
                }
                Err(e) => {
                    println!(
                        "[{}] run {}: failed ({e}); window will be retried next invocation",
                        company.name, report.run
                    );
                }
            }
        }
    }

    Ok(())
}

/// Keyword-sweep LinkedIn ingestion for the selected companies.
///
/// # Errors
///
/// Returns an error for missing credentials or an unknown company name.
/// Per-company sweep failures are logged and skipped.
pub async fn run_scrape_linkedin(
    pool: &PgPool,
    config: &AppConfig,
    companies: &CompaniesFile,
    selection: &CompanySelection,
    count: usize,
) -> anyhow::Result<()> {
    let li_at = config.linkedin_li_at.clone().ok_or_else(|| {
        anyhow::anyhow!("BUZZDB_LINKEDIN_LI_AT is not set; LinkedIn scraping needs it")
    })?;
    let jsessionid = config.linkedin_jsessionid.clone().ok_or_else(|| {
        anyhow::anyhow!("BUZZDB_LINKEDIN_JSESSIONID is not set; LinkedIn scraping needs it")
    })?;

    let client_config = LinkedinConfig {
        li_at,
        jsessionid,
        user_agent: config.scraper_user_agent.clone(),
        request_timeout_secs: config.scraper_request_timeout_secs,
        inter_request_delay_ms: config.scraper_inter_request_delay_ms,
        max_retries: config.scraper_max_retries,
        retry_backoff_base_ms: config.scraper_retry_backoff_base_ms,
    };

    let targets = select_companies(companies, selection)?;
    let stores = PgStores::new(pool);
    let state_file = AdapterStateFile::new(&config.linkedin_state_path);

    let mut client = LinkedinClient::new(client_config)?;

    for company in targets {
        let keyword = company.primary_keyword();
        tracing::info!(company = %company.name, keyword, "scraping linkedin");

        let batch = match client.sweep(keyword, count, &state_file).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::error!(company = %company.name, error = %e, "linkedin sweep failed");
                println!("[{}] sweep failed: {e}", company.name);
                continue;
            }
        };

        match sweep_ingest(&stores, &batch, keyword, &company.name).await {
            Ok(stats) => println!(
                "[{}] found {}, saved {}, skipped {}",
                company.name, stats.found, stats.saved, stats.skipped
            ),
            Err(e) => {
                tracing::error!(company = %company.name, error = %e, "persisting sweep failed");
                println!("[{}] persist failed: {e}", company.name);
            }
        }
    }

    Ok(())
}
