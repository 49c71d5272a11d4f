//! Classify command handler.

use std::time::Duration;

use sqlx::PgPool;

use buzzdb_classifier::{build_system_prompt, ClassifierClient, ClassifierConfig};
use buzzdb_core::{AppConfig, CompaniesFile, Platform};
use buzzdb_pipeline::{ClassifyConfig, ClassifyPipeline, UnclassifiedFilter};

use crate::pg::PgStores;

fn classifier_config(config: &AppConfig) -> anyhow::Result<ClassifierConfig> {
    let endpoint = config.classifier_endpoint.clone().ok_or_else(|| {
        anyhow::anyhow!("BUZZDB_CLASSIFIER_ENDPOINT is not set; classification needs it")
    })?;
    let deployment = config.classifier_deployment.clone().ok_or_else(|| {
        anyhow::anyhow!("BUZZDB_CLASSIFIER_DEPLOYMENT is not set; classification needs it")
    })?;
    let api_key = config.classifier_api_key.clone().ok_or_else(|| {
        anyhow::anyhow!("BUZZDB_CLASSIFIER_API_KEY is not set; classification needs it")
    })?;

    Ok(ClassifierConfig {
        endpoint,
        deployment,
        api_version: config.classifier_api_version.clone(),
        api_key,
        request_timeout_secs: config.classifier_request_timeout_secs,
        max_retries: config.scraper_max_retries,
        retry_backoff_base_ms: config.scraper_retry_backoff_base_ms,
    })
}

/// Classifies a batch of unclassified posts and prints the run summary.
///
/// # Errors
///
/// Returns an error for missing classifier configuration or a storage
/// failure. Per-post classifier failures are counted, not propagated —
/// those posts stay unclassified and are retried next run.
pub async fn run_classify(
    pool: &PgPool,
    config: &AppConfig,
    companies: &CompaniesFile,
    platform: Option<Platform>,
    company: Option<String>,
    limit: i64,
) -> anyhow::Result<()> {
    let classifier_config = classifier_config(config)?;
    let primary = companies.primary();
    let prompt = build_system_prompt(&primary.display_name, &companies.products);
    let classifier = ClassifierClient::new(&classifier_config, prompt)?;

    let stores = PgStores::new(pool);
    let pipeline = ClassifyPipeline::new(
        &classifier,
        &stores,
        ClassifyConfig {
            filter: UnclassifiedFilter {
                platform,
                company,
                limit,
            },
            delay: Duration::from_millis(config.classify_delay_ms),
        },
    );

    let stats = pipeline.run().await?;

    println!(
        "classified {}/{} posts ({} failed, {} spam)",
        stats.classified, stats.fetched, stats.failed, stats.spam
    );

    if !stats.categories.is_empty() {
        println!("categories:");
        for (category, count) in &stats.categories {
            println!("  {category:<20} {count}");
        }
    }
    if !stats.products.is_empty() {
        println!("products:");
        for (product, count) in &stats.products {
            println!("  {product:<20} {count}");
        }
    }

    if let (Some(sentiment), Some(urgency), Some(impact)) = (
        stats.avg_sentiment(),
        stats.avg_urgency(),
        stats.avg_impact(),
    ) {
        println!("avg scores: sentiment {sentiment:.1}, urgency {urgency:.1}, impact {impact:.1}");
    }

    println!(
        "token usage: {} prompt + {} completion = {} total",
        stats.prompt_tokens, stats.completion_tokens, stats.total_tokens
    );

    Ok(())
}
