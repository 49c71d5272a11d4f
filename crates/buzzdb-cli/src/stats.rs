//! Read-only stats reporting. Nothing here mutates state.

use sqlx::PgPool;

/// Prints ingestion, classification, and workflow aggregates.
///
/// # Errors
///
/// Returns an error if any query fails.
pub async fn run_stats(
    pool: &PgPool,
    platform: Option<&str>,
    company: Option<&str>,
) -> anyhow::Result<()> {
    let raw_counts = buzzdb_db::get_raw_post_counts(pool).await?;
    println!("raw posts:");
    println!("  {:<15} {:<10} {:>8} {:>14}", "company", "platform", "total", "unclassified");
    for row in raw_counts
        .iter()
        .filter(|r| company.is_none_or(|c| r.company == c))
        .filter(|r| platform.is_none_or(|p| r.platform == p))
    {
        println!(
            "  {:<15} {:<10} {:>8} {:>14}",
            row.company, row.platform, row.total, row.unclassified
        );
    }

    let classification = buzzdb_db::get_classification_stats(pool, platform, company).await?;
    println!(
        "\nclassified posts: {} total, {} spam",
        classification.total, classification.spam_count
    );
    if !classification.categories.is_empty() {
        println!("  categories:");
        for entry in &classification.categories {
            println!("    {:<20} {}", entry.label, entry.total);
        }
    }
    if !classification.products.is_empty() {
        println!("  products:");
        for entry in &classification.products {
            println!("    {:<20} {}", entry.label, entry.total);
        }
    }
    if let (Some(sentiment), Some(urgency), Some(impact)) = (
        classification.avg_sentiment,
        classification.avg_urgency,
        classification.avg_impact,
    ) {
        println!("  avg scores: sentiment {sentiment:.1}, urgency {urgency:.1}, impact {impact:.1}");
    }
    println!("  tokens spent: {}", classification.total_tokens);

    let dashboard = buzzdb_db::get_team_dashboard_stats(pool, company).await?;
    println!("\nworkflow (non-spam): {} posts", dashboard.total);
    for entry in &dashboard.statuses {
        println!("  {:<15} {}", entry.label, entry.total);
    }
    println!(
        "  high-urgency still new: {}\n  raised on slack: {}\n  tickets created: {}",
        dashboard.high_urgency_new, dashboard.raised_on_slack, dashboard.tickets_created
    );

    Ok(())
}
