//! Triage command handlers: the team workflow operations on classified
//! posts. Status can only move forward; re-applying a transition just
//! refreshes its fields.

use clap::Subcommand;
use sqlx::PgPool;

#[derive(Debug, Subcommand)]
pub enum TriageCommands {
    /// List non-spam posts needing attention, by urgency then impact
    List {
        #[arg(long, default_value_t = 5)]
        min_urgency: i16,

        /// Restrict to a workflow status (new, acknowledged, in_progress, resolved, closed)
        #[arg(long)]
        status: Option<String>,

        /// Restrict to a company slug
        #[arg(long)]
        company: Option<String>,

        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Record that a post was raised on a Slack channel
    RaiseSlack {
        post_id: i64,

        #[arg(long)]
        channel: String,

        #[arg(long)]
        message_ts: Option<String>,

        #[arg(long)]
        raised_by: Option<String>,
    },
    /// Record a tracker ticket for a post
    Ticket {
        post_id: i64,

        #[arg(long)]
        ticket_id: String,

        #[arg(long)]
        ticket_url: Option<String>,

        #[arg(long, default_value = "jira")]
        ticket_system: String,
    },
    /// Assign a post to a team (and optionally a person)
    Assign {
        post_id: i64,

        #[arg(long)]
        team: String,

        #[arg(long)]
        assignee: Option<String>,
    },
    /// Mark a post resolved
    Resolve {
        post_id: i64,

        #[arg(long)]
        resolution: String,
    },
    /// Append a timestamped internal note
    Note {
        post_id: i64,

        note: String,
    },
}

/// Dispatches one triage command.
///
/// # Errors
///
/// Returns an error if the post does not exist or the update fails.
pub async fn run_triage(pool: &PgPool, command: TriageCommands) -> anyhow::Result<()> {
    match command {
        TriageCommands::List {
            min_urgency,
            status,
            company,
            limit,
        } => {
            let posts = buzzdb_db::list_actionable_posts(
                pool,
                min_urgency,
                status.as_deref(),
                company.as_deref(),
                limit,
            )
            .await?;

            if posts.is_empty() {
                println!("nothing actionable at urgency >= {min_urgency}");
                return Ok(());
            }

            println!(
                "{:>6} {:<10} {:<12} {:<20} {:<9} {:>3}/{:<3} {:<13} summary",
                "id", "company", "status", "category", "priority", "urg", "imp", "platform"
            );
            for post in posts {
                println!(
                    "{:>6} {:<10} {:<12} {:<20} {:<9} {:>3}/{:<3} {:<13} {}",
                    post.id,
                    post.company,
                    post.status,
                    post.category.as_deref().unwrap_or("-"),
                    post.priority,
                    post.urgency_score.unwrap_or(0),
                    post.impact_score.unwrap_or(0),
                    post.platform,
                    post.summary.as_deref().unwrap_or("-"),
                );
            }
        }
        TriageCommands::RaiseSlack {
            post_id,
            channel,
            message_ts,
            raised_by,
        } => {
            buzzdb_db::mark_raised_on_slack(
                pool,
                post_id,
                &channel,
                message_ts.as_deref(),
                raised_by.as_deref(),
            )
            .await?;
            report(pool, post_id, &format!("raised on #{channel}")).await?;
        }
        TriageCommands::Ticket {
            post_id,
            ticket_id,
            ticket_url,
            ticket_system,
        } => {
            buzzdb_db::create_ticket(
                pool,
                post_id,
                &ticket_id,
                ticket_url.as_deref(),
                &ticket_system,
            )
            .await?;
            report(pool, post_id, &format!("ticket {ticket_id} recorded")).await?;
        }
        TriageCommands::Assign {
            post_id,
            team,
            assignee,
        } => {
            buzzdb_db::assign_post(pool, post_id, &team, assignee.as_deref()).await?;
            report(pool, post_id, &format!("assigned to {team}")).await?;
        }
        TriageCommands::Resolve { post_id, resolution } => {
            buzzdb_db::resolve_post(pool, post_id, &resolution).await?;
            report(pool, post_id, "resolved").await?;
        }
        TriageCommands::Note { post_id, note } => {
            buzzdb_db::add_internal_note(pool, post_id, &note).await?;
            report(pool, post_id, "note added").await?;
        }
    }

    Ok(())
}

async fn report(pool: &PgPool, post_id: i64, action: &str) -> anyhow::Result<()> {
    let post = buzzdb_db::get_classified_post(pool, post_id).await?;
    println!("post {post_id}: {action} (status: {})", post.status);
    Ok(())
}
