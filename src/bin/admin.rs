//! CLI administration tool for trimlink.
//!
//! Provides commands for inspecting and retiring links, running the expiry
//! sweep, and performing database checks without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # List a user's links
//! cargo run --bin admin -- links list --owner alice
//!
//! # Show one link
//! cargo run --bin admin -- links show Ab3dE9
//!
//! # Retire a link (the code stays reserved)
//! cargo run --bin admin -- links retire Ab3dE9
//!
//! # Permanently delete a link (the code may be reissued)
//! cargo run --bin admin -- links purge Ab3dE9
//!
//! # Flag every link past its expiry date
//! cargo run --bin admin -- sweep
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_HOST`/`DB_PORT`/`DB_USER`/`DB_PASSWORD`/`DB_NAME`

use trimlink::config::{Config, mask_connection_string};
use trimlink::domain::entities::Link;
use trimlink::domain::expiry_sweeper::sweep_once;
use trimlink::domain::lifecycle::{DENIAL_PRECEDENCE, LinkState, state_of};
use trimlink::domain::repositories::{LinkRepository, RepositoryError};
use trimlink::infrastructure::persistence::PgLinkRepository;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing trimlink.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect and manage links
    Links {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Retire every link whose expiry date has passed
    Sweep,

    /// Show link totals
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Link management subcommands.
#[derive(Subcommand)]
enum LinkAction {
    /// List links created by an owner, newest first
    List {
        /// Owner id (token subject)
        #[arg(short, long)]
        owner: String,
    },

    /// Show a single link
    Show { code: String },

    /// Mark a link expired; its code is never reissued
    Retire { code: String },

    /// Delete a link permanently; its code may be reissued
    Purge {
        code: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = Config::load_database_url().context("Database is not configured")?;

    let pool = PgPool::connect(&database_url)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to database at {}",
                mask_connection_string(&database_url)
            )
        })?;

    let repo: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(Arc::new(pool.clone())));

    match cli.command {
        Commands::Links { action } => handle_link_action(action, &repo).await?,
        Commands::Sweep => handle_sweep(&repo).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches link management commands.
async fn handle_link_action(action: LinkAction, repo: &Arc<dyn LinkRepository>) -> Result<()> {
    match action {
        LinkAction::List { owner } => list_links(repo, &owner).await,
        LinkAction::Show { code } => show_link(repo, &code).await,
        LinkAction::Retire { code } => retire_link(repo, &code).await,
        LinkAction::Purge { code, yes } => purge_link(repo, &code, yes).await,
    }
}

fn colored_state(link: &Link) -> ColoredString {
    match state_of(link, Utc::now(), DENIAL_PRECEDENCE) {
        LinkState::Active => "ACTIVE".green(),
        LinkState::Expired => "EXPIRED".red(),
        LinkState::Exhausted => "EXHAUSTED".yellow(),
    }
}

fn not_found(code: &str) -> impl FnOnce(RepositoryError) -> anyhow::Error + '_ {
    move |e| match e {
        RepositoryError::NotFound => anyhow::anyhow!("Link '{code}' not found"),
        other => anyhow::anyhow!("Database error: {other}"),
    }
}

/// Lists an owner's links.
///
/// # Output Format
///
/// ```text
/// Links for alice
///
///   Code       Visits      Expires            Status     Destination
///   ─────────────────────────────────────────────────────────────────
///   Ab3dE9     3/10        2030-01-01 00:00   ACTIVE     https://example.com
/// ```
async fn list_links(repo: &Arc<dyn LinkRepository>, owner: &str) -> Result<()> {
    println!("{}", format!("Links for {owner}").bright_blue().bold());
    println!();

    let links = repo
        .list_by_owner(owner)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list links: {e}"))?;

    if links.is_empty() {
        println!("{}", "  No links found".yellow());
        return Ok(());
    }

    println!(
        "  {:<10} {:<11} {:<18} {:<10} {}",
        "Code".bright_white().bold(),
        "Visits".bright_white().bold(),
        "Expires".bright_white().bold(),
        "Status".bright_white().bold(),
        "Destination".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for link in &links {
        let visits = match link.max_uses {
            Some(max) => format!("{}/{}", link.visit_count, max),
            None => link.visit_count.to_string(),
        };

        println!(
            "  {:<10} {:<11} {:<18} {:<10} {}",
            link.short_code.cyan(),
            visits,
            link.expiry_date
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            colored_state(link),
            link.original_url
        );
    }

    println!();
    println!("  Total: {}", links.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

async fn show_link(repo: &Arc<dyn LinkRepository>, code: &str) -> Result<()> {
    let link = repo.fetch_by_short_code(code).await.map_err(not_found(code))?;

    println!("{}", "Link details".bright_blue().bold());
    println!();
    println!("  ID:          {}", link.id.to_string().bright_black());
    println!("  Code:        {}", link.short_code.cyan());
    println!("  Destination: {}", link.original_url);
    println!("  Owner:       {}", link.owner);
    println!("  Created:     {}", link.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Expires:     {}", link.expiry_date.format("%Y-%m-%d %H:%M:%S"));
    println!(
        "  Visits:      {}{}",
        link.visit_count.to_string().bright_white().bold(),
        link.max_uses.map(|m| format!(" of {m}")).unwrap_or_default()
    );
    println!("  Status:      {}", colored_state(&link));
    println!();

    Ok(())
}

async fn retire_link(repo: &Arc<dyn LinkRepository>, code: &str) -> Result<()> {
    let link = repo.fetch_by_short_code(code).await.map_err(not_found(code))?;

    if link.is_expired {
        println!("{}", "This link is already retired".yellow());
        return Ok(());
    }

    repo.retire(code).await.map_err(not_found(code))?;

    println!("{}", format!("Link '{code}' retired").green().bold());
    Ok(())
}

/// Hard-deletes a link after confirmation (default: No).
async fn purge_link(repo: &Arc<dyn LinkRepository>, code: &str, skip_confirm: bool) -> Result<()> {
    let link = repo.fetch_by_short_code(code).await.map_err(not_found(code))?;

    println!("{}", "Purge link".bright_blue().bold());
    println!();
    println!("  Code:        {}", link.short_code.cyan());
    println!("  Destination: {}", link.original_url);
    println!("  Visits:      {}", link.visit_count);
    println!();
    println!(
        "{}",
        "The row and its visit count are removed and the code may be reissued."
            .red()
            .bold()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete this link permanently?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled".red());
            return Ok(());
        }
    }

    repo.delete(code).await.map_err(not_found(code))?;

    println!("{}", "Link purged".green().bold());
    Ok(())
}

async fn handle_sweep(repo: &Arc<dyn LinkRepository>) -> Result<()> {
    println!("{}", "Sweeping expired links...".bright_blue());

    let retired = sweep_once(repo)
        .await
        .map_err(|e| anyhow::anyhow!("Sweep failed: {e}"))?;

    println!(
        "{} {}",
        "Retired:".green().bold(),
        retired.to_string().bright_white().bold()
    );
    Ok(())
}

/// Displays link totals.
///
/// Shows:
/// - Total number of links
/// - Links still flagged live
/// - Sum of recorded visits
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "Statistics".bright_blue().bold());
    println!();

    let (total, live, visits): (i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*),
                COUNT(*) FILTER (WHERE NOT is_expired),
                COALESCE(SUM(visit_count), 0)::BIGINT
         FROM links",
    )
    .fetch_one(pool)
    .await?;

    println!("  Links:   {}", total.to_string().bright_green().bold());
    println!("  Live:    {}", live.to_string().bright_green().bold());
    println!("  Retired: {}", (total - live).to_string().bright_green().bold());
    println!("  Visits:  {}", visits.to_string().bright_green().bold());
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await
                .unwrap_or(0);

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", applied.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
