mod config;
mod db;
mod diff;
mod fetch;
mod notify;
mod parser;
mod profile;
mod reconcile;
mod report;
mod store;
mod validate;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::Settings;
use crate::db::SqliteStore;
use crate::notify::Notifier;
use crate::parser::ExtractOptions;
use crate::reconcile::Reconciler;
use crate::report::ChangeReport;
use crate::store::ProfileStore;

#[derive(Parser)]
#[command(name = "profile_sync", about = "Keep a local copy of the Sky News staff profiles in sync")]
struct Cli {
    /// SQLite database path (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,
    /// Scrape the profiles page and reconcile the database with it
    Sync {
        /// Read the page from a local file instead of fetching it
        #[arg(long)]
        html: Option<PathBuf>,
        /// Compute the changes without writing them
        #[arg(long)]
        dry_run: bool,
        /// Print the change report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print scraped profiles as JSON without touching the database
    Extract {
        /// Read the page from a local file instead of fetching it
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Stored profiles table
    List {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Add an email address to the change notifications
    Subscribe { email: String },
    /// Remove an email address from the change notifications
    Unsubscribe { email: String },
    /// Show subscribed email addresses
    Subscribers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load().context("Failed to load settings")?;
    if let Some(db) = cli.db {
        settings.db_path = db;
    }

    let result = match cli.command {
        Commands::Init => {
            let store = open_store(&settings)?;
            store.close()?;
            println!("Schema ready at {:?}", settings.db_path);
            Ok(())
        }
        Commands::Sync {
            html,
            dry_run,
            json,
        } => sync(&settings, html.as_deref(), dry_run, json).await,
        Commands::Extract { html } => {
            let client = fetch::client(&settings.user_agent)?;
            let page = load_html(&client, &settings, html.as_deref()).await?;
            let profiles = parser::extract_profiles(&page, extract_options(&settings));
            println!("{}", serde_json::to_string_pretty(&profiles)?);
            Ok(())
        }
        Commands::List { limit } => {
            let store = open_store(&settings)?;
            let rows = store.find_all()?;
            if rows.is_empty() {
                println!("No profiles stored. Run 'sync' first.");
                return Ok(());
            }

            println!("{:>8} | {:<28} | {:<36} | {:<5}", "ID", "Name", "Job title", "Image");
            println!("{}", "-".repeat(86));
            for p in rows.iter().take(limit) {
                println!(
                    "{:>8} | {:<28} | {:<36} | {:<5}",
                    p.profile_id,
                    truncate(p.display_name(), 28),
                    truncate(p.job_title.as_deref().unwrap_or("-"), 36),
                    if p.profile_image_url.is_some() { "yes" } else { "no" }
                );
            }
            println!("\n{} of {} profiles", rows.len().min(limit), rows.len());
            store.close()?;
            Ok(())
        }
        Commands::Subscribe { email } => {
            if !notify::is_valid_email(&email) {
                bail!("{:?} is not a valid email address", email);
            }
            let store = open_store(&settings)?;
            if store.add_subscriber(&email)? {
                println!("Subscribed {}", email);
            } else {
                println!("{} is already subscribed", email);
            }
            store.close()?;
            Ok(())
        }
        Commands::Unsubscribe { email } => {
            let store = open_store(&settings)?;
            if store.remove_subscriber(&email)? {
                println!("Unsubscribed {}", email);
            } else {
                println!("{} was not subscribed", email);
            }
            store.close()?;
            Ok(())
        }
        Commands::Subscribers => {
            let store = open_store(&settings)?;
            let emails = store.list_subscribers()?;
            for e in &emails {
                println!("{}", e);
            }
            println!("{} subscribers", emails.len());
            store.close()?;
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// One reconciliation pass: fetch → extract → validate → diff → apply → notify.
async fn sync(settings: &Settings, html: Option<&Path>, dry_run: bool, json: bool) -> anyhow::Result<()> {
    let client = fetch::client(&settings.user_agent)?;
    let notifier = Notifier::from_settings(settings, &client)?;

    // Nothing touches storage until the page is in hand.
    let page = load_html(&client, settings, html).await?;
    let candidates = parser::extract_profiles(&page, extract_options(settings));
    info!("Extracted {} candidate profiles", candidates.len());

    let store = if dry_run {
        SqliteStore::open_snapshot(&settings.db_path)
            .with_context(|| format!("Failed to read {:?}", settings.db_path))?
    } else {
        open_store(settings)?
    };
    let mut reconciler = Reconciler::new(store);
    let outcome = if dry_run {
        reconciler.plan(&candidates)
    } else {
        reconciler.reconcile_candidates(&candidates)
    }
    .context("Reconciliation failed, no changes were applied")?;

    let report = ChangeReport::new(&settings.source_url, &outcome, dry_run);
    info!("Sync complete: {}", report.summary());
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.render());
    }

    if !dry_run && !outcome.changes.is_empty() {
        let recipients = recipients(reconciler.store());
        if let Err(e) = notifier.notify(&report, &recipients).await {
            warn!("Change notification failed: {}", e);
        }
    }

    reconciler.into_store().close()?;
    Ok(())
}

async fn load_html(
    client: &reqwest::Client,
    settings: &Settings,
    file: Option<&Path>,
) -> anyhow::Result<String> {
    match file {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
        }
        None => Ok(fetch::fetch_html(client, &settings.source_url).await?),
    }
}

fn open_store(settings: &Settings) -> anyhow::Result<SqliteStore> {
    let store = SqliteStore::open(&settings.db_path)
        .with_context(|| format!("Failed to open {:?}", settings.db_path))?;
    store.init_schema()?;
    Ok(store)
}

fn extract_options(settings: &Settings) -> ExtractOptions {
    ExtractOptions {
        title_case_job_titles: settings.title_case_job_titles,
    }
}

/// Runs after the commit; a failed lookup only warns.
fn recipients(store: &SqliteStore) -> Vec<String> {
    store.list_subscribers().unwrap_or_else(|e| {
        warn!("Could not load subscribers: {}", e);
        Vec::new()
    })
}

/// Fit `s` into a column of `width` characters, marking a cut with `…`.
fn truncate(s: &str, width: usize) -> String {
    match s.char_indices().nth(width) {
        None => s.to_string(),
        Some(_) => {
            let keep = width.saturating_sub(1);
            let end = s.char_indices().nth(keep).map_or(s.len(), |(i, _)| i);
            format!("{}…", &s[..end])
        }
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let total = d.as_secs();
    match (total / 3600, total / 60 % 60, total % 60) {
        (0, 0, _) => format!("{}.{}s", total, d.subsec_millis() / 100),
        (0, m, s) => format!("{}:{:02}", m, s),
        (h, m, s) => format!("{}:{:02}:{:02}", h, m, s),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn truncate_fits_width() {
        assert_eq!(truncate("Kay Burley", 28), "Kay Burley");
        assert_eq!(truncate("abcdef", 6), "abcdef");
        assert_eq!(truncate("abcdefg", 6), "abcde…");
        assert_eq!(truncate("Zoë Ångström", 4), "Zoë…");
        assert_eq!(truncate("abc", 0), "…");
    }

    #[test]
    fn duration_formats() {
        assert_eq!(format_duration(Duration::from_millis(2_340)), "2.3s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1:05");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "1:02:05");
    }

    #[test]
    fn missing_subscriber_table_yields_no_recipients() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(recipients(&store).is_empty());

        store.init_schema().unwrap();
        store.add_subscriber("desk@example.com").unwrap();
        assert_eq!(recipients(&store), ["desk@example.com"]);
    }
}
